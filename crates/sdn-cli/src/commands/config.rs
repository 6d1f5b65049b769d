//! Config command

use anyhow::Result;
use pve_sdn_client::ClientConfig;
use std::sync::Arc;

use crate::context::CliContext;

/// Prints the effective client configuration
pub struct ConfigCommand {
    context: Arc<CliContext>,
}

impl ConfigCommand {
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }

    /// Execute config command
    pub fn execute(&self, show_secret: bool) -> Result<()> {
        print!("{}", self.render(show_secret)?);
        Ok(())
    }

    /// Render as TOML, masking the token secret unless asked not to.
    pub fn render(&self, show_secret: bool) -> Result<String> {
        let mut config: ClientConfig = self.context.config.clone();

        if !show_secret {
            config.api_token = config.api_token.map(|token| match token.split_once('=') {
                Some((token_id, _)) => format!("{}=********", token_id),
                None => token,
            });
        }

        Ok(config.to_toml()?)
    }
}
