//! Ping command

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use crate::context::CliContext;

/// Checks that the cluster API answers
pub struct PingCommand {
    context: Arc<CliContext>,
}

impl PingCommand {
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }

    /// Execute ping command
    pub async fn execute(&self) -> Result<()> {
        let healthy = self
            .context
            .api
            .health_check()
            .await
            .with_context(|| format!("Cannot reach {}", self.context.config.endpoint))?;

        if !healthy {
            bail!("Proxmox API at {} is not responding", self.context.config.endpoint);
        }

        println!("Proxmox API at {} is reachable", self.context.config.endpoint);
        Ok(())
    }
}
