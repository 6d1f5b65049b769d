//! Shared state of a CLI invocation

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pve_sdn_client::{ApiClient, ClientConfig, HttpApiClient, SdnClient};
use pve_sdn_core::ZoneResource;

pub struct CliContext {
    pub config: ClientConfig,
    pub api: Arc<dyn ApiClient>,
    pub zones: ZoneResource,
}

impl CliContext {
    /// Load the client configuration and connect to the cluster API.
    pub fn bootstrap(config_path: Option<&Path>) -> Result<Arc<Self>> {
        let config = match config_path {
            Some(path) => ClientConfig::load_from_file(path).with_context(|| {
                format!("Failed to load configuration file: {}", path.display())
            })?,
            None => ClientConfig::load_with_defaults()
                .with_context(|| "Failed to load client configuration")?,
        };

        if config.api_token.is_none() {
            log::warn!("No API token configured, requests will be unauthenticated");
        }

        let api = HttpApiClient::from_config(&config)
            .with_context(|| format!("Failed to set up API client for {}", config.endpoint))?;

        Ok(Self::with_api(config, Arc::new(api)))
    }

    pub fn with_api(config: ClientConfig, api: Arc<dyn ApiClient>) -> Arc<Self> {
        let zones = ZoneResource::new(SdnClient::new(api.clone()).zones());
        Arc::new(Self { config, api, zones })
    }
}
