//! Client for the Proxmox VE cluster SDN API
//!
//! Wraps `cluster/sdn/zones` behind typed calls on top of a pluggable
//! transport (`ApiClient`), with connection settings from `ClientConfig`.

pub mod api_client;
pub mod config;
pub mod zones;

pub use api_client::{ApiClient, ApiError, ApiRequest, ApiResponse, HttpApiClient, MockApiClient};
pub use config::{ClientConfig, ConfigError};
pub use zones::{SdnClient, ZoneClientError, ZonesClient};
