//! List command

use anyhow::{Context, Result};
use pve_shared_types::{ZoneRecord, ZoneType};
use std::sync::Arc;

use crate::context::CliContext;
use crate::output::{self, OutputFormat};

/// List command implementation
pub struct ListCommand {
    context: Arc<CliContext>,
}

impl ListCommand {
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }

    /// Execute list command
    pub async fn execute(&self, zone_type: Option<ZoneType>, format: OutputFormat) -> Result<()> {
        let zones = self.zones(zone_type).await?;
        println!("{}", self.render(&zones, format)?);
        Ok(())
    }

    /// Zones of the cluster, sorted by name.
    pub async fn zones(&self, zone_type: Option<ZoneType>) -> Result<Vec<ZoneRecord>> {
        self.context
            .zones
            .client()
            .list(zone_type)
            .await
            .with_context(|| "Failed to list SDN zones")
    }

    pub fn render(&self, zones: &[ZoneRecord], format: OutputFormat) -> Result<String> {
        if format != OutputFormat::Text {
            return output::render(&zones, format);
        }

        let rows: Vec<Vec<String>> = zones
            .iter()
            .map(|zone| {
                vec![
                    zone.name.clone(),
                    zone.zone_type.clone().unwrap_or_else(|| "-".to_string()),
                    zone.mtu.map_or_else(|| "-".to_string(), |mtu| mtu.to_string()),
                    zone.nodes.clone().unwrap_or_else(|| "-".to_string()),
                    zone.ipam.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();

        Ok(output::table(&["Zone", "Type", "MTU", "Nodes", "IPAM"], &rows))
    }
}
