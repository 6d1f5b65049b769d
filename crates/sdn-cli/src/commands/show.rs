//! Show command

use anyhow::{Context, Result};
use pve_sdn_core::{Diagnostics, ZoneResourceModel};
use pve_shared_types::ZoneRecord;
use serde_json::Value;
use std::sync::Arc;

use crate::context::CliContext;
use crate::output::{self, OutputFormat};

/// Show command implementation
pub struct ShowCommand {
    context: Arc<CliContext>,
}

impl ShowCommand {
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }

    /// Execute show command
    pub async fn execute(&self, zone: &str, format: OutputFormat) -> Result<()> {
        let record = self
            .context
            .zones
            .client()
            .get(zone)
            .await
            .with_context(|| format!("Failed to read SDN zone '{}'", zone))?;

        println!("{}", self.render(&record, format)?);
        Ok(())
    }

    /// Text output lists the wire attributes; JSON and YAML output is a
    /// zone document that `apply` accepts.
    pub fn render(&self, record: &ZoneRecord, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Text {
            let fields = match serde_json::to_value(record)? {
                Value::Object(fields) => fields,
                _ => Default::default(),
            };

            let lines: Vec<String> = fields
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => format!("{}: {}", key, s),
                    other => format!("{}: {}", key, other),
                })
                .collect();
            return Ok(lines.join("\n"));
        }

        let mut diags = Diagnostics::new();
        let model = ZoneResourceModel::from_wire_record(record, &mut diags)
            .with_context(|| format!("Cannot describe SDN zone '{}'", record.name))?;
        crate::report(&diags)?;

        output::render(&model, format)
    }
}
