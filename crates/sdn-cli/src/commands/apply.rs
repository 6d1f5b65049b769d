//! Apply command

use anyhow::{Context, Result};
use pve_sdn_core::{Diagnostics, Plan, ZoneResourceModel};
use std::path::Path;
use std::sync::Arc;

use crate::context::CliContext;
use crate::document::load_zone_document;

/// Apply command implementation
pub struct ApplyCommand {
    context: Arc<CliContext>,
}

impl ApplyCommand {
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }

    /// Execute apply command
    pub async fn execute(&self, file: &Path, dry_run: bool) -> Result<()> {
        let desired = load_zone_document(file)?;

        let plan = self.plan(&desired).await?;
        println!("{}", describe(&plan));

        if dry_run {
            println!("Dry-run completed - no changes made");
            return Ok(());
        }

        if plan.is_noop() {
            return Ok(());
        }

        let state = self.apply(&plan).await?;
        println!(
            "✓ SDN zone '{}' applied ({})",
            state.name,
            state.zone_type().map_or("unknown", |t| t.as_str())
        );
        Ok(())
    }

    /// Validate a zone configuration and plan it against the cluster.
    pub async fn plan(&self, desired: &ZoneResourceModel) -> Result<Plan> {
        let mut diags = Diagnostics::new();
        let plan = self.context.zones.plan(desired, &mut diags).await;
        crate::report(&diags)
            .with_context(|| format!("Cannot plan SDN zone '{}'", desired.name))?;

        plan.with_context(|| format!("Cannot plan SDN zone '{}'", desired.name))
    }

    /// Carry out a plan and return the zone as read back from the cluster.
    pub async fn apply(&self, plan: &Plan) -> Result<ZoneResourceModel> {
        let mut diags = Diagnostics::new();
        let state = self.context.zones.apply(plan, &mut diags).await;
        crate::report(&diags)
            .with_context(|| format!("Failed to apply SDN zone '{}'", plan.desired.name))?;

        state.with_context(|| format!("Failed to apply SDN zone '{}'", plan.desired.name))
    }
}

/// Human readable summary of a plan.
pub fn describe(plan: &Plan) -> String {
    let mut lines = vec![format!("SDN zone '{}': {}", plan.desired.name, plan.action)];
    lines.extend(plan.changes.iter().map(|change| format!("  {}", change)));
    lines.join("\n")
}
