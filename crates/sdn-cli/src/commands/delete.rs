//! Delete command

use anyhow::Result;
use pve_sdn_core::{Diagnostics, ZoneResourceModel};
use std::sync::Arc;

use crate::context::CliContext;

/// Delete command implementation
pub struct DeleteCommand {
    context: Arc<CliContext>,
}

impl DeleteCommand {
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }

    /// Execute delete command
    pub async fn execute(&self, zone: &str) -> Result<()> {
        let mut diags = Diagnostics::new();
        self.context
            .zones
            .delete(&ZoneResourceModel::named(zone), &mut diags)
            .await;
        crate::report(&diags)?;

        println!("SDN zone '{}' deleted", zone);
        Ok(())
    }
}
