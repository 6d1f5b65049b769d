//! Proxmox VE SDN CLI
//!
//! Command-line access to the cluster's SDN zones: list and show zones,
//! apply zone documents and delete zones.

pub mod commands;
pub mod context;
pub mod document;
pub mod output;

#[cfg(test)]
mod tests;

use anyhow::{bail, Result};
use pve_sdn_core::Diagnostics;

/// Print warnings to stderr and turn errors into a command failure.
pub fn report(diags: &Diagnostics) -> Result<()> {
    for warning in diags.warnings() {
        eprintln!("Warning: {}: {}", warning.summary, warning.detail);
    }

    if diags.has_error() {
        let errors: Vec<String> = diags
            .errors()
            .map(|error| format!("{}: {}", error.summary, error.detail))
            .collect();
        bail!("{}", errors.join("\n"));
    }

    Ok(())
}
