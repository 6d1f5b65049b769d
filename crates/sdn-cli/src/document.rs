//! Zone documents read by `pvesdn apply`

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pve_sdn_core::ZoneResourceModel;

/// Read a zone document, choosing the format from the file extension.
pub fn load_zone_document(path: &Path) -> Result<ZoneResourceModel> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read zone document: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let model = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON zone document: {}", path.display()))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML zone document: {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML zone document: {}", path.display()))?,
        _ => bail!(
            "Unsupported zone document format: {} (expected .json, .yaml, .yml or .toml)",
            path.display()
        ),
    };

    Ok(model)
}
