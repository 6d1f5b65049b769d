//! CLI command tests

use crate::commands::*;
use crate::context::CliContext;
use crate::document::load_zone_document;
use crate::output::{self, OutputFormat};
use pve_sdn_client::{ApiResponse, ClientConfig, MockApiClient};
use pve_sdn_core::{Diagnostics, PlanAction, ZoneVariant};
use pve_shared_types::{ZoneRecord, ZoneType};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Write a zone document into a fresh temporary directory
fn create_test_document(file_name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join(file_name);
    fs::write(&path, content).expect("Failed to write test file");
    (temp_dir, path)
}

fn context(api: MockApiClient) -> Arc<CliContext> {
    CliContext::with_api(ClientConfig::default(), Arc::new(api))
}

fn listing() -> MockApiClient {
    let mut api = MockApiClient::new();
    api.add_response(
        "GET cluster/sdn/zones",
        ApiResponse::ok(json!({"data": [
            {"zone": "zvlan", "type": "vlan", "bridge": "vmbr0", "ipam": "pve"},
            {"zone": "evpn1", "type": "evpn", "controller": "ctl", "vrf-vxlan": "10000", "mtu": 1450},
        ]})),
    );
    api
}

#[test]
fn test_load_json_document() {
    let (_dir, path) = create_test_document(
        "zone.json",
        r#"{"name": "vlan1", "mtu": 1500, "vlan": {"bridge": "vmbr0"}}"#,
    );

    let model = load_zone_document(&path).unwrap();
    assert_eq!(model.name, "vlan1");
    assert_eq!(model.mtu, Some(1500));
    assert_eq!(model.zone_type(), Some(ZoneType::Vlan));
}

#[test]
fn test_load_yaml_document() {
    let (_dir, path) = create_test_document(
        "zone.yml",
        r#"
name: evpn1
nodes: [pve1, pve2]
evpn:
  controller: evpnctl
  vrf_vxlan: 10000
  advertise_subnets: true
"#,
    );

    let model = load_zone_document(&path).unwrap();
    assert_eq!(model.nodes, Some(vec!["pve1".to_string(), "pve2".to_string()]));
    match model.variant {
        Some(ZoneVariant::Evpn(evpn)) => {
            assert_eq!(evpn.vrf_vxlan, Some(10000));
            assert_eq!(evpn.advertise_subnets, Some(true));
        }
        other => panic!("unexpected variant {:?}", other),
    }
}

#[test]
fn test_load_toml_document() {
    let (_dir, path) = create_test_document(
        "zone.toml",
        r#"
name = "qinq1"

[qinq]
bridge = "vmbr0"
tag = 100
"#,
    );

    let model = load_zone_document(&path).unwrap();
    assert_eq!(model.zone_type(), Some(ZoneType::QinQ));
}

#[test]
fn test_load_document_errors() {
    let (_dir, path) = create_test_document("zone.ini", "name = zone1");
    let err = load_zone_document(&path).unwrap_err().to_string();
    assert!(err.contains("Unsupported zone document format"));

    let (_dir, path) = create_test_document(
        "zone.json",
        r#"{"name": "zone1", "vlan": {"bridge": "vmbr0"}, "simple": {}}"#,
    );
    assert!(load_zone_document(&path).is_err());

    let missing = PathBuf::from("/nonexistent/zone.json");
    let err = load_zone_document(&missing).unwrap_err().to_string();
    assert!(err.contains("Failed to read zone document"));
}

#[test]
fn test_table_output() {
    let rows = vec![
        vec!["zone1".to_string(), "vlan".to_string()],
        vec!["evpnzone".to_string(), "evpn".to_string()],
    ];

    let table = output::table(&["Zone", "Type"], &rows);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "Zone      Type");
    assert_eq!(lines[1], "-".repeat(14));
    assert_eq!(lines[3], "evpnzone  evpn");
}

#[tokio::test]
async fn test_list_command_sorted_text_output() {
    let cmd = ListCommand::new(context(listing()));

    let zones = cmd.zones(None).await.unwrap();
    let text = cmd.render(&zones, OutputFormat::Text).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("Zone"));
    assert!(lines[2].starts_with("evpn1"));
    assert!(lines[2].contains("1450"));
    assert!(lines[3].starts_with("zvlan"));
}

#[tokio::test]
async fn test_list_command_json_output() {
    let cmd = ListCommand::new(context(listing()));

    let zones = cmd.zones(None).await.unwrap();
    let rendered = cmd.render(&zones, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

    assert_eq!(value[0]["zone"], json!("evpn1"));
    assert_eq!(value[0]["vrf-vxlan"], json!(10000));
    assert_eq!(value[1]["bridge"], json!("vmbr0"));
}

#[tokio::test]
async fn test_list_command_type_filter() {
    let mut api = MockApiClient::new();
    api.add_response("GET cluster/sdn/zones", ApiResponse::ok(json!({"data": []})));
    let context = context(api);

    let cmd = ListCommand::new(context.clone());
    assert!(cmd.zones(Some(ZoneType::Evpn)).await.unwrap().is_empty());
}

#[test]
fn test_show_yaml_output_is_a_document() {
    let cmd = ShowCommand::new(context(MockApiClient::new()));
    let record = ZoneRecord {
        bridge: Some("vmbr0".to_string()),
        mtu: Some(1500),
        ..ZoneRecord::new("vlan1", ZoneType::Vlan)
    };

    let rendered = cmd.render(&record, OutputFormat::Yaml).unwrap();
    let (_dir, path) = create_test_document("zone.yaml", &rendered);
    let model = load_zone_document(&path).unwrap();

    assert_eq!(model.name, "vlan1");
    assert_eq!(model.mtu, Some(1500));
    assert_eq!(model.zone_type(), Some(ZoneType::Vlan));
}

#[test]
fn test_show_text_output() {
    let cmd = ShowCommand::new(context(MockApiClient::new()));
    let record = ZoneRecord {
        bridge: Some("vmbr0".to_string()),
        ..ZoneRecord::new("vlan1", ZoneType::Vlan)
    };

    let text = cmd.render(&record, OutputFormat::Text).unwrap();
    assert!(text.contains("bridge: vmbr0"));
    assert!(text.contains("type: vlan"));
    assert!(text.contains("zone: vlan1"));
}

#[test]
fn test_show_unsupported_zone_type() {
    let cmd = ShowCommand::new(context(MockApiClient::new()));
    let record = ZoneRecord::new("faucet1", ZoneType::Faucet);

    assert!(cmd.render(&record, OutputFormat::Json).is_err());
    assert!(cmd.render(&record, OutputFormat::Text).is_ok());
}

#[tokio::test]
async fn test_apply_plans_create_for_missing_zone() {
    let mut api = MockApiClient::new();
    api.add_error("GET cluster/sdn/zones/vlan1", 500, "sdn 'vlan1' does not exist");
    let cmd = ApplyCommand::new(context(api));

    let (_dir, path) = create_test_document(
        "zone.json",
        r#"{"name": "vlan1", "vlan": {"bridge": "vmbr0"}}"#,
    );
    let plan = cmd.plan(&load_zone_document(&path).unwrap()).await.unwrap();

    assert_eq!(plan.action, PlanAction::Create);
    let summary = apply::describe(&plan);
    assert!(summary.starts_with("SDN zone 'vlan1': create"));
    assert!(summary.contains("+ bridge = vmbr0"));
    assert!(summary.contains("+ ipam = pve"));
}

#[tokio::test]
async fn test_apply_dry_run_makes_no_changes() {
    let mut api = MockApiClient::new();
    api.add_response(
        "GET cluster/sdn/zones/vlan1",
        ApiResponse::ok(json!({"data": {"zone": "vlan1", "type": "vlan", "bridge": "vmbr0", "ipam": "pve"}})),
    );
    let api = Arc::new(api);
    let cmd = ApplyCommand::new(CliContext::with_api(ClientConfig::default(), api.clone()));

    let (_dir, path) = create_test_document(
        "zone.json",
        r#"{"name": "vlan1", "vlan": {"bridge": "vmbr1"}}"#,
    );
    cmd.execute(&path, true).await.unwrap();

    let methods: Vec<String> = api
        .requests()
        .iter()
        .map(|request| request.method.to_string())
        .collect();
    assert_eq!(methods, vec!["GET"]);
}

#[tokio::test]
async fn test_apply_rejects_invalid_document() {
    let cmd = ApplyCommand::new(context(MockApiClient::new()));

    let (_dir, path) = create_test_document("zone.json", r#"{"name": "vlan1", "vlan": {}}"#);
    let err = cmd.execute(&path, false).await.unwrap_err();

    let chain: Vec<String> = err.chain().map(|cause| cause.to_string()).collect();
    assert!(chain.iter().any(|cause| cause.contains("vlan.bridge is required")));
}

#[tokio::test]
async fn test_delete_missing_zone_succeeds() {
    let mut api = MockApiClient::new();
    api.add_error("DELETE cluster/sdn/zones/zone1", 500, "sdn 'zone1' does not exist");
    let cmd = DeleteCommand::new(context(api));

    assert!(cmd.execute("zone1").await.is_ok());
}

#[tokio::test]
async fn test_delete_failure() {
    let mut api = MockApiClient::new();
    api.add_error("DELETE cluster/sdn/zones/zone1", 403, "Permission check failed");
    let cmd = DeleteCommand::new(context(api));

    let err = cmd.execute("zone1").await.unwrap_err().to_string();
    assert!(err.contains("Permission check failed"));
}

#[tokio::test]
async fn test_ping_command() {
    let cmd = PingCommand::new(context(MockApiClient::new()));
    assert!(cmd.execute().await.is_ok());

    let mut api = MockApiClient::new();
    api.set_health_status(false);
    let cmd = PingCommand::new(context(api));
    assert!(cmd.execute().await.is_err());
}

#[test]
fn test_config_command_masks_secret() {
    let config = ClientConfig {
        api_token: Some("root@pam!cli=d5e1a6f0".to_string()),
        ..Default::default()
    };
    let cmd = ConfigCommand::new(CliContext::with_api(config, Arc::new(MockApiClient::new())));

    let masked = cmd.render(false).unwrap();
    assert!(masked.contains("root@pam!cli=********"));
    assert!(!masked.contains("d5e1a6f0"));

    assert!(cmd.render(true).unwrap().contains("d5e1a6f0"));
}

#[test]
fn test_report() {
    let mut diags = Diagnostics::new();
    diags.add_warning("SDN Zone Not Found", "zone1");
    assert!(crate::report(&diags).is_ok());

    diags.add_error("Invalid Attribute Value", "mtu must be at least 68");
    let err = crate::report(&diags).unwrap_err().to_string();
    assert_eq!(err, "Invalid Attribute Value: mtu must be at least 68");
}
