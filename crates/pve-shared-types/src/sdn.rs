use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{pve_bool, pve_int};
use crate::error::{SharedResult, SharedTypeError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Simple,
    Vlan,
    QinQ,
    Vxlan,
    Evpn,
    Faucet,
}

impl ZoneType {
    pub const ALL: [ZoneType; 6] = [
        ZoneType::Simple,
        ZoneType::Vlan,
        ZoneType::QinQ,
        ZoneType::Vxlan,
        ZoneType::Evpn,
        ZoneType::Faucet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Simple => "simple",
            ZoneType::Vlan => "vlan",
            ZoneType::QinQ => "qinq",
            ZoneType::Vxlan => "vxlan",
            ZoneType::Evpn => "evpn",
            ZoneType::Faucet => "faucet",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = SharedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneType::ALL
            .into_iter()
            .find(|zone_type| zone_type.as_str() == s)
            .ok_or_else(|| SharedTypeError::InvalidValue {
                field: "type",
                value: s.to_string(),
            })
    }
}

/// Body of a SDN zone as exchanged with `cluster/sdn/zones`.
///
/// Documented in <https://pve.proxmox.com/pve-docs/api-viewer/#/cluster/sdn/zones>.
/// The type is kept as the raw wire string so that a zone of a type this
/// crate does not model can still be listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ZoneRecord {
    #[serde(rename = "zone")]
    pub name: String,

    /// Omitted on update requests.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_bool")]
    pub advertise_subnets: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_bool")]
    pub bridge_disable_mac_learning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_bool")]
    pub disable_arp_nd_suppression: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnszone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_int")]
    pub dp_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exitnodes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_bool")]
    pub exitnodes_local_routing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exitnodes_primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipam: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_int")]
    pub mtu: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversedns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt_import: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_int")]
    pub tag: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_int")]
    pub vrf_vxlan: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "pve_int")]
    pub vxlan_port: Option<i32>,
}

impl ZoneRecord {
    pub fn new(name: impl Into<String>, zone_type: ZoneType) -> Self {
        Self {
            name: name.into(),
            zone_type: Some(zone_type.to_string()),
            ..Default::default()
        }
    }

    /// Parse the wire type of this record.
    pub fn parse_type(&self) -> SharedResult<ZoneType> {
        self.zone_type
            .as_deref()
            .ok_or(SharedTypeError::MissingField("type"))?
            .parse()
    }

    /// Whether the optional field with the given wire name carries a value.
    ///
    /// Unknown names are reported as unsupported.
    pub fn has_field(&self, wire_name: &str) -> SharedResult<bool> {
        let present = match wire_name {
            "advertise-subnets" => self.advertise_subnets.is_some(),
            "bridge" => self.bridge.is_some(),
            "bridge-disable-mac-learning" => self.bridge_disable_mac_learning.is_some(),
            "controller" => self.controller.is_some(),
            "dhcp" => self.dhcp.is_some(),
            "disable-arp-nd-suppression" => self.disable_arp_nd_suppression.is_some(),
            "dns" => self.dns.is_some(),
            "dnszone" => self.dnszone.is_some(),
            "dp-id" => self.dp_id.is_some(),
            "exitnodes" => self.exitnodes.is_some(),
            "exitnodes-local-routing" => self.exitnodes_local_routing.is_some(),
            "exitnodes-primary" => self.exitnodes_primary.is_some(),
            "ipam" => self.ipam.is_some(),
            "mac" => self.mac.is_some(),
            "mtu" => self.mtu.is_some(),
            "nodes" => self.nodes.is_some(),
            "peers" => self.peers.is_some(),
            "reversedns" => self.reversedns.is_some(),
            "rt-import" => self.rt_import.is_some(),
            "tag" => self.tag.is_some(),
            "vlan-protocol" => self.vlan_protocol.is_some(),
            "vrf-vxlan" => self.vrf_vxlan.is_some(),
            "vxlan-port" => self.vxlan_port.is_some(),
            other => return Err(SharedTypeError::Unsupported(other.to_string())),
        };

        Ok(present)
    }
}

/// Body of a `PUT cluster/sdn/zones/{zone}` request.
///
/// Fields absent from `record` are left untouched by the server unless they
/// are named in `delete`. The update endpoint rejects `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneUpdateRequest {
    #[serde(flatten)]
    pub record: ZoneRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
}

impl ZoneUpdateRequest {
    pub fn new(mut record: ZoneRecord, delete: &[&str]) -> Self {
        record.zone_type = None;

        let delete = if delete.is_empty() {
            None
        } else {
            Some(delete.join(","))
        };

        Self { record, delete }
    }

    /// Wire names of the fields this request clears.
    pub fn deleted_fields(&self) -> Vec<&str> {
        self.delete
            .as_deref()
            .map(|delete| delete.split(',').collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneListResponseBody {
    #[serde(default)]
    pub data: Option<Vec<ZoneRecord>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneGetResponseBody {
    #[serde(default)]
    pub data: Option<ZoneRecord>,
}
