//! SDN zone configuration model
//!
//! The user-facing shape of a zone: common attributes plus exactly one
//! type-specific block. Converts to and from the flat wire record of
//! `cluster/sdn/zones`.

use pve_shared_types::{join_list, split_list, ZoneRecord, ZoneType, ZoneUpdateRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::Diagnostics;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("SDN zone type is not recognized: {0}")]
    UnrecognizedVariant(String),

    #[error("only one of the zone blocks may be set, found: {0}")]
    ConflictingVariants(String),
}

/// Attributes common to every zone type, as wire names.
const BASE_FIELDS: &[&str] = &["mtu", "nodes", "ipam", "dns", "reversedns", "dnszone"];

/// Wire names of the type-specific attributes the adapter manages.
pub fn variant_fields(zone_type: ZoneType) -> &'static [&'static str] {
    match zone_type {
        ZoneType::Simple => &["dhcp"],
        ZoneType::Vlan => &["bridge"],
        ZoneType::Vxlan => &["peers", "vxlan-port"],
        ZoneType::QinQ => &["bridge", "tag", "vlan-protocol"],
        ZoneType::Evpn => &[
            "controller",
            "vrf-vxlan",
            "mac",
            "exitnodes",
            "exitnodes-primary",
            "exitnodes-local-routing",
            "advertise-subnets",
            "disable-arp-nd-suppression",
            "rt-import",
        ],
        ZoneType::Faucet => &[],
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleZone {
    /// Automatic DHCP backend (`dnsmasq`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VlanZone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VxlanZone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<String>>,
    /// VXLAN tunnel UDP port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QinQZone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
    /// Service VLAN tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_protocol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvpnZone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf_vxlan: Option<i32>,
    /// Anycast logical router MAC address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exitnodes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exitnodes_primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exitnodes_local_routing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_subnets: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_arp_nd_suppression: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt_import: Option<String>,
}

/// The type-specific block of a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneVariant {
    Simple(SimpleZone),
    Vlan(VlanZone),
    Vxlan(VxlanZone),
    QinQ(QinQZone),
    Evpn(EvpnZone),
}

impl ZoneVariant {
    pub fn zone_type(&self) -> ZoneType {
        match self {
            ZoneVariant::Simple(_) => ZoneType::Simple,
            ZoneVariant::Vlan(_) => ZoneType::Vlan,
            ZoneVariant::Vxlan(_) => ZoneType::Vxlan,
            ZoneVariant::QinQ(_) => ZoneType::QinQ,
            ZoneVariant::Evpn(_) => ZoneType::Evpn,
        }
    }

    /// Name of the configuration block holding this variant.
    pub fn block_name(&self) -> &'static str {
        self.zone_type().as_str()
    }
}

/// Configuration of a SDN zone
///
/// `variant` is `None` only for a zone that has been cleared after it
/// disappeared from the cluster; schema validation rejects it otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ZoneDocument", into = "ZoneDocument")]
pub struct ZoneResourceModel {
    pub name: String,
    pub mtu: Option<i32>,
    pub nodes: Option<Vec<String>>,
    pub ipam: Option<String>,
    pub dns: Option<String>,
    pub reverse_dns: Option<String>,
    pub dns_zone: Option<String>,
    pub variant: Option<ZoneVariant>,
}

impl ZoneResourceModel {
    pub fn new(name: impl Into<String>, variant: ZoneVariant) -> Self {
        Self {
            name: name.into(),
            variant: Some(variant),
            ..Default::default()
        }
    }

    /// A model carrying only the identifying name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn zone_type(&self) -> Option<ZoneType> {
        self.variant.as_ref().map(ZoneVariant::zone_type)
    }

    /// Whether a type block is set, i.e. the zone exists.
    pub fn is_populated(&self) -> bool {
        self.variant.is_some()
    }

    /// Reset every attribute except the name.
    pub fn clear_all_except_name(&mut self) {
        *self = Self::named(std::mem::take(&mut self.name));
    }

    /// Build the body of a create request.
    pub fn to_wire_record(&self, diags: &mut Diagnostics) -> ZoneRecord {
        let mut record = ZoneRecord {
            name: self.name.clone(),
            mtu: self.mtu,
            nodes: list_to_wire("nodes", self.nodes.as_deref(), diags),
            ipam: self.ipam.clone(),
            dns: self.dns.clone(),
            reversedns: self.reverse_dns.clone(),
            dnszone: self.dns_zone.clone(),
            ..Default::default()
        };

        let Some(variant) = &self.variant else {
            return record;
        };

        record.zone_type = Some(variant.zone_type().to_string());

        match variant {
            ZoneVariant::Simple(simple) => {
                record.dhcp = simple.dhcp.clone();
            }
            ZoneVariant::Vlan(vlan) => {
                record.bridge = vlan.bridge.clone();
            }
            ZoneVariant::Vxlan(vxlan) => {
                record.peers = list_to_wire("vxlan.peers", vxlan.peers.as_deref(), diags);
                record.vxlan_port = vxlan.port;
            }
            ZoneVariant::QinQ(qinq) => {
                record.bridge = qinq.bridge.clone();
                record.tag = qinq.tag;
                record.vlan_protocol = qinq.vlan_protocol.clone();
            }
            ZoneVariant::Evpn(evpn) => {
                record.controller = evpn.controller.clone();
                record.vrf_vxlan = evpn.vrf_vxlan;
                record.mac = evpn.mac.clone();
                record.exitnodes = list_to_wire("evpn.exitnodes", evpn.exitnodes.as_deref(), diags);
                record.exitnodes_primary = evpn.exitnodes_primary.clone();
                record.exitnodes_local_routing = evpn.exitnodes_local_routing;
                record.advertise_subnets = evpn.advertise_subnets;
                record.disable_arp_nd_suppression = evpn.disable_arp_nd_suppression;
                record.rt_import = evpn.rt_import.clone();
            }
        }

        record
    }

    /// Build the body of an update request.
    ///
    /// Every attribute of the zone's type that is unset is listed in
    /// `delete`, so the server clears values set by earlier applies.
    pub fn to_update_request(&self, diags: &mut Diagnostics) -> ZoneUpdateRequest {
        let record = self.to_wire_record(diags);

        let type_fields = self
            .zone_type()
            .map(variant_fields)
            .unwrap_or_default();

        let delete: Vec<&str> = BASE_FIELDS
            .iter()
            .chain(type_fields)
            .copied()
            .filter(|field| matches!(record.has_field(field), Ok(false)))
            .collect();

        ZoneUpdateRequest::new(record, &delete)
    }

    /// Derive the configuration from a record returned by the server.
    pub fn from_wire_record(
        record: &ZoneRecord,
        diags: &mut Diagnostics,
    ) -> Result<Self, AdapterError> {
        let zone_type = record.zone_type.as_deref().unwrap_or_default();
        let variant = match zone_type.parse::<ZoneType>() {
            Ok(ZoneType::Simple) => ZoneVariant::Simple(SimpleZone {
                dhcp: record.dhcp.clone(),
            }),
            Ok(ZoneType::Vlan) => ZoneVariant::Vlan(VlanZone {
                bridge: record.bridge.clone(),
            }),
            Ok(ZoneType::Vxlan) => ZoneVariant::Vxlan(VxlanZone {
                peers: list_from_wire("vxlan.peers", record.peers.as_deref(), diags),
                port: record.vxlan_port,
            }),
            Ok(ZoneType::QinQ) => ZoneVariant::QinQ(QinQZone {
                bridge: record.bridge.clone(),
                tag: record.tag,
                vlan_protocol: record.vlan_protocol.clone(),
            }),
            Ok(ZoneType::Evpn) => ZoneVariant::Evpn(EvpnZone {
                controller: record.controller.clone(),
                vrf_vxlan: record.vrf_vxlan,
                mac: record.mac.clone(),
                exitnodes: list_from_wire("evpn.exitnodes", record.exitnodes.as_deref(), diags),
                exitnodes_primary: record.exitnodes_primary.clone(),
                exitnodes_local_routing: record.exitnodes_local_routing,
                advertise_subnets: record.advertise_subnets,
                disable_arp_nd_suppression: record.disable_arp_nd_suppression,
                rt_import: record.rt_import.clone(),
            }),
            Ok(ZoneType::Faucet) | Err(_) => {
                return Err(AdapterError::UnrecognizedVariant(zone_type.to_string()));
            }
        };

        Ok(Self {
            name: record.name.clone(),
            mtu: record.mtu,
            nodes: list_from_wire("nodes", record.nodes.as_deref(), diags),
            ipam: record.ipam.clone(),
            dns: record.dns.clone(),
            reverse_dns: record.reversedns.clone(),
            dns_zone: record.dnszone.clone(),
            variant: Some(variant),
        })
    }
}

/// Join a list attribute for the wire, flagging elements that would not
/// survive the comma-separated encoding.
fn list_to_wire(attribute: &str, values: Option<&[String]>, diags: &mut Diagnostics) -> Option<String> {
    for value in values.unwrap_or_default() {
        if value.contains(',') {
            diags.add_error(
                "Invalid List Element",
                format!("{} element {:?} must not contain ','", attribute, value),
            );
        }
    }

    join_list(values)
}

/// Split a wire list, dropping empty elements left by stray commas.
fn list_from_wire(attribute: &str, value: Option<&str>, diags: &mut Diagnostics) -> Option<Vec<String>> {
    let values = split_list(value)?;

    if values.iter().any(String::is_empty) {
        diags.add_warning(
            "Empty List Element",
            format!("{} value {:?} contains an empty element", attribute, value.unwrap_or_default()),
        );
        let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        return if values.is_empty() { None } else { Some(values) };
    }

    Some(values)
}

/// Serialized form of a zone configuration, as written in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipam: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversedns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnszone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple: Option<SimpleZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<VlanZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vxlan: Option<VxlanZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qinq: Option<QinQZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evpn: Option<EvpnZone>,
}

impl TryFrom<ZoneDocument> for ZoneResourceModel {
    type Error = AdapterError;

    fn try_from(doc: ZoneDocument) -> Result<Self, Self::Error> {
        let mut variants: Vec<ZoneVariant> = Vec::new();
        variants.extend(doc.simple.map(ZoneVariant::Simple));
        variants.extend(doc.vlan.map(ZoneVariant::Vlan));
        variants.extend(doc.vxlan.map(ZoneVariant::Vxlan));
        variants.extend(doc.qinq.map(ZoneVariant::QinQ));
        variants.extend(doc.evpn.map(ZoneVariant::Evpn));

        if variants.len() > 1 {
            let blocks: Vec<&str> = variants.iter().map(ZoneVariant::block_name).collect();
            return Err(AdapterError::ConflictingVariants(blocks.join(", ")));
        }

        Ok(Self {
            name: doc.name,
            mtu: doc.mtu,
            nodes: doc.nodes,
            ipam: doc.ipam,
            dns: doc.dns,
            reverse_dns: doc.reversedns,
            dns_zone: doc.dnszone,
            variant: variants.pop(),
        })
    }
}

impl From<ZoneResourceModel> for ZoneDocument {
    fn from(model: ZoneResourceModel) -> Self {
        let mut doc = ZoneDocument {
            name: model.name,
            mtu: model.mtu,
            nodes: model.nodes,
            ipam: model.ipam,
            dns: model.dns,
            reversedns: model.reverse_dns,
            dnszone: model.dns_zone,
            ..Default::default()
        };

        match model.variant {
            Some(ZoneVariant::Simple(simple)) => doc.simple = Some(simple),
            Some(ZoneVariant::Vlan(vlan)) => doc.vlan = Some(vlan),
            Some(ZoneVariant::Vxlan(vxlan)) => doc.vxlan = Some(vxlan),
            Some(ZoneVariant::QinQ(qinq)) => doc.qinq = Some(qinq),
            Some(ZoneVariant::Evpn(evpn)) => doc.evpn = Some(evpn),
            None => {}
        }

        doc
    }
}
