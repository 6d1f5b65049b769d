//! Declarative schema of a zone configuration
//!
//! Defaults, validation and replacement rules applied before a zone is
//! written.

use std::fmt;

use crate::diagnostics::Diagnostics;
use crate::zone::{ZoneResourceModel, ZoneVariant};

pub const DEFAULT_IPAM: &str = "pve";
pub const DEFAULT_VLAN_PROTOCOL: &str = "802.1q";
pub const VLAN_PROTOCOLS: &[&str] = &["802.1q", "802.1ad"];
pub const DHCP_BACKENDS: &[&str] = &["dnsmasq"];
pub const NAME_MIN_LENGTH: usize = 3;

/// Fill in schema defaults and drop empty lists.
pub fn apply_defaults(model: &mut ZoneResourceModel) {
    if model.ipam.is_none() {
        model.ipam = Some(DEFAULT_IPAM.to_string());
    }

    normalize_list(&mut model.nodes);

    match &mut model.variant {
        Some(ZoneVariant::QinQ(qinq)) if qinq.vlan_protocol.is_none() => {
            qinq.vlan_protocol = Some(DEFAULT_VLAN_PROTOCOL.to_string());
        }
        Some(ZoneVariant::Vxlan(vxlan)) => normalize_list(&mut vxlan.peers),
        Some(ZoneVariant::Evpn(evpn)) => normalize_list(&mut evpn.exitnodes),
        _ => {}
    }
}

fn normalize_list(list: &mut Option<Vec<String>>) {
    if list.as_ref().is_some_and(Vec::is_empty) {
        *list = None;
    }
}

/// Check a configuration against the schema, collecting every violation.
pub fn validate(model: &ZoneResourceModel) -> Diagnostics {
    let mut diags = Diagnostics::new();

    if model.name.chars().count() < NAME_MIN_LENGTH {
        diags.add_error(
            "Invalid Attribute Value",
            format!(
                "name {:?} must be at least {} characters long",
                model.name, NAME_MIN_LENGTH
            ),
        );
    }

    if let Some(mtu) = model.mtu {
        if mtu < 68 {
            diags.add_error("Invalid Attribute Value", "mtu must be at least 68");
        }
    }

    let Some(variant) = &model.variant else {
        diags.add_error(
            "Missing Zone Type",
            "exactly one of simple, vlan, vxlan, qinq or evpn must be set",
        );
        return diags;
    };

    match variant {
        ZoneVariant::Simple(simple) => {
            check_one_of(&mut diags, "simple.dhcp", simple.dhcp.as_deref(), DHCP_BACKENDS);
        }
        ZoneVariant::Vlan(vlan) => {
            require(&mut diags, "vlan.bridge", vlan.bridge.is_some());
        }
        ZoneVariant::Vxlan(vxlan) => {
            require(&mut diags, "vxlan.peers", vxlan.peers.is_some());
            if let Some(port) = vxlan.port {
                if !(1..=65535).contains(&port) {
                    diags.add_error(
                        "Invalid Attribute Value",
                        "vxlan.port must be between 1 and 65535",
                    );
                }
            }
        }
        ZoneVariant::QinQ(qinq) => {
            require(&mut diags, "qinq.bridge", qinq.bridge.is_some());
            require(&mut diags, "qinq.tag", qinq.tag.is_some());
            if let Some(tag) = qinq.tag {
                if !(1..=4094).contains(&tag) {
                    diags.add_error(
                        "Invalid Attribute Value",
                        "qinq.tag must be between 1 and 4094",
                    );
                }
            }
            check_one_of(
                &mut diags,
                "qinq.vlan_protocol",
                qinq.vlan_protocol.as_deref(),
                VLAN_PROTOCOLS,
            );
        }
        ZoneVariant::Evpn(evpn) => {
            require(&mut diags, "evpn.controller", evpn.controller.is_some());
            require(&mut diags, "evpn.vrf_vxlan", evpn.vrf_vxlan.is_some());
            if let Some(vni) = evpn.vrf_vxlan {
                if !(1..=16_777_215).contains(&vni) {
                    diags.add_error(
                        "Invalid Attribute Value",
                        "evpn.vrf_vxlan must be between 1 and 16777215",
                    );
                }
            }
            if let Some(mac) = &evpn.mac {
                if !is_valid_mac(mac) {
                    diags.add_error(
                        "Invalid Attribute Value",
                        format!("evpn.mac {:?} is not a valid MAC address", mac),
                    );
                }
            }
        }
    }

    diags
}

fn require(diags: &mut Diagnostics, attribute: &str, present: bool) {
    if !present {
        diags.add_error(
            "Missing Required Attribute",
            format!("{} is required", attribute),
        );
    }
}

fn check_one_of(diags: &mut Diagnostics, attribute: &str, value: Option<&str>, allowed: &[&str]) {
    if let Some(value) = value {
        if !allowed.contains(&value) {
            diags.add_error(
                "Invalid Attribute Value",
                format!(
                    "{} must be one of {}, got {:?}",
                    attribute,
                    allowed.join(", "),
                    value
                ),
            );
        }
    }
}

fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }

    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Why a change cannot be applied in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceReason {
    NameChanged { from: String, to: String },
    VariantChanged { from: String, to: String },
}

impl fmt::Display for ReplaceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceReason::NameChanged { from, to } => {
                write!(f, "name changes from {} to {}", from, to)
            }
            ReplaceReason::VariantChanged { from, to } => {
                write!(f, "zone block changes from {} to {}", from, to)
            }
        }
    }
}

/// Changes that force the zone to be destroyed and created again.
pub fn requires_replace(
    prior: &ZoneResourceModel,
    planned: &ZoneResourceModel,
) -> Option<ReplaceReason> {
    if prior.name != planned.name {
        return Some(ReplaceReason::NameChanged {
            from: prior.name.clone(),
            to: planned.name.clone(),
        });
    }

    let block = |model: &ZoneResourceModel| {
        model
            .variant
            .as_ref()
            .map_or("none", ZoneVariant::block_name)
    };

    if block(prior) != block(planned) {
        return Some(ReplaceReason::VariantChanged {
            from: block(prior).to_string(),
            to: block(planned).to_string(),
        });
    }

    None
}
