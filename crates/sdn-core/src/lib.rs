//! Proxmox VE SDN Core
//!
//! Declarative SDN zone resource: configuration model, schema and lifecycle
//! on top of the zones API client.

pub mod diagnostics;
pub mod resource;
pub mod schema;
pub mod zone;


pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use resource::{FieldChange, Plan, PlanAction, ZoneResource};
pub use schema::ReplaceReason;
pub use zone::{
    AdapterError, EvpnZone, QinQZone, SimpleZone, VlanZone, VxlanZone, ZoneDocument,
    ZoneResourceModel, ZoneVariant,
};
