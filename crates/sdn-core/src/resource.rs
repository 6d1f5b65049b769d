//! SDN zone resource lifecycle
//!
//! Create, read, update and delete a zone through the zones API, and plan
//! the change needed to bring the cluster to a desired configuration.

use std::collections::BTreeSet;
use std::fmt;

use pve_sdn_client::{ZoneClientError, ZonesClient};
use serde::Serialize;
use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::schema::{self, ReplaceReason};
use crate::zone::ZoneResourceModel;

/// Change required to reach the desired configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    Replace(ReplaceReason),
    NoOp,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAction::Create => write!(f, "create"),
            PlanAction::Update => write!(f, "update"),
            PlanAction::Replace(reason) => write!(f, "replace ({})", reason),
            PlanAction::NoOp => write!(f, "no changes"),
        }
    }
}

/// A single wire attribute that differs between the cluster and the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.before, &self.after) {
            (None, Some(after)) => write!(f, "+ {} = {}", self.field, after),
            (Some(before), None) => write!(f, "- {} = {}", self.field, before),
            (Some(before), Some(after)) => {
                write!(f, "~ {}: {} -> {}", self.field, before, after)
            }
            (None, None) => write!(f, "  {}", self.field),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub action: PlanAction,
    pub desired: ZoneResourceModel,
    pub current: Option<ZoneResourceModel>,
    pub changes: Vec<FieldChange>,
}

impl Plan {
    pub fn is_noop(&self) -> bool {
        self.action == PlanAction::NoOp
    }
}

/// Zone resource backed by the cluster zones API
pub struct ZoneResource {
    client: ZonesClient,
}

impl ZoneResource {
    pub fn new(client: ZonesClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ZonesClient {
        &self.client
    }

    /// Create the zone and return the configuration read back from the cluster.
    pub async fn create(
        &self,
        plan: &ZoneResourceModel,
        diags: &mut Diagnostics,
    ) -> Option<ZoneResourceModel> {
        let plan = prepare(plan, diags)?;

        let mut conversion = Diagnostics::new();
        let record = plan.to_wire_record(&mut conversion);
        if !accept(conversion, diags) {
            return None;
        }

        log::info!("Creating SDN zone {}", plan.name);
        if let Err(e) = self.client.create(&record).await {
            diags.add_error(
                "Error Creating SDN Zone",
                format!("could not create SDN zone {}: {}", plan.name, e),
            );
            return None;
        }

        self.read_back(&plan.name, diags).await
    }

    /// Refresh a zone from the cluster.
    ///
    /// A zone that no longer exists yields a warning and a configuration
    /// reset to its name.
    pub async fn read(
        &self,
        state: &ZoneResourceModel,
        diags: &mut Diagnostics,
    ) -> Option<ZoneResourceModel> {
        match self.client.get(&state.name).await {
            Ok(record) => convert(&record, diags),
            Err(e) if e.is_not_found() => {
                log::warn!("SDN zone {} not found, removing from state", state.name);
                diags.add_warning("SDN Zone Not Found", e.to_string());
                let mut state = state.clone();
                state.clear_all_except_name();
                Some(state)
            }
            Err(e) => {
                diags.add_error(
                    "Error Reading SDN Zone",
                    format!("could not read SDN zone {}: {}", state.name, e),
                );
                None
            }
        }
    }

    /// Update the zone in place, clearing attributes no longer configured.
    pub async fn update(
        &self,
        plan: &ZoneResourceModel,
        diags: &mut Diagnostics,
    ) -> Option<ZoneResourceModel> {
        let plan = prepare(plan, diags)?;

        let mut conversion = Diagnostics::new();
        let request = plan.to_update_request(&mut conversion);
        if !accept(conversion, diags) {
            return None;
        }

        log::info!(
            "Updating SDN zone {} (clearing: {})",
            plan.name,
            request.delete.as_deref().unwrap_or("none")
        );
        if let Err(e) = self.client.update(&plan.name, &request).await {
            diags.add_error(
                "Error Updating SDN Zone",
                format!("could not update SDN zone {}: {}", plan.name, e),
            );
            return None;
        }

        self.read_back(&plan.name, diags).await
    }

    /// Delete the zone. A zone that is already gone only yields a warning.
    pub async fn delete(&self, state: &ZoneResourceModel, diags: &mut Diagnostics) {
        log::info!("Deleting SDN zone {}", state.name);

        match self.client.delete(&state.name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                log::warn!("SDN zone {} already deleted", state.name);
                diags.add_warning("SDN Zone Not Found", e.to_string());
            }
            Err(e) => {
                diags.add_error(
                    "Error Deleting SDN Zone",
                    format!("could not delete SDN zone {}: {}", state.name, e),
                );
            }
        }
    }

    /// Compare a desired configuration with the cluster.
    pub async fn plan(
        &self,
        desired: &ZoneResourceModel,
        diags: &mut Diagnostics,
    ) -> Option<Plan> {
        let desired = prepare(desired, diags)?;

        let current = match self.client.get(&desired.name).await {
            Ok(record) => Some(convert(&record, diags)?),
            Err(ZoneClientError::NotFound { .. }) => None,
            Err(e) => {
                diags.add_error(
                    "Error Reading SDN Zone",
                    format!("could not read SDN zone {}: {}", desired.name, e),
                );
                return None;
            }
        };

        let mut conversion = Diagnostics::new();

        let Some(current) = current else {
            let changes = diff(None, &desired, &mut conversion);
            if !accept(conversion, diags) {
                return None;
            }
            return Some(Plan {
                action: PlanAction::Create,
                desired,
                current: None,
                changes,
            });
        };

        let action = match schema::requires_replace(&current, &desired) {
            Some(reason) => PlanAction::Replace(reason),
            None => PlanAction::Update,
        };

        let changes = diff(Some(&current), &desired, &mut conversion);
        if !accept(conversion, diags) {
            return None;
        }
        let action = if action == PlanAction::Update && changes.is_empty() {
            PlanAction::NoOp
        } else {
            action
        };

        log::debug!("Planned {} for SDN zone {}", action, desired.name);

        Some(Plan {
            action,
            desired,
            current: Some(current),
            changes,
        })
    }

    /// Carry out a plan, returning the resulting configuration.
    pub async fn apply(&self, plan: &Plan, diags: &mut Diagnostics) -> Option<ZoneResourceModel> {
        match (&plan.action, &plan.current) {
            (PlanAction::NoOp, Some(current)) => Some(current.clone()),
            (PlanAction::NoOp, None) | (PlanAction::Create, _) => {
                self.create(&plan.desired, diags).await
            }
            (PlanAction::Update, _) => self.update(&plan.desired, diags).await,
            (PlanAction::Replace(reason), current) => {
                log::info!("Replacing SDN zone {}: {}", plan.desired.name, reason);
                if let Some(current) = current {
                    self.delete(current, diags).await;
                    if diags.has_error() {
                        return None;
                    }
                }
                self.create(&plan.desired, diags).await
            }
        }
    }

    async fn read_back(&self, zone: &str, diags: &mut Diagnostics) -> Option<ZoneResourceModel> {
        match self.client.get(zone).await {
            Ok(record) => convert(&record, diags),
            Err(e) => {
                diags.add_error(
                    "Error Reading SDN Zone",
                    format!("could not read SDN zone {} after write: {}", zone, e),
                );
                None
            }
        }
    }
}

/// Apply defaults and validate, stopping on schema errors.
fn prepare(model: &ZoneResourceModel, diags: &mut Diagnostics) -> Option<ZoneResourceModel> {
    let mut model = model.clone();
    schema::apply_defaults(&mut model);

    accept(schema::validate(&model), diags).then_some(model)
}

/// Move `step` into `diags`; false if it holds an error.
fn accept(step: Diagnostics, diags: &mut Diagnostics) -> bool {
    let ok = !step.has_error();
    diags.extend(step);
    ok
}

fn convert(
    record: &pve_shared_types::ZoneRecord,
    diags: &mut Diagnostics,
) -> Option<ZoneResourceModel> {
    match ZoneResourceModel::from_wire_record(record, diags) {
        Ok(model) => Some(model),
        Err(e) => {
            diags.add_error("Error Reading SDN Zone", e.to_string());
            None
        }
    }
}

/// Wire attributes that differ between two configurations, sorted by name.
fn diff(
    current: Option<&ZoneResourceModel>,
    desired: &ZoneResourceModel,
    diags: &mut Diagnostics,
) -> Vec<FieldChange> {
    let before = current
        .map(|current| wire_fields(current, diags))
        .unwrap_or_default();
    let after = wire_fields(desired, diags);

    let fields: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

    fields
        .into_iter()
        .filter_map(|field| {
            let before = before.get(field).map(render_value);
            let after = after.get(field).map(render_value);
            (before != after).then(|| FieldChange {
                field: field.clone(),
                before,
                after,
            })
        })
        .collect()
}

fn wire_fields(
    model: &ZoneResourceModel,
    diags: &mut Diagnostics,
) -> serde_json::Map<String, Value> {
    let record = model.to_wire_record(diags);

    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => fields,
        _ => serde_json::Map::new(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
