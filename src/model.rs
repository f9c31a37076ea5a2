//! Data model for the console feeds and REST resources
//!
//! Wire names are camelCase to match the backend payloads. `DisplayTiming`
//! is the view projection owned by the reconciler; its UI flags are
//! transient and never cross the wire.

use serde::{Deserialize, Serialize};

/// Sentinel shown when a timing's trigger operation cannot be resolved
pub const UNRESOLVED_OPERATION: &str = "--";

/// Authorization scope that unlocks the user administration resources
pub const ADMIN_SCOPE: &str = "adminAuth";

/// A timing record as delivered on the raw timings feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub timing_id: String,
    pub timing_name: String,
    pub timing_type: String,
    /// Opaque structured payload, passed through untouched
    pub timing_properties: serde_json::Value,
    pub is_active: bool,
    pub override_lock: bool,
    pub lock_status: bool,
    pub shabbat_mode: bool,
    /// Foreign key into the operations collection
    pub trigger_operation_id: String,
}

/// An operation record; read-only reference data for timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    pub operation_name: String,
}

/// Resolve an operation's display name by id, `"--"` when absent
pub fn operation_name(operations: &[Operation], operation_id: &str) -> String {
    operations
        .iter()
        .find(|op| op.operation_id == operation_id)
        .map(|op| op.operation_name.clone())
        .unwrap_or_else(|| UNRESOLVED_OPERATION.to_string())
}

/// Timing enriched for display, with transient UI state
///
/// One instance per `timing_id` is kept alive across reconciliation passes;
/// updates overlay the projected fields in place so the transient flags
/// survive upstream refreshes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTiming {
    pub timing_id: String,
    pub timing_name: String,
    pub timing_type: String,
    pub timing_properties: serde_json::Value,
    pub is_active: bool,
    pub override_lock: bool,
    pub lock_status: bool,
    pub shabbat_mode: bool,
    pub trigger_operation_id: String,
    /// Denormalized from the operations collection at reconciliation time
    pub operation_name: String,
    /// A write for this row is in flight
    #[serde(skip)]
    pub syncing: bool,
    /// The row is open for inline editing
    #[serde(skip)]
    pub editing: bool,
}

impl DisplayTiming {
    /// Build a fresh display entry from a raw timing and its resolved name
    pub fn project(timing: &Timing, operation_name: String) -> Self {
        Self {
            timing_id: timing.timing_id.clone(),
            timing_name: timing.timing_name.clone(),
            timing_type: timing.timing_type.clone(),
            timing_properties: timing.timing_properties.clone(),
            is_active: timing.is_active,
            override_lock: timing.override_lock,
            lock_status: timing.lock_status,
            shabbat_mode: timing.shabbat_mode,
            trigger_operation_id: timing.trigger_operation_id.clone(),
            operation_name,
            syncing: false,
            editing: false,
        }
    }

    /// Overlay the projected fields onto this entry, leaving transient
    /// UI state (`syncing`, `editing`) untouched
    pub fn overlay(&mut self, timing: &Timing, operation_name: String) {
        self.timing_id = timing.timing_id.clone();
        self.timing_name = timing.timing_name.clone();
        self.timing_type = timing.timing_type.clone();
        self.timing_properties = timing.timing_properties.clone();
        self.is_active = timing.is_active;
        self.override_lock = timing.override_lock;
        self.lock_status = timing.lock_status;
        self.shabbat_mode = timing.shabbat_mode;
        self.trigger_operation_id = timing.trigger_operation_id.clone();
        self.operation_name = operation_name;
    }

    /// The full backend field set for this entry's current values
    pub fn to_timing(&self) -> Timing {
        Timing {
            timing_id: self.timing_id.clone(),
            timing_name: self.timing_name.clone(),
            timing_type: self.timing_type.clone(),
            timing_properties: self.timing_properties.clone(),
            is_active: self.is_active,
            override_lock: self.override_lock,
            lock_status: self.lock_status,
            shabbat_mode: self.shabbat_mode,
            trigger_operation_id: self.trigger_operation_id.clone(),
        }
    }
}

/// A user profile; identity is the email address
///
/// Profile fields beyond the ones the client inspects are carried through
/// the flattened map so round trips never drop backend data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Whether this profile holds the admin scope
    pub fn is_admin(&self) -> bool {
        self.scope.as_deref() == Some(ADMIN_SCOPE)
    }
}
