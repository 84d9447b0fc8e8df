//! Schedule payload loading.
//!
//! The payload mirrors the HTTP body the report service accepts:
//! `{schedule: [{timestamp, data: [{name, value}]}], cost_analysis?: {...}}`.
//! Slot fields are kept as loose JSON so that validation downstream can name
//! the exact slot and entry that is malformed.

use std::path::Path;

use report_core::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

// ── Payload types ─────────────────────────────────────────────────────────────

/// One day's optimised schedule plus optional cost totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePayload {
    #[serde(default)]
    pub schedule: Vec<RawSlot>,
    #[serde(default)]
    pub cost_analysis: Option<RawCostAnalysis>,
}

/// A schedule slot as received, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSlot {
    /// Expected to be an ISO 8601 string.
    #[serde(default)]
    pub timestamp: Value,
    /// Expected to be a list of `{name, value}` objects.
    #[serde(default)]
    pub data: Value,
}

/// The optional cost block as received, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCostAnalysis {
    #[serde(default)]
    pub total_cost: Value,
    #[serde(default)]
    pub total_load_cost: Value,
    #[serde(default)]
    pub total_solar_revenue: Value,
    #[serde(default)]
    pub currency: Option<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse a schedule payload from a JSON string.
pub fn parse_payload(json: &str) -> Result<SchedulePayload> {
    let payload: SchedulePayload = serde_json::from_str(json)?;
    debug!(
        "Parsed payload with {} slots (cost analysis: {})",
        payload.schedule.len(),
        payload.cost_analysis.is_some()
    );
    Ok(payload)
}

/// Read and parse a schedule payload from a JSON file.
pub fn read_payload(path: &Path) -> Result<SchedulePayload> {
    let content = std::fs::read_to_string(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_payload(&content)
}

/// Interpret a JSON value as a number.
///
/// Accepts JSON numbers and strings holding a number, as the HTTP request
/// model does. Non-finite results are rejected.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
