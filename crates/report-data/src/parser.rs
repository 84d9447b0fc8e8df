//! Slot validation and normalisation.
//!
//! Turns the raw slot list of a [`SchedulePayload`](crate::reader::SchedulePayload)
//! into strictly ordered [`Slot`]s and the universe of observed load names.
//! Load names are kept exactly as given; only a blank name is rejected.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use report_core::error::ValidationError;
use report_core::models::{Sample, Slot};
use report_core::time_utils::TimezoneHandler;
use serde_json::Value;
use tracing::{debug, warn};

use crate::reader::{value_as_f64, RawSlot};

// ── ParsedSchedule ────────────────────────────────────────────────────────────

/// A validated schedule: one slot per distinct timestamp, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSchedule {
    slots: Vec<Slot>,
    loads: Vec<String>,
}

impl ParsedSchedule {
    /// Slots in strictly increasing timestamp order. Never empty.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Every load name seen anywhere, in first-appearance order of the input.
    pub fn loads(&self) -> &[String] {
        &self.loads
    }

    /// Slot timestamps in order.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.slots.iter().map(|s| s.timestamp).collect()
    }

    /// Timestamp of the earliest slot.
    pub fn first_timestamp(&self) -> DateTime<Utc> {
        // Construction rejects empty schedules.
        self.slots[0].timestamp
    }

    /// The load's power at every slot timestamp.
    ///
    /// This is an explicit join of the load against all timestamps: a slot
    /// without a sample for the load contributes `0.0` kW.
    pub fn series(&self, load_name: &str) -> Vec<(DateTime<Utc>, f64)> {
        self.slots
            .iter()
            .map(|slot| (slot.timestamp, slot.power_of(load_name).unwrap_or(0.0)))
            .collect()
    }
}

// ── SlotParser ────────────────────────────────────────────────────────────────

/// Validates raw slots into a [`ParsedSchedule`].
#[derive(Debug, Clone, Copy)]
pub struct SlotParser {
    handler: TimezoneHandler,
}

/// Samples collected for one timestamp, in first-insertion order.
type PendingSlot = Vec<(String, f64)>;

impl SlotParser {
    pub fn new(handler: TimezoneHandler) -> Self {
        Self { handler }
    }

    /// Validate and normalise `raw`.
    ///
    /// * Timestamps are sorted. Records sharing a timestamp merge into one
    ///   slot.
    /// * A load repeated within a slot keeps its last value.
    /// * Loads missing from a slot are not an error. [`ParsedSchedule::series`]
    ///   zero-fills them.
    pub fn parse(&self, raw: &[RawSlot]) -> Result<ParsedSchedule, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::EmptySchedule);
        }

        let mut pending: BTreeMap<DateTime<Utc>, PendingSlot> = BTreeMap::new();
        let mut loads: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut previous: Option<DateTime<Utc>> = None;
        let mut out_of_order = false;

        for (index, raw_slot) in raw.iter().enumerate() {
            let timestamp = self.parse_timestamp(index, &raw_slot.timestamp)?;
            if previous.is_some_and(|p| timestamp < p) {
                out_of_order = true;
            }
            previous = Some(timestamp);

            let samples = pending.entry(timestamp).or_default();
            for (name, power_kw) in Self::parse_data(index, &raw_slot.data)? {
                if seen.insert(name.clone()) {
                    loads.push(name.clone());
                }
                match samples.iter_mut().find(|(n, _)| *n == name) {
                    Some(existing) => {
                        warn!(
                            "Slot {} ({}): duplicate sample for {}, keeping last value {}",
                            index, timestamp, name, power_kw
                        );
                        existing.1 = power_kw;
                    }
                    None => samples.push((name, power_kw)),
                }
            }
        }

        if out_of_order {
            debug!("SlotParser: input timestamps were out of order, sorted");
        }

        let slots: Vec<Slot> = pending
            .into_iter()
            .map(|(timestamp, samples)| Slot {
                timestamp,
                samples: samples
                    .into_iter()
                    .map(|(load_name, power_kw)| Sample {
                        timestamp,
                        load_name,
                        power_kw,
                    })
                    .collect(),
            })
            .collect();

        debug!(
            "SlotParser: {} raw records -> {} slots, {} loads",
            raw.len(),
            slots.len(),
            loads.len()
        );

        Ok(ParsedSchedule { slots, loads })
    }

    fn parse_timestamp(&self, index: usize, value: &Value) -> Result<DateTime<Utc>, ValidationError> {
        let parsed = match value {
            Value::String(s) => self.handler.parse_timestamp(s),
            _ => None,
        };
        parsed.ok_or_else(|| ValidationError::InvalidTimestamp {
            index,
            value: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
    }

    /// Validate a slot's `data` list into `(name, power_kw)` pairs.
    fn parse_data(slot: usize, data: &Value) -> Result<Vec<(String, f64)>, ValidationError> {
        let entries = match data {
            Value::Null => return Ok(Vec::new()),
            Value::Array(entries) => entries,
            _ => {
                return Err(ValidationError::InvalidShape {
                    slot,
                    field: "data",
                    expected: "a list",
                })
            }
        };

        entries
            .iter()
            .enumerate()
            .map(|(entry, item)| Self::parse_sample(slot, entry, item))
            .collect()
    }

    fn parse_sample(slot: usize, entry: usize, item: &Value) -> Result<(String, f64), ValidationError> {
        let Value::Object(fields) = item else {
            return Err(ValidationError::InvalidShape {
                slot,
                field: "data",
                expected: "a list of {name, value} objects",
            });
        };

        let name = match fields.get("name") {
            None | Some(Value::Null) => {
                return Err(ValidationError::MissingField {
                    slot,
                    entry,
                    field: "name",
                })
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(ValidationError::MissingField {
                    slot,
                    entry,
                    field: "name",
                })
            }
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(ValidationError::InvalidShape {
                    slot,
                    field: "name",
                    expected: "a string",
                })
            }
        };

        let raw_value = match fields.get("value") {
            None | Some(Value::Null) => {
                return Err(ValidationError::MissingField {
                    slot,
                    entry,
                    field: "value",
                })
            }
            Some(v) => v,
        };

        let power_kw = value_as_f64(raw_value).ok_or_else(|| ValidationError::InvalidValue {
            slot,
            entry,
            name: name.clone(),
            value: raw_value.to_string(),
        })?;

        Ok((name, power_kw))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
