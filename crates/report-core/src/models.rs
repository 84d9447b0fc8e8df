use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One load's power reading at one slot timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Start of the slot the reading belongs to (UTC).
    pub timestamp: DateTime<Utc>,
    /// Name of the load, e.g. `"Heat Pump"`.
    pub load_name: String,
    /// Power in kW. Negative values represent export (e.g. solar production).
    pub power_kw: f64,
}

/// All samples recorded at one timestamp, at most one per load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Start of the slot (UTC).
    pub timestamp: DateTime<Utc>,
    /// Samples in first-appearance order of their load names.
    pub samples: Vec<Sample>,
}

impl Slot {
    /// The power reported for `load_name`, if the load appears in this slot.
    pub fn power_of(&self, load_name: &str) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.load_name == load_name)
            .map(|s| s.power_kw)
    }

    /// Sum of all sample powers in the slot.
    pub fn total_power_kw(&self) -> f64 {
        self.samples.iter().map(|s| s.power_kw).sum()
    }
}

/// Whether a window draws power from, or feeds power into, the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Power above the activity threshold.
    Import,
    /// Power below the negated activity threshold.
    Export,
}

/// A maximal run of consecutive active slots for one load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub load_name: String,
    pub kind: WindowKind,
    /// Timestamp of the first active slot (inclusive).
    pub start: DateTime<Utc>,
    /// Last active slot plus one slot duration (exclusive).
    pub end: DateTime<Utc>,
    /// Energy over the window at full precision (kWh).
    pub energy_kwh: f64,
    /// Number of slots merged into the window.
    pub slot_count: usize,
}

impl Window {
    /// Length of the half-open `[start, end)` interval.
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Length of the window in minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.duration().num_seconds() as f64 / 60.0
    }
}

/// Windows and energy for one load across the whole day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub load_name: String,
    /// Import windows ordered by start time.
    pub windows: Vec<Window>,
    /// Export windows ordered by start time.
    #[serde(default)]
    pub export_windows: Vec<Window>,
    /// Energy over every slot of the zero-filled series (kWh).
    pub total_energy_kwh: f64,
    /// Distinct power values reported for the load, ascending (kW).
    #[serde(default)]
    pub power_levels_kw: Vec<f64>,
}

impl LoadSummary {
    /// Energy covered by import and export windows together.
    pub fn windowed_energy_kwh(&self) -> f64 {
        self.windows
            .iter()
            .chain(self.export_windows.iter())
            .map(|w| w.energy_kwh)
            .sum()
    }
}

/// Cost figures exactly as supplied by the caller.
///
/// Each figure is independently optional. A missing figure stays `None` and is
/// never replaced by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    pub total_cost: Option<f64>,
    pub total_load_cost: Option<f64>,
    pub total_solar_revenue: Option<f64>,
    /// ISO 4217 code, uppercased.
    pub currency: String,
}

impl CostTotals {
    /// Load cost minus solar revenue, when both are known.
    pub fn net_cost(&self) -> Option<f64> {
        Some(self.total_load_cost? - self.total_solar_revenue?)
    }
}

/// Whole-day figures across all loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatistics {
    /// Sum of every load's energy (kWh).
    pub total_energy_kwh: f64,
    /// Highest aggregate power over all slots (kW).
    pub peak_power_kw: f64,
    /// Every slot whose aggregate power equals the peak.
    pub peak_times: Vec<DateTime<Utc>>,
    /// Energy per local hour of day in Wh, 24 buckets.
    pub hourly_profile_wh: Vec<f64>,
}

/// The structured summary handed to the text-generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    /// Local calendar date of the first slot.
    pub day_date: NaiveDate,
    /// Timezone used for local dates and times.
    pub timezone: Tz,
    /// Slot duration the energies were computed with.
    pub slot_hours: f64,
    /// One entry per observed load, in first-appearance order.
    pub loads: Vec<LoadSummary>,
    /// Present only when the caller supplied a cost block.
    pub cost_totals: Option<CostTotals>,
    pub statistics: DayStatistics,
}

impl ReportData {
    /// Look up a load summary by name.
    pub fn load(&self, load_name: &str) -> Option<&LoadSummary> {
        self.loads.iter().find(|l| l.load_name == load_name)
    }

    /// Total number of import windows across all loads.
    pub fn window_count(&self) -> usize {
        self.loads.iter().map(|l| l.windows.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, 0).unwrap()
    }

    fn window(kind: WindowKind, start: DateTime<Utc>, end: DateTime<Utc>, e: f64) -> Window {
        Window {
            load_name: "Boiler".to_string(),
            kind,
            start,
            end,
            energy_kwh: e,
            slot_count: 1,
        }
    }

    #[test]
    fn test_slot_power_lookup() {
        let slot = Slot {
            timestamp: ts(5, 0),
            samples: vec![
                Sample {
                    timestamp: ts(5, 0),
                    load_name: "Boiler".to_string(),
                    power_kw: 2.0,
                },
                Sample {
                    timestamp: ts(5, 0),
                    load_name: "PV".to_string(),
                    power_kw: -1.5,
                },
            ],
        };
        assert_eq!(slot.power_of("Boiler"), Some(2.0));
        assert_eq!(slot.power_of("EV"), None);
        assert!((slot.total_power_kw() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_window_duration() {
        let w = window(WindowKind::Import, ts(5, 0), ts(8, 0), 3.0);
        assert_eq!(w.duration(), TimeDelta::hours(3));
        assert!((w.duration_minutes() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_summary_windowed_energy_includes_export() {
        let summary = LoadSummary {
            load_name: "Boiler".to_string(),
            windows: vec![window(WindowKind::Import, ts(5, 0), ts(5, 15), 0.5)],
            export_windows: vec![window(WindowKind::Export, ts(12, 0), ts(12, 15), -0.25)],
            total_energy_kwh: 0.25,
            power_levels_kw: vec![-1.0, 0.0, 2.0],
        };
        assert!((summary.windowed_energy_kwh() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_net_cost_requires_both_figures() {
        let mut costs = CostTotals {
            total_cost: Some(3.2),
            total_load_cost: Some(4.0),
            total_solar_revenue: Some(0.8),
            currency: "EUR".to_string(),
        };
        assert!((costs.net_cost().unwrap() - 3.2).abs() < 1e-12);

        costs.total_solar_revenue = None;
        assert!(costs.net_cost().is_none());
    }

    #[test]
    fn test_window_kind_serializes_lowercase() {
        let json = serde_json::to_string(&WindowKind::Export).unwrap();
        assert_eq!(json, "\"export\"");
    }
}
