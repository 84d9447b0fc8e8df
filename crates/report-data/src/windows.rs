//! Activity window derivation.
//!
//! Scans each load's zero-filled series once with an explicit two-state
//! machine (`Idle` / `Active`) and emits a [`Window`] for every maximal run of
//! active slots in slot order. Slots that follow each other in the schedule
//! are consecutive even when wall-clock time between them is longer than one
//! slot. A window's `end` is its last active slot plus one slot duration,
//! clamped to the next slot's timestamp when slots are spaced closer than
//! that.

use chrono::{DateTime, TimeDelta, Utc};
use report_core::error::{ReportError, Result};
use report_core::models::{LoadSummary, Window, WindowKind};
use report_core::settings::EngineConfig;
use report_core::time_utils::{delta_to_hours, hours_to_delta};
use tracing::{debug, warn};

use crate::parser::ParsedSchedule;

// ── Scan state ────────────────────────────────────────────────────────────────

/// A window that has been opened but not yet closed.
#[derive(Debug, Clone)]
struct OpenWindow {
    kind: WindowKind,
    start: DateTime<Utc>,
    last: DateTime<Utc>,
    slot_count: usize,
    energy_kwh: f64,
}

#[derive(Debug, Clone)]
enum ScanState {
    Idle,
    Active(OpenWindow),
}

// ── WindowDeriver ─────────────────────────────────────────────────────────────

/// Merges consecutive active slots into windows and integrates energy.
#[derive(Debug, Clone, Copy)]
pub struct WindowDeriver {
    slot_hours: f64,
    slot_duration: TimeDelta,
    threshold_kw: f64,
}

impl WindowDeriver {
    /// Create a deriver for slots of `slot_hours` hours.
    ///
    /// Fails with a configuration error when the slot duration is not a
    /// positive finite number of at most one day, or the threshold is
    /// negative.
    pub fn new(slot_hours: f64, threshold_kw: f64) -> Result<Self> {
        if !slot_hours.is_finite() || slot_hours <= 0.0 {
            return Err(ReportError::Config(format!(
                "slot_hours must be a positive number, got {slot_hours}"
            )));
        }
        if slot_hours > EngineConfig::MAX_SLOT_HOURS {
            return Err(ReportError::Config(format!(
                "slot_hours must be at most {} hours, got {slot_hours}",
                EngineConfig::MAX_SLOT_HOURS
            )));
        }
        let slot_duration = hours_to_delta(slot_hours);
        if slot_duration <= TimeDelta::zero() {
            return Err(ReportError::Config(format!(
                "slot_hours {slot_hours} is shorter than one millisecond"
            )));
        }
        if !threshold_kw.is_finite() || threshold_kw < 0.0 {
            return Err(ReportError::Config(format!(
                "activity threshold must be a non-negative number, got {threshold_kw}"
            )));
        }
        Ok(Self {
            slot_hours,
            slot_duration,
            threshold_kw,
        })
    }

    /// Create a deriver from the engine configuration.
    ///
    /// With `infer_slot_hours` set, the slot duration comes from the first two
    /// timestamps of `schedule`, falling back to the configured value.
    pub fn from_config(config: &EngineConfig, schedule: &ParsedSchedule) -> Result<Self> {
        let slot_hours = if config.infer_slot_hours {
            infer_slot_hours(&schedule.timestamps()).unwrap_or(config.slot_hours)
        } else {
            config.slot_hours
        };
        Self::new(slot_hours, config.activity_threshold_kw)
    }

    pub fn slot_hours(&self) -> f64 {
        self.slot_hours
    }

    /// Which kind of window, if any, a slot at `power_kw` belongs to.
    pub fn classify(&self, power_kw: f64) -> Option<WindowKind> {
        if power_kw > self.threshold_kw {
            Some(WindowKind::Import)
        } else if power_kw < -self.threshold_kw {
            Some(WindowKind::Export)
        } else {
            None
        }
    }

    /// Energy of one slot at `power_kw`.
    pub fn slot_energy_kwh(&self, power_kw: f64) -> f64 {
        power_kw * self.slot_hours
    }

    /// Derive all windows of one load, ordered by start.
    ///
    /// `series` must be in strictly increasing timestamp order. A window
    /// closes on the first inactive slot or on a change between import and
    /// export. Fails when a window end falls outside the representable
    /// date range.
    pub fn derive_windows(
        &self,
        load_name: &str,
        series: &[(DateTime<Utc>, f64)],
    ) -> Result<Vec<Window>> {
        let mut windows = Vec::new();
        let mut state = ScanState::Idle;

        for &(timestamp, power_kw) in series {
            let kind = self.classify(power_kw);
            state = match (state, kind) {
                (ScanState::Idle, None) => ScanState::Idle,
                (ScanState::Idle, Some(kind)) => {
                    ScanState::Active(self.open(kind, timestamp, power_kw))
                }
                (ScanState::Active(open), None) => {
                    windows.push(self.close(load_name, open, Some(timestamp))?);
                    ScanState::Idle
                }
                (ScanState::Active(mut open), Some(kind)) if kind == open.kind => {
                    open.last = timestamp;
                    open.slot_count += 1;
                    open.energy_kwh += self.slot_energy_kwh(power_kw);
                    ScanState::Active(open)
                }
                (ScanState::Active(open), Some(kind)) => {
                    windows.push(self.close(load_name, open, Some(timestamp))?);
                    ScanState::Active(self.open(kind, timestamp, power_kw))
                }
            };
        }

        if let ScanState::Active(open) = state {
            windows.push(self.close(load_name, open, None)?);
        }

        Ok(windows)
    }

    /// Build a [`LoadSummary`] for every load in `schedule`, in its order.
    pub fn summarize(&self, schedule: &ParsedSchedule) -> Result<Vec<LoadSummary>> {
        let gaps = schedule
            .timestamps()
            .windows(2)
            .filter(|pair| self.is_gap(pair[0], pair[1]))
            .count();
        if gaps > 0 {
            warn!(
                "Schedule has {} gap(s) longer than one slot ({} min); windows merge across them",
                gaps,
                self.slot_duration.num_minutes()
            );
        }

        let summaries = schedule
            .loads()
            .iter()
            .map(|load_name| self.summarize_load(schedule, load_name))
            .collect::<Result<Vec<LoadSummary>>>()?;

        debug!(
            "WindowDeriver: {} loads, {} import windows, {} export windows",
            summaries.len(),
            summaries.iter().map(|s| s.windows.len()).sum::<usize>(),
            summaries.iter().map(|s| s.export_windows.len()).sum::<usize>()
        );
        Ok(summaries)
    }

    fn summarize_load(&self, schedule: &ParsedSchedule, load_name: &str) -> Result<LoadSummary> {
        let series = schedule.series(load_name);

        let total_energy_kwh = series
            .iter()
            .map(|&(_, power_kw)| self.slot_energy_kwh(power_kw))
            .sum();

        let (windows, export_windows): (Vec<Window>, Vec<Window>) = self
            .derive_windows(load_name, &series)?
            .into_iter()
            .partition(|w| w.kind == WindowKind::Import);

        let mut power_levels_kw: Vec<f64> = schedule
            .slots()
            .iter()
            .filter_map(|slot| slot.power_of(load_name))
            .collect();
        power_levels_kw.sort_by(f64::total_cmp);
        power_levels_kw.dedup();

        Ok(LoadSummary {
            load_name: load_name.to_string(),
            windows,
            export_windows,
            total_energy_kwh,
            power_levels_kw,
        })
    }

    // ── State-machine helpers ─────────────────────────────────────────────────

    fn open(&self, kind: WindowKind, timestamp: DateTime<Utc>, power_kw: f64) -> OpenWindow {
        OpenWindow {
            kind,
            start: timestamp,
            last: timestamp,
            slot_count: 1,
            energy_kwh: self.slot_energy_kwh(power_kw),
        }
    }

    /// Close `open`, ending one slot after its last active slot or at `next`,
    /// whichever comes first.
    fn close(
        &self,
        load_name: &str,
        open: OpenWindow,
        next: Option<DateTime<Utc>>,
    ) -> Result<Window> {
        let nominal_end = open
            .last
            .checked_add_signed(self.slot_duration)
            .ok_or_else(|| {
                ReportError::Config(format!(
                    "window of {load_name} starting {} ends beyond the supported date range",
                    open.start
                ))
            })?;
        let end = match next {
            Some(next) => nominal_end.min(next),
            None => nominal_end,
        };
        Ok(Window {
            load_name: load_name.to_string(),
            kind: open.kind,
            start: open.start,
            end,
            energy_kwh: open.energy_kwh,
            slot_count: open.slot_count,
        })
    }

    /// `true` when `next` is more than one slot duration after `last`.
    fn is_gap(&self, last: DateTime<Utc>, next: DateTime<Utc>) -> bool {
        next - last > self.slot_duration
    }
}

/// Infer the slot duration from the first two timestamps, in hours.
///
/// Returns `None` with fewer than two timestamps or a non-positive spacing.
pub fn infer_slot_hours(timestamps: &[DateTime<Utc>]) -> Option<f64> {
    let [first, second, ..] = timestamps else {
        return None;
    };
    let delta = *second - *first;
    (delta > TimeDelta::zero()).then(|| delta_to_hours(delta))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn deriver() -> WindowDeriver {
        WindowDeriver::new(0.25, 0.0).unwrap()
    }

    /// A quarter-hour series starting at `h:00`.
    fn series(h: u32, powers: &[f64]) -> Vec<(DateTime<Utc>, f64)> {
        powers
            .iter()
            .enumerate()
            .map(|(i, &p)| (ts(h, 0) + TimeDelta::minutes(15 * i as i64), p))
            .collect()
    }

    #[test]
    fn test_new_rejects_bad_slot_hours() {
        for hours in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-12, 24.5, 1e12] {
            let err = WindowDeriver::new(hours, 0.0).unwrap_err();
            assert!(matches!(err, ReportError::Config(_)), "accepted {hours}");
        }
        assert!(WindowDeriver::new(0.25, -0.5).is_err());
    }

    #[test]
    fn test_two_consecutive_slots_form_one_window() {
        let windows = deriver().derive_windows("Greenhouse Heating", &series(5, &[1.8, 1.8])).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, ts(5, 0));
        assert_eq!(windows[0].end, ts(5, 30));
        assert_eq!(windows[0].slot_count, 2);
        assert!((windows[0].energy_kwh - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_slot_splits_windows() {
        let windows = deriver().derive_windows("Boiler", &series(5, &[2.0, 0.0, 2.0])).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start, windows[0].end), (ts(5, 0), ts(5, 15)));
        assert_eq!((windows[1].start, windows[1].end), (ts(5, 30), ts(5, 45)));
        for w in &windows {
            assert!((w.energy_kwh - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_end_is_last_active_slot_plus_one() {
        // Twelve quarter-hours from 05:00 cover 05:00–08:00.
        let windows = deriver().derive_windows("Boiler", &series(5, &[3.0; 12])).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end, ts(8, 0));
        assert_eq!(windows[0].duration(), TimeDelta::hours(3));
    }

    #[test]
    fn test_single_isolated_slot() {
        let windows = deriver().derive_windows("EV", &series(10, &[0.0, 7.4, 0.0])).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].duration(), TimeDelta::minutes(15));
        assert_eq!(windows[0].start, ts(10, 15));
    }

    #[test]
    fn test_active_all_day_single_window() {
        let windows = deriver().derive_windows("Fridge", &series(0, &[0.1; 96])).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, ts(0, 0));
        assert_eq!(windows[0].end, Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
        assert_eq!(windows[0].slot_count, 96);
    }

    #[test]
    fn test_zero_power_no_windows() {
        assert!(deriver()
            .derive_windows("Idle", &series(0, &[0.0; 8]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        let d = WindowDeriver::new(0.25, 0.5).unwrap();
        let windows = d.derive_windows("Pump", &series(5, &[0.5, 0.6, 0.4])).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, ts(5, 15));
        assert_eq!(windows[0].end, ts(5, 30));
    }

    #[test]
    fn test_negative_power_forms_export_window() {
        let windows = deriver().derive_windows("PV", &series(12, &[-1.0, -2.0, 0.0])).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].kind, WindowKind::Export);
        assert!((windows[0].energy_kwh + 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_sign_change_closes_window() {
        let windows = deriver().derive_windows("Battery", &series(12, &[2.0, 2.0, -1.0])).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].kind, WindowKind::Import);
        assert_eq!(windows[0].end, ts(12, 30));
        assert_eq!(windows[1].kind, WindowKind::Export);
        assert_eq!(windows[1].start, ts(12, 30));
    }

    #[test]
    fn test_gap_in_timestamps_merges_in_slot_order() {
        // 05:15 is missing from the input.
        let input = vec![(ts(5, 0), 2.0), (ts(5, 30), 2.0), (ts(5, 45), 2.0)];
        let windows = deriver().derive_windows("Boiler", &input).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].end), (ts(5, 0), ts(6, 0)));
        assert_eq!(windows[0].slot_count, 3);
        assert!((windows[0].energy_kwh - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_slot_after_gap_still_splits() {
        let input = vec![(ts(5, 0), 2.0), (ts(6, 0), 0.0), (ts(7, 0), 2.0)];
        let windows = deriver().derive_windows("Boiler", &input).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].end, ts(5, 15));
        assert_eq!(windows[1].start, ts(7, 0));
    }

    #[test]
    fn test_window_end_out_of_range_is_error() {
        let last = DateTime::<Utc>::MAX_UTC - TimeDelta::minutes(5);
        let err = deriver().derive_windows("Boiler", &[(last, 2.0)]).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_end_clamped_to_next_slot_when_spacing_is_shorter() {
        // One-hour slots configured but samples every 15 minutes.
        let d = WindowDeriver::new(1.0, 0.0).unwrap();
        let windows = d.derive_windows("Boiler", &series(5, &[2.0, 0.0, 2.0])).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].end, ts(5, 15));
        assert!(windows[0].end < windows[1].start);
    }

    #[test]
    fn test_window_energy_sums_match_series() {
        let powers = [1.1, 2.2, 0.0, 3.3, 0.7, 0.0, 0.0, 5.5];
        let d = deriver();
        let windows = d.derive_windows("Mixed", &series(0, &powers)).unwrap();
        let window_sum: f64 = windows.iter().map(|w| w.energy_kwh).sum();
        let series_sum: f64 = powers.iter().map(|p| p * 0.25).sum();
        assert!((window_sum - series_sum).abs() < 1e-9);
    }

    #[test]
    fn test_infer_slot_hours() {
        assert_eq!(infer_slot_hours(&[ts(5, 0), ts(5, 15)]), Some(0.25));
        assert_eq!(infer_slot_hours(&[ts(5, 0), ts(6, 0), ts(6, 15)]), Some(1.0));
        assert_eq!(infer_slot_hours(&[ts(5, 0)]), None);
        assert_eq!(infer_slot_hours(&[]), None);
    }
}
