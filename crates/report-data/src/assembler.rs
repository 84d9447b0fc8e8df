//! Final assembly of [`ReportData`].

use std::collections::HashSet;

use report_core::models::{CostTotals, DayStatistics, LoadSummary, ReportData, Window};
use report_core::time_utils::TimezoneHandler;
use tracing::debug;

use crate::parser::ParsedSchedule;

#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler {
    handler: TimezoneHandler,
    slot_hours: f64,
}

impl ReportAssembler {
    pub fn new(handler: TimezoneHandler, slot_hours: f64) -> Self {
        Self {
            handler,
            slot_hours,
        }
    }

    /// Combine the pipeline outputs into [`ReportData`].
    ///
    /// `loads` must already be in first-appearance order with one entry per
    /// observed load.
    pub fn assemble(
        &self,
        schedule: &ParsedSchedule,
        loads: Vec<LoadSummary>,
        cost_totals: Option<CostTotals>,
        statistics: DayStatistics,
    ) -> ReportData {
        debug_assert!(
            has_unique_names(&loads),
            "load summaries must be unique per load"
        );
        debug_assert!(
            loads.iter().all(|l| verify_windows(&l.windows).is_ok()
                && verify_windows(&l.export_windows).is_ok()),
            "windows must be ordered and non-adjacent"
        );

        let day_date = self.handler.local_date(schedule.first_timestamp());
        debug!(
            "Assembled report for {} ({} loads, costs: {})",
            day_date,
            loads.len(),
            cost_totals.is_some()
        );

        ReportData {
            day_date,
            timezone: self.handler.tz(),
            slot_hours: self.slot_hours,
            loads,
            cost_totals,
            statistics,
        }
    }
}

/// Check that `windows` are ordered by start, each non-empty, and separated
/// from the next by at least one instant.
pub fn verify_windows(windows: &[Window]) -> Result<(), String> {
    if let Some(w) = windows.iter().find(|w| w.start >= w.end) {
        return Err(format!(
            "window of {} starting {} does not end after it starts",
            w.load_name, w.start
        ));
    }
    for pair in windows.windows(2) {
        if pair[0].end >= pair[1].start {
            return Err(format!(
                "windows of {} overlap or touch: {} ends {}, next starts {}",
                pair[0].load_name, pair[0].start, pair[0].end, pair[1].start
            ));
        }
    }
    Ok(())
}

fn has_unique_names(loads: &[LoadSummary]) -> bool {
    let mut seen = HashSet::new();
    loads.iter().all(|l| seen.insert(l.load_name.as_str()))
}
