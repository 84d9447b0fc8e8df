//! Whole-day aggregate figures: total energy, peak power and the hourly
//! profile.

use report_core::models::{DayStatistics, LoadSummary};
use report_core::time_utils::TimezoneHandler;
use tracing::debug;

use crate::parser::ParsedSchedule;

/// Aggregates closer than this count as equal when locating the peak.
const PEAK_TOLERANCE_KW: f64 = 1e-9;

/// Compute [`DayStatistics`] from the zero-filled schedule.
///
/// Aggregate power per slot is the sum over all loads. Hourly buckets are
/// keyed by the local hour of each slot's start.
pub fn day_statistics(
    schedule: &ParsedSchedule,
    loads: &[LoadSummary],
    slot_hours: f64,
    handler: &TimezoneHandler,
) -> DayStatistics {
    let total_energy_kwh = loads.iter().map(|l| l.total_energy_kwh).sum();

    let aggregates: Vec<_> = schedule
        .slots()
        .iter()
        .map(|slot| (slot.timestamp, slot.total_power_kw()))
        .collect();

    let peak_power_kw = aggregates
        .iter()
        .map(|&(_, power)| power)
        .fold(f64::NEG_INFINITY, f64::max);
    let peak_times = aggregates
        .iter()
        .filter(|&&(_, power)| (power - peak_power_kw).abs() <= PEAK_TOLERANCE_KW)
        .map(|&(timestamp, _)| timestamp)
        .collect();

    let mut hourly_profile_wh = vec![0.0; 24];
    for &(timestamp, power) in &aggregates {
        let hour = handler.local_hour(timestamp) as usize;
        hourly_profile_wh[hour] += power * slot_hours * 1000.0;
    }

    debug!(
        "Day statistics: {:.3} kWh total, peak {:.3} kW",
        total_energy_kwh, peak_power_kw
    );

    DayStatistics {
        total_energy_kwh,
        peak_power_kw,
        peak_times,
        hourly_profile_wh,
    }
}

/// Render the hourly profile as `Hour,Power_W` CSV with one decimal.
pub fn hourly_csv(statistics: &DayStatistics) -> String {
    std::iter::once("Hour,Power_W".to_string())
        .chain(
            statistics
                .hourly_profile_wh
                .iter()
                .enumerate()
                .map(|(hour, wh)| format!("{hour},{wh:.1}")),
        )
        .collect::<Vec<_>>()
        .join("\n")
}
