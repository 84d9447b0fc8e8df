//! End-to-end report pipeline.

use std::path::Path;

use report_core::error::Result;
use report_core::models::ReportData;
use report_core::settings::EngineConfig;
use report_core::time_utils::TimezoneHandler;
use tracing::info;

use crate::assembler::ReportAssembler;
use crate::costs::CostSummarizer;
use crate::parser::SlotParser;
use crate::reader::{read_payload, SchedulePayload};
use crate::statistics::day_statistics;
use crate::windows::WindowDeriver;

/// Turn one day's schedule payload into [`ReportData`].
///
/// Runs validation, window derivation, cost pass-through, day statistics and
/// assembly in that order. Any malformed input stops the pipeline with a
/// validation error; nothing is partially reported.
pub fn analyze_schedule(payload: &SchedulePayload, config: &EngineConfig) -> Result<ReportData> {
    config.validate()?;
    let handler = TimezoneHandler::new(config.timezone);

    let schedule = SlotParser::new(handler).parse(&payload.schedule)?;
    let deriver = WindowDeriver::from_config(config, &schedule)?;
    let loads = deriver.summarize(&schedule)?;
    let cost_totals =
        CostSummarizer::new(config.default_currency.as_str()).summarize(payload.cost_analysis.as_ref())?;
    let statistics = day_statistics(&schedule, &loads, deriver.slot_hours(), &handler);

    let report = ReportAssembler::new(handler, deriver.slot_hours()).assemble(
        &schedule,
        loads,
        cost_totals,
        statistics,
    );

    info!(
        "Analyzed schedule for {}: {} loads, {} slots, {} windows",
        report.day_date,
        report.loads.len(),
        schedule.slots().len(),
        report.window_count()
    );
    Ok(report)
}

/// Read a payload file and analyze it.
pub fn analyze_file(path: &Path, config: &EngineConfig) -> Result<ReportData> {
    let payload = read_payload(path)?;
    analyze_schedule(&payload, config)
}
