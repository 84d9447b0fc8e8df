mod bootstrap;

use std::path::Path;

use anyhow::{Context, Result};
use report_core::sanitize::sanitize_markdown;
use report_core::settings::Settings;
use report_data::analysis::analyze_file;
use report_data::facts::render_fact_sheet;
use report_data::view::ReportView;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("hems-report v{} starting", env!("CARGO_PKG_VERSION"));

    let output = run(&settings)?;
    println!("{output}");
    Ok(())
}

/// Produce the text the binary prints for `settings`.
fn run(settings: &Settings) -> Result<String> {
    if let Some(path) = &settings.sanitize {
        return sanitize_file(path);
    }

    let schedule = settings
        .schedule
        .as_deref()
        .context("a schedule file is required")?;
    let config = settings.engine_config()?;
    let options = settings.display_options()?;

    tracing::debug!(
        "Config: slot_hours={}, infer={}, threshold={} kW, tz={}, format={}",
        config.slot_hours,
        config.infer_slot_hours,
        config.activity_threshold_kw,
        config.timezone,
        settings.format
    );

    let report = analyze_file(schedule, &config)
        .with_context(|| format!("failed to analyze {}", schedule.display()))?;

    let output = match settings.format.as_str() {
        "view" => serde_json::to_string_pretty(&ReportView::from_report(&report, &options))?,
        "facts" => render_fact_sheet(&ReportView::from_report(&report, &options)),
        _ => serde_json::to_string_pretty(&report)?,
    };
    Ok(output)
}

fn sanitize_file(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(sanitize_markdown(&text))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
