//! Display-ready rendering of [`ReportData`].
//!
//! Every figure is pre-formatted for the configured locale so the
//! text-generation step can template it directly.

use report_core::formatting::{
    format_duration, format_energy, format_local_clock, format_money, format_number, format_range,
    join_list, Locale,
};
use report_core::models::{CostTotals, LoadSummary, ReportData, Window};
use report_core::settings::DisplayOptions;
use report_core::time_utils::TimezoneHandler;
use serde::Serialize;

use crate::statistics::hourly_csv;

/// Decimal places kept for power levels before trailing zeros are trimmed.
const POWER_DECIMALS: u32 = 2;

// ── View types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub locale: Locale,
    /// ISO date, e.g. `2025-06-01`.
    pub day_date: String,
    pub timezone: String,
    pub loads: Vec<LoadView>,
    pub total_energy_kwh: String,
    pub peak_power_kw: String,
    /// Local `HHhMM` times at which the peak occurs.
    pub peak_times: Vec<String>,
    /// `None` when there is nothing to say about costs.
    pub costs: Option<CostView>,
    pub hourly_csv: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadView {
    pub name: String,
    pub windows: Vec<WindowView>,
    /// Window ranges joined as `a, b e c`. Empty for an idle load.
    pub windows_text: String,
    pub power_levels_kw: Vec<String>,
    pub total_energy_kwh: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowView {
    pub start: String,
    pub end: String,
    /// `HHhMM–HHhMM`.
    pub range: String,
    pub duration: String,
    pub energy_kwh: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostView {
    pub currency: String,
    pub lines: Vec<CostLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostLine {
    pub label: String,
    pub value: String,
}

// ── Rendering ─────────────────────────────────────────────────────────────────

impl ReportView {
    pub fn from_report(report: &ReportData, options: &DisplayOptions) -> Self {
        let handler = TimezoneHandler::new(report.timezone);
        let locale = options.locale;
        let decimals = options.energy_decimals;

        Self {
            locale,
            day_date: report.day_date.format("%Y-%m-%d").to_string(),
            timezone: report.timezone.name().to_string(),
            loads: report
                .loads
                .iter()
                .map(|load| LoadView::from_summary(load, &handler, options))
                .collect(),
            total_energy_kwh: format_energy(report.statistics.total_energy_kwh, decimals, locale),
            peak_power_kw: format_power(report.statistics.peak_power_kw, locale),
            peak_times: report
                .statistics
                .peak_times
                .iter()
                .map(|&t| format_local_clock(&handler, t))
                .collect(),
            costs: report
                .cost_totals
                .as_ref()
                .and_then(|costs| CostView::from_totals(costs, locale)),
            hourly_csv: hourly_csv(&report.statistics),
        }
    }
}

impl LoadView {
    fn from_summary(load: &LoadSummary, handler: &TimezoneHandler, options: &DisplayOptions) -> Self {
        let windows: Vec<WindowView> = load
            .windows
            .iter()
            .map(|w| WindowView::from_window(w, handler, options))
            .collect();
        let ranges: Vec<&str> = windows.iter().map(|w| w.range.as_str()).collect();

        Self {
            name: load.load_name.clone(),
            windows_text: join_list(&ranges, options.locale),
            windows,
            power_levels_kw: load
                .power_levels_kw
                .iter()
                .map(|&p| format_power(p, options.locale))
                .collect(),
            total_energy_kwh: format_energy(load.total_energy_kwh, options.energy_decimals, options.locale),
        }
    }
}

impl WindowView {
    fn from_window(window: &Window, handler: &TimezoneHandler, options: &DisplayOptions) -> Self {
        Self {
            start: format_local_clock(handler, window.start),
            end: format_local_clock(handler, window.end),
            range: format_range(handler, window.start, window.end),
            duration: format_duration(window.duration_minutes()),
            energy_kwh: format_energy(window.energy_kwh, options.energy_decimals, options.locale),
        }
    }
}

impl CostView {
    /// Build the cost lines that the supplied figures allow.
    ///
    /// With total, load cost and solar revenue all present the view lists all
    /// three plus the net cost. With only the total it lists the total. Without
    /// a total there is no cost view.
    fn from_totals(costs: &CostTotals, locale: Locale) -> Option<Self> {
        let total = costs.total_cost?;
        let labels = CostLabels::for_locale(locale);
        let money = |amount: f64| format_money(amount, &costs.currency, locale);
        let line = |label: &str, amount: f64| CostLine {
            label: label.to_string(),
            value: money(amount),
        };

        let mut lines = vec![line(labels.total, total)];
        if let (Some(load_cost), Some(solar), Some(net)) = (
            costs.total_load_cost,
            costs.total_solar_revenue,
            costs.net_cost(),
        ) {
            lines.push(line(labels.load, load_cost));
            lines.push(line(labels.solar, solar));
            lines.push(line(labels.net, net));
        }

        Some(Self {
            currency: costs.currency.clone(),
            lines,
        })
    }
}

struct CostLabels {
    total: &'static str,
    load: &'static str,
    solar: &'static str,
    net: &'static str,
}

impl CostLabels {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Pt => Self {
                total: "Custo total",
                load: "Custo dos consumos",
                solar: "Receita solar",
                net: "Custo líquido (consumos - receita solar)",
            },
            Locale::En => Self {
                total: "Total cost",
                load: "Load cost",
                solar: "Solar revenue",
                net: "Net cost (loads - solar revenue)",
            },
        }
    }
}

/// Format a power level, keeping at least one decimal and at most two.
fn format_power(kw: f64, locale: Locale) -> String {
    let mut text = format_number(kw, POWER_DECIMALS, locale);
    if text.ends_with('0') {
        text.pop();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use report_core::models::{DayStatistics, WindowKind};

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>, energy_kwh: f64) -> Window {
        Window {
            load_name: "Boiler".to_string(),
            kind: WindowKind::Import,
            start,
            end,
            energy_kwh,
            slot_count: 1,
        }
    }

    fn report(cost_totals: Option<CostTotals>) -> ReportData {
        ReportData {
            day_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            timezone: chrono_tz::Europe::Lisbon,
            slot_hours: 0.25,
            loads: vec![
                LoadSummary {
                    load_name: "Boiler".to_string(),
                    windows: vec![
                        window(ts(4, 0), ts(7, 0), 6.0),
                        window(ts(11, 0), ts(11, 45), 1.5),
                    ],
                    export_windows: vec![],
                    total_energy_kwh: 7.5,
                    power_levels_kw: vec![0.0, 2.0],
                },
                LoadSummary {
                    load_name: "EV".to_string(),
                    windows: vec![],
                    export_windows: vec![],
                    total_energy_kwh: 0.0,
                    power_levels_kw: vec![0.0],
                },
            ],
            cost_totals,
            statistics: DayStatistics {
                total_energy_kwh: 7.5,
                peak_power_kw: 2.0,
                peak_times: vec![ts(4, 0), ts(11, 0)],
                hourly_profile_wh: vec![0.0; 24],
            },
        }
    }

    fn costs(load: Option<f64>, solar: Option<f64>, total: Option<f64>) -> CostTotals {
        CostTotals {
            total_cost: total,
            total_load_cost: load,
            total_solar_revenue: solar,
            currency: "EUR".to_string(),
        }
    }

    #[test]
    fn test_window_text_is_local_and_joined() {
        let view = ReportView::from_report(&report(None), &DisplayOptions::default());
        let boiler = &view.loads[0];
        assert_eq!(boiler.windows_text, "05h00–08h00 e 12h00–12h45");
        assert_eq!(boiler.windows[0].duration, "3h");
        assert_eq!(boiler.windows[1].energy_kwh, "1,5");
        assert_eq!(boiler.total_energy_kwh, "7,5");
        assert_eq!(boiler.power_levels_kw, vec!["0,0", "2,0"]);
        assert_eq!(view.peak_times, vec!["05h00", "12h00"]);
        assert_eq!(view.timezone, "Europe/Lisbon");
        assert_eq!(view.day_date, "2025-06-01");
    }

    #[test]
    fn test_idle_load_still_listed() {
        let view = ReportView::from_report(&report(None), &DisplayOptions::default());
        assert_eq!(view.loads.len(), 2);
        assert!(view.loads[1].windows.is_empty());
        assert_eq!(view.loads[1].windows_text, "");
    }

    #[test]
    fn test_english_locale() {
        let options = DisplayOptions {
            locale: Locale::En,
            energy_decimals: 2,
        };
        let view = ReportView::from_report(&report(None), &options);
        assert_eq!(view.loads[0].windows_text, "05h00–08h00 and 12h00–12h45");
        assert_eq!(view.total_energy_kwh, "7.50");
    }

    #[test]
    fn test_no_cost_block_no_cost_view() {
        let view = ReportView::from_report(&report(None), &DisplayOptions::default());
        assert!(view.costs.is_none());
    }

    #[test]
    fn test_full_cost_lines() {
        let data = report(Some(costs(Some(4.0), Some(0.8), Some(3.2))));
        let view = ReportView::from_report(&data, &DisplayOptions::default());
        let lines = view.costs.unwrap().lines;
        let rendered: Vec<(String, String)> =
            lines.into_iter().map(|l| (l.label, l.value)).collect();
        assert_eq!(
            rendered,
            vec![
                ("Custo total".to_string(), "3,20 EUR".to_string()),
                ("Custo dos consumos".to_string(), "4,00 EUR".to_string()),
                ("Receita solar".to_string(), "0,80 EUR".to_string()),
                (
                    "Custo líquido (consumos - receita solar)".to_string(),
                    "3,20 EUR".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_total_only_cost_line() {
        let data = report(Some(costs(Some(4.0), None, Some(3.2))));
        let view = ReportView::from_report(&data, &DisplayOptions::default());
        let lines = view.costs.unwrap().lines;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].value, "3,20 EUR");
    }

    #[test]
    fn test_missing_total_means_no_cost_view() {
        let data = report(Some(costs(Some(4.0), Some(0.8), None)));
        let view = ReportView::from_report(&data, &DisplayOptions::default());
        assert!(view.costs.is_none());
    }

    #[test]
    fn test_format_power_trims_one_zero() {
        assert_eq!(format_power(1.8, Locale::Pt), "1,8");
        assert_eq!(format_power(7.45, Locale::En), "7.45");
        assert_eq!(format_power(2.0, Locale::En), "2.0");
    }

    #[test]
    fn test_view_serializes() {
        let view = ReportView::from_report(&report(None), &DisplayOptions::default());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["locale"], "pt");
        assert!(json["costs"].is_null());
        assert_eq!(json["loads"][0]["name"], "Boiler");
    }
}
