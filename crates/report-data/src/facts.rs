//! Plain-text fact sheet handed to the text-generation step.

use std::fmt;

use report_core::formatting::{join_list, Locale};

use crate::view::{LoadView, ReportView};

struct FactLabels {
    day: &'static str,
    loads: &'static str,
    windows: &'static str,
    energy: &'static str,
    none: &'static str,
    total_energy: &'static str,
    peak: &'static str,
    at: &'static str,
    costs: &'static str,
    no_costs: &'static str,
    profile: &'static str,
    power_separator: &'static str,
}

impl FactLabels {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Pt => Self {
                day: "Dia",
                loads: "Cargas",
                windows: "janela_otima",
                energy: "energia_total_kWh",
                none: "nenhuma",
                total_energy: "Energia total do dia",
                peak: "Pico de potência",
                at: "às",
                costs: "Custos do dia",
                no_costs: "(Não há dados de custos para este dia.)",
                profile: "Perfil horário (CSV)",
                power_separator: "; ",
            },
            Locale::En => Self {
                day: "Day",
                loads: "Loads",
                windows: "windows",
                energy: "energy_kWh",
                none: "none",
                total_energy: "Total energy for the day",
                peak: "Peak power",
                at: "at",
                costs: "Costs for the day",
                no_costs: "(No cost data for this day.)",
                profile: "Hourly profile (CSV)",
                power_separator: ", ",
            },
        }
    }
}

/// Render `view` as the fact block.
///
/// Idle loads are listed with no window. The costs section appears only when
/// the view carries cost lines.
pub fn render_fact_sheet(view: &ReportView) -> String {
    let mut out = String::new();
    write_fact_sheet(&mut out, view).expect("writing to a String cannot fail");
    out
}

/// Write the fact block for `view` into `out`.
pub fn write_fact_sheet<W: fmt::Write>(out: &mut W, view: &ReportView) -> fmt::Result {
    let labels = FactLabels::for_locale(view.locale);

    writeln!(out, "{}: {} ({})", labels.day, view.day_date, view.timezone)?;
    writeln!(out, "{}:", labels.loads)?;
    for load in &view.loads {
        writeln!(out, "{}", load_line(load, &labels))?;
    }

    writeln!(out, "{}: {} kWh", labels.total_energy, view.total_energy_kwh)?;
    if view.peak_times.is_empty() {
        writeln!(out, "{}: {} kW", labels.peak, view.peak_power_kw)?;
    } else {
        writeln!(
            out,
            "{}: {} kW {} {}",
            labels.peak,
            view.peak_power_kw,
            labels.at,
            join_list(&view.peak_times, view.locale)
        )?;
    }

    match view.costs.as_ref().filter(|c| !c.lines.is_empty()) {
        Some(costs) => {
            writeln!(out, "{}:", labels.costs)?;
            for line in &costs.lines {
                writeln!(out, "- {}: {}", line.label, line.value)?;
            }
        }
        None => writeln!(out, "{}", labels.no_costs)?,
    }

    writeln!(out, "{}:", labels.profile)?;
    writeln!(out, "{}", view.hourly_csv)
}

fn load_line(load: &LoadView, labels: &FactLabels) -> String {
    let windows = if load.windows.is_empty() {
        labels.none
    } else {
        load.windows_text.as_str()
    };
    format!(
        "- {} | {}={} | power_kW=[{}] | {}={}",
        load.name,
        labels.windows,
        windows,
        load.power_levels_kw.join(labels.power_separator),
        labels.energy,
        load.total_energy_kwh
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{CostLine, CostView, WindowView};

    fn view(locale: Locale, costs: Option<CostView>) -> ReportView {
        ReportView {
            locale,
            day_date: "2025-06-01".to_string(),
            timezone: "Europe/Lisbon".to_string(),
            loads: vec![
                LoadView {
                    name: "Greenhouse Heating".to_string(),
                    windows: vec![WindowView {
                        start: "05h00".to_string(),
                        end: "05h30".to_string(),
                        range: "05h00–05h30".to_string(),
                        duration: "30m".to_string(),
                        energy_kwh: "0,9".to_string(),
                    }],
                    windows_text: "05h00–05h30".to_string(),
                    power_levels_kw: vec!["0,0".to_string(), "1,8".to_string()],
                    total_energy_kwh: "0,9".to_string(),
                },
                LoadView {
                    name: "EV".to_string(),
                    windows: vec![],
                    windows_text: String::new(),
                    power_levels_kw: vec!["0,0".to_string()],
                    total_energy_kwh: "0,0".to_string(),
                },
            ],
            total_energy_kwh: "0,9".to_string(),
            peak_power_kw: "1,8".to_string(),
            peak_times: vec!["05h00".to_string(), "05h15".to_string()],
            costs,
            hourly_csv: "Hour,Power_W\n0,0.0".to_string(),
        }
    }

    #[test]
    fn test_load_lines() {
        let sheet = render_fact_sheet(&view(Locale::Pt, None));
        assert!(sheet.contains(
            "- Greenhouse Heating | janela_otima=05h00–05h30 | power_kW=[0,0; 1,8] | energia_total_kWh=0,9"
        ));
        assert!(sheet.contains("- EV | janela_otima=nenhuma | power_kW=[0,0] | energia_total_kWh=0,0"));
        assert!(sheet.contains("Pico de potência: 1,8 kW às 05h00 e 05h15"));
    }

    #[test]
    fn test_no_costs_section_without_cost_lines() {
        let sheet = render_fact_sheet(&view(Locale::Pt, None));
        assert!(!sheet.contains("Custos do dia"));
        assert!(sheet.contains("(Não há dados de custos para este dia.)"));
    }

    #[test]
    fn test_cost_lines_rendered() {
        let costs = CostView {
            currency: "EUR".to_string(),
            lines: vec![CostLine {
                label: "Total cost".to_string(),
                value: "3.20 EUR".to_string(),
            }],
        };
        let sheet = render_fact_sheet(&view(Locale::En, Some(costs)));
        assert!(sheet.contains("Costs for the day:\n- Total cost: 3.20 EUR\n"));
        assert!(!sheet.contains("No cost data"));
    }

    #[test]
    fn test_ends_with_csv() {
        let sheet = render_fact_sheet(&view(Locale::En, None));
        assert!(sheet.ends_with("Hourly profile (CSV):\nHour,Power_W\n0,0.0\n"));
        assert!(sheet.starts_with("Day: 2025-06-01 (Europe/Lisbon)\nLoads:\n"));
    }

    #[test]
    fn test_write_fact_sheet_matches_render() {
        let v = view(Locale::Pt, None);
        let mut out = String::new();
        write_fact_sheet(&mut out, &v).unwrap();
        assert_eq!(out, render_fact_sheet(&v));
    }
}
