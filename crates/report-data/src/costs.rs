//! Cost pass-through.
//!
//! Validates the optional cost block and carries its figures into
//! [`CostTotals`] unchanged. Nothing here derives a figure the caller did not
//! supply.

use report_core::error::ValidationError;
use report_core::models::CostTotals;
use serde_json::Value;
use tracing::debug;

use crate::reader::{value_as_f64, RawCostAnalysis};

#[derive(Debug, Clone)]
pub struct CostSummarizer {
    default_currency: String,
}

impl CostSummarizer {
    pub fn new(default_currency: impl Into<String>) -> Self {
        Self {
            default_currency: default_currency.into(),
        }
    }

    /// Validate `raw` into [`CostTotals`].
    ///
    /// Returns `Ok(None)` when no cost block was supplied. A figure that is
    /// `null` or absent stays `None`; anything else must be a finite number.
    pub fn summarize(
        &self,
        raw: Option<&RawCostAnalysis>,
    ) -> Result<Option<CostTotals>, ValidationError> {
        let Some(raw) = raw else {
            debug!("CostSummarizer: no cost analysis supplied");
            return Ok(None);
        };

        let totals = CostTotals {
            total_cost: optional_figure("total_cost", &raw.total_cost)?,
            total_load_cost: optional_figure("total_load_cost", &raw.total_load_cost)?,
            total_solar_revenue: optional_figure("total_solar_revenue", &raw.total_solar_revenue)?,
            currency: self.currency(raw.currency.as_deref()),
        };
        debug!(
            "CostSummarizer: total={:?} load={:?} solar={:?} {}",
            totals.total_cost, totals.total_load_cost, totals.total_solar_revenue, totals.currency
        );
        Ok(Some(totals))
    }

    fn currency(&self, supplied: Option<&str>) -> String {
        supplied
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.default_currency)
            .trim()
            .to_uppercase()
    }
}

fn optional_figure(field: &'static str, value: &Value) -> Result<Option<f64>, ValidationError> {
    if value.is_null() {
        return Ok(None);
    }
    value_as_f64(value)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidCost {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawCostAnalysis {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_absent_block_is_none() {
        let summarizer = CostSummarizer::new("EUR");
        assert_eq!(summarizer.summarize(None), Ok(None));
    }

    #[test]
    fn test_figures_pass_through_unchanged() {
        let block = raw(json!({
            "total_cost": 3.2,
            "total_load_cost": 4.0,
            "total_solar_revenue": 0.8,
            "currency": "eur"
        }));
        let totals = CostSummarizer::new("EUR")
            .summarize(Some(&block))
            .unwrap()
            .unwrap();
        assert_eq!(totals.total_cost, Some(3.2));
        assert_eq!(totals.total_load_cost, Some(4.0));
        assert_eq!(totals.total_solar_revenue, Some(0.8));
        assert_eq!(totals.currency, "EUR");
    }

    #[test]
    fn test_missing_figures_stay_none() {
        let block = raw(json!({"total_cost": 1.5}));
        let totals = CostSummarizer::new("EUR")
            .summarize(Some(&block))
            .unwrap()
            .unwrap();
        assert_eq!(totals.total_cost, Some(1.5));
        assert_eq!(totals.total_load_cost, None);
        assert_eq!(totals.total_solar_revenue, None);
    }

    #[test]
    fn test_currency_defaults_when_blank() {
        let summarizer = CostSummarizer::new("gbp");
        for block in [json!({}), json!({"currency": "  "})] {
            let totals = summarizer.summarize(Some(&raw(block))).unwrap().unwrap();
            assert_eq!(totals.currency, "GBP");
        }
        let totals = summarizer
            .summarize(Some(&raw(json!({"currency": " usd "}))))
            .unwrap()
            .unwrap();
        assert_eq!(totals.currency, "USD");
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let block = raw(json!({"total_cost": "2.75"}));
        let totals = CostSummarizer::new("EUR")
            .summarize(Some(&block))
            .unwrap()
            .unwrap();
        assert_eq!(totals.total_cost, Some(2.75));
    }

    #[test]
    fn test_invalid_figure_names_field() {
        let block = raw(json!({"total_cost": 1.0, "total_load_cost": "lots"}));
        let err = CostSummarizer::new("EUR")
            .summarize(Some(&block))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCost {
                field: "total_load_cost",
                value: "\"lots\"".to_string(),
            }
        );
    }
}
