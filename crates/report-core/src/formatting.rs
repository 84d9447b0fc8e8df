use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::TimezoneHandler;

// ── Locale ────────────────────────────────────────────────────────────────────

/// Display locale for numbers and list conjunctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// European Portuguese: `1 234,5`, lists joined with `e`.
    #[default]
    Pt,
    /// English: `1,234.5`, lists joined with `and`.
    En,
}

impl Locale {
    pub fn decimal_separator(self) -> char {
        match self {
            Self::Pt => ',',
            Self::En => '.',
        }
    }

    pub fn thousands_separator(self) -> char {
        match self {
            Self::Pt => ' ',
            Self::En => ',',
        }
    }

    /// Word joining the last two items of a list.
    pub fn conjunction(self) -> &'static str {
        match self {
            Self::Pt => "e",
            Self::En => "and",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt" | "pt-pt" | "pt_pt" => Ok(Self::Pt),
            "en" | "en-us" | "en-gb" | "en_us" | "en_gb" => Ok(Self::En),
            other => Err(format!("unsupported locale \"{other}\"")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pt => "pt",
            Self::En => "en",
        })
    }
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Format a floating-point number with the locale's thousands and decimal
/// separators and a fixed number of decimal places.
///
/// # Examples
///
/// ```
/// use report_core::formatting::{format_number, Locale};
///
/// assert_eq!(format_number(1234.5, 1, Locale::En), "1,234.5");
/// assert_eq!(format_number(1234.5, 1, Locale::Pt), "1 234,5");
/// assert_eq!(format_number(16.0, 1, Locale::Pt), "16,0");
/// assert_eq!(format_number(-9876.5, 1, Locale::En), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32, locale: Locale) -> String {
    if !value.is_finite() || decimals > MAX_EXACT_DECIMALS {
        return format_plain(value, decimals, locale);
    }
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact decimal midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let scaled = ((abs_value * factor) + epsilon).round();
    if scaled >= u64::MAX as f64 {
        return format_plain(value, decimals, locale);
    }

    // A value that rounds to zero never gets a sign.
    let negative = value < 0.0 && scaled > 0.0;

    let scaled = scaled as u64;
    let divisor = 10_u64.pow(decimals);
    let integer_part = scaled / divisor;
    let frac_part = scaled % divisor;

    let grouped = group_thousands(&integer_part.to_string(), locale.thousands_separator());

    let mut result = String::with_capacity(grouped.len() + decimals as usize + 2);
    if negative {
        result.push('-');
    }
    result.push_str(&grouped);
    if decimals > 0 {
        result.push(locale.decimal_separator());
        result.push_str(&format!("{:0width$}", frac_part, width = decimals as usize));
    }
    result
}

/// Format an energy figure in kWh, without the unit.
pub fn format_energy(kwh: f64, decimals: u32, locale: Locale) -> String {
    format_number(kwh, decimals, locale)
}

/// Format a monetary amount with two decimals followed by its currency code.
///
/// ```
/// use report_core::formatting::{format_money, Locale};
///
/// assert_eq!(format_money(3.2, "EUR", Locale::Pt), "3,20 EUR");
/// assert_eq!(format_money(-0.5, "EUR", Locale::En), "-0.50 EUR");
/// ```
pub fn format_money(amount: f64, currency: &str, locale: Locale) -> String {
    format!("{} {}", format_number(amount, 2, locale), currency)
}

// ── Times ─────────────────────────────────────────────────────────────────────

/// Format a wall-clock time as `HHhMM`, e.g. `05h00`.
pub fn format_clock(hour: u32, minute: u32) -> String {
    format!("{hour:02}h{minute:02}")
}

/// Format a local wall-clock time for a UTC instant.
pub fn format_local_clock(handler: &TimezoneHandler, dt: DateTime<Utc>) -> String {
    let (h, m) = handler.local_clock(dt);
    format_clock(h, m)
}

/// Format a half-open interval as `HHhMM–HHhMM` in local time.
pub fn format_range(handler: &TimezoneHandler, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "{}–{}",
        format_local_clock(handler, start),
        format_local_clock(handler, end)
    )
}

/// Format a duration in minutes as a human-readable string.
///
/// * `< 60` minutes → `"45m"`
/// * `≥ 60` minutes, no remainder → `"3h"`
/// * `≥ 60` minutes, with remainder → `"3h 45m"`
pub fn format_duration(minutes: f64) -> String {
    let total_mins = minutes.round() as i64;
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

// ── Lists ─────────────────────────────────────────────────────────────────────

/// Join items as `a, b e c` using the locale conjunction.
///
/// ```
/// use report_core::formatting::{join_list, Locale};
///
/// let items = ["05h00–06h00", "12h00–13h00", "20h00–21h00"];
/// assert_eq!(join_list(&items, Locale::Pt), "05h00–06h00, 12h00–13h00 e 20h00–21h00");
/// assert_eq!(join_list(&items[..2], Locale::En), "05h00–06h00 and 12h00–13h00");
/// ```
pub fn join_list<S: AsRef<str>>(items: &[S], locale: Locale) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [head @ .., last] => {
            let head: Vec<&str> = head.iter().map(AsRef::as_ref).collect();
            format!(
                "{} {} {}",
                head.join(", "),
                locale.conjunction(),
                last.as_ref()
            )
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Most decimal places [`format_number`] rounds through integer arithmetic.
const MAX_EXACT_DECIMALS: u32 = 15;

/// Standard float formatting with the locale decimal separator and no
/// grouping. Used for non-finite values and magnitudes beyond `u64`.
fn format_plain(value: f64, decimals: u32, locale: Locale) -> String {
    let separator = locale.decimal_separator().to_string();
    format!("{:.*}", decimals as usize, value).replace('.', &separator)
}

/// Insert `separator` every three digits from the right of an integer string.
fn group_thousands(s: &str, separator: char) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(separator);
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
