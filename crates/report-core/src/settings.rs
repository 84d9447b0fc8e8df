use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use chrono_tz::Tz;
use clap::{CommandFactory, FromArgMatches, Parser};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ReportError, Result};
use crate::formatting::Locale;
use crate::time_utils::{hours_to_delta, resolve_timezone};

// ── EngineConfig ───────────────────────────────────────────────────────────────

/// Process-wide knobs consumed by the report engine.
///
/// Read-only once validated; every pipeline stage borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Width of one schedule slot in hours.
    pub slot_hours: f64,
    /// Derive the slot width from the first two timestamps instead.
    pub infer_slot_hours: bool,
    /// A load is active when its power is strictly above this value (kW).
    pub activity_threshold_kw: f64,
    /// Currency used when the cost block does not name one.
    pub default_currency: String,
    /// Timezone for naive timestamps and local display.
    pub timezone: Tz,
}

impl EngineConfig {
    pub const DEFAULT_SLOT_HOURS: f64 = 0.25;
    pub const DEFAULT_CURRENCY: &'static str = "EUR";
    /// Longest slot the engine accepts: one day.
    pub const MAX_SLOT_HOURS: f64 = 24.0;

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.slot_hours.is_finite() || self.slot_hours <= 0.0 {
            return Err(ReportError::Config(format!(
                "slot_hours must be a positive number, got {}",
                self.slot_hours
            )));
        }
        if self.slot_hours > Self::MAX_SLOT_HOURS {
            return Err(ReportError::Config(format!(
                "slot_hours must be at most {} hours, got {}",
                Self::MAX_SLOT_HOURS,
                self.slot_hours
            )));
        }
        if self.slot_duration() <= TimeDelta::zero() {
            return Err(ReportError::Config(format!(
                "slot_hours {} is shorter than one millisecond",
                self.slot_hours
            )));
        }
        if !self.activity_threshold_kw.is_finite() || self.activity_threshold_kw < 0.0 {
            return Err(ReportError::Config(format!(
                "activity_threshold_kw must be a non-negative number, got {}",
                self.activity_threshold_kw
            )));
        }
        if self.default_currency.trim().is_empty() {
            return Err(ReportError::Config(
                "default_currency must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured slot width as a [`TimeDelta`].
    pub fn slot_duration(&self) -> TimeDelta {
        hours_to_delta(self.slot_hours)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_hours: Self::DEFAULT_SLOT_HOURS,
            infer_slot_hours: false,
            activity_threshold_kw: 0.0,
            default_currency: Self::DEFAULT_CURRENCY.to_string(),
            timezone: Tz::UTC,
        }
    }
}

// ── DisplayOptions ─────────────────────────────────────────────────────────────

/// How report figures are rendered for templating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub locale: Locale,
    /// Decimal places for energy figures.
    pub energy_decimals: u32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            locale: Locale::Pt,
            energy_decimals: 1,
        }
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Summarise a day of HEMS load schedules into report data
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hems-report",
    about = "Summarise a day of HEMS load schedules into report data",
    version
)]
pub struct Settings {
    /// Path to the optimised schedule JSON
    #[arg(required_unless_present = "sanitize")]
    pub schedule: Option<PathBuf>,

    /// Slot duration in hours
    #[arg(long, default_value = "0.25")]
    pub slot_hours: f64,

    /// Infer the slot duration from the first two timestamps
    #[arg(long)]
    pub infer_slot_hours: bool,

    /// Activity threshold in kW (a load is active strictly above it)
    #[arg(long, default_value = "0.0")]
    pub threshold_kw: f64,

    /// Currency used when the cost block does not name one
    #[arg(long, default_value = "EUR")]
    pub currency: String,

    /// Timezone for naive timestamps and local times (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Display locale
    #[arg(long, default_value = "pt", value_parser = ["pt", "en"])]
    pub locale: String,

    /// Decimal places for energy figures (0-6)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(0..=6))]
    pub energy_decimals: u32,

    /// Output format
    #[arg(long, default_value = "json", value_parser = ["json", "view", "facts"])]
    pub format: String,

    /// Strip markdown from a generated text file and print the result
    #[arg(long)]
    pub sanitize: Option<PathBuf>,

    /// JSON configuration file with default overrides
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Optional defaults read from a JSON file.
///
/// Values only apply to settings that were not given on the command line.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infer_slot_hours: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_threshold_kw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_decimals: Option<u32>,
}

impl ConfigFile {
    /// Default location: `<config dir>/hems-report/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hems-report").join("config.json"))
    }

    /// Load a config file from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ReportError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ReportError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    /// Load the config file at the default location.
    ///
    /// A missing file yields the empty default. An unreadable or malformed
    /// file is logged and ignored, since the user did not ask for it.
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("Ignoring default config file: {}", e);
            Self::default()
        })
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and merge the config file.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    ///
    /// An explicit `--config` path must exist and parse. Without one, the
    /// default location is consulted if present.
    pub fn load_from_args(args: Vec<OsString>) -> Result<Self> {
        let matches = Settings::command().get_matches_from(args);
        let settings = Settings::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

        let file = match &settings.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load_default(),
        };

        Ok(Self::merge(settings, &matches, file))
    }

    /// Apply config-file values to every setting not set on the command line.
    fn merge(mut settings: Settings, matches: &clap::ArgMatches, file: ConfigFile) -> Settings {
        // clap stores the arg id using the field name, not the long flag.
        if !is_arg_explicitly_set(matches, "slot_hours") {
            if let Some(v) = file.slot_hours {
                settings.slot_hours = v;
            }
        }
        if !is_arg_explicitly_set(matches, "infer_slot_hours") {
            if let Some(v) = file.infer_slot_hours {
                settings.infer_slot_hours = v;
            }
        }
        if !is_arg_explicitly_set(matches, "threshold_kw") {
            if let Some(v) = file.activity_threshold_kw {
                settings.threshold_kw = v;
            }
        }
        if !is_arg_explicitly_set(matches, "currency") {
            if let Some(v) = file.default_currency {
                settings.currency = v;
            }
        }
        if !is_arg_explicitly_set(matches, "timezone") {
            if let Some(v) = file.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(matches, "locale") {
            if let Some(v) = file.locale {
                settings.locale = v;
            }
        }
        if !is_arg_explicitly_set(matches, "energy_decimals") {
            if let Some(v) = file.energy_decimals {
                settings.energy_decimals = v;
            }
        }

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Build and validate the engine configuration.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let config = EngineConfig {
            slot_hours: self.slot_hours,
            infer_slot_hours: self.infer_slot_hours,
            activity_threshold_kw: self.threshold_kw,
            default_currency: self.currency.trim().to_uppercase(),
            timezone: resolve_timezone(&self.timezone)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the display options.
    pub fn display_options(&self) -> Result<DisplayOptions> {
        let locale = self.locale.parse::<Locale>().map_err(ReportError::Config)?;
        if self.energy_decimals > 6 {
            return Err(ReportError::Config(format!(
                "energy_decimals must be at most 6, got {}",
                self.energy_decimals
            )));
        }
        Ok(DisplayOptions {
            locale,
            energy_decimals: self.energy_decimals,
        })
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
