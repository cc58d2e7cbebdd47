//! Global timing/distance settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before the first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before the first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub gesture: GestureSettings,
    pub longpress: LongpressSettings,
    pub double_press: DoublePressSettings,
    pub selection: SelectionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureSettings {
    /// User flick sensitivity; thresholds are divided by it.
    pub flick_sensitivity: f64,
    pub all_flick_suggest_delay_ms: u64,
    pub suggest_dismiss_delay_ms: u64,
    pub simple_key_cancel_distance: f64,
    pub simple_key_tap_max_distance: f64,
}

impl GestureSettings {
    pub fn all_flick_suggest_delay(&self) -> Duration {
        Duration::from_millis(self.all_flick_suggest_delay_ms)
    }

    pub fn suggest_dismiss_delay(&self) -> Duration {
        Duration::from_millis(self.suggest_dismiss_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongpressSettings {
    pub light_ms: u64,
    pub normal_ms: u64,
    pub repeat_interval_ms: u64,
}

impl LongpressSettings {
    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoublePressSettings {
    /// Longest touch that still counts as a press.
    pub max_press_ms: u64,
    /// Longest pause between the first release and the second touch.
    pub max_gap_ms: u64,
}

impl DoublePressSettings {
    pub fn max_press(&self) -> Duration {
        Duration::from_millis(self.max_press_ms)
    }

    pub fn max_gap(&self) -> Duration {
        Duration::from_millis(self.max_gap_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSettings {
    pub search_limit: usize,
    pub default_limit: usize,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

/// Serialize settings back to TOML (used by `kbdtool settings export`).
pub fn to_toml_string(s: &Settings) -> Result<String, SettingsError> {
    toml::to_string_pretty(s).map_err(|e| SettingsError::Parse(e.to_string()))
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive_f64 {
        ($section:ident . $field:ident) => {
            if s.$section.$field <= 0.0 || !s.$section.$field.is_finite() {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be a positive finite number".to_string(),
                });
            }
        };
    }
    macro_rules! check_positive_ms {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive_f64!(gesture.flick_sensitivity);
    check_positive_f64!(gesture.simple_key_cancel_distance);
    check_positive_f64!(gesture.simple_key_tap_max_distance);
    check_positive_ms!(gesture.all_flick_suggest_delay_ms);
    check_positive_ms!(gesture.suggest_dismiss_delay_ms);

    check_positive_ms!(longpress.light_ms);
    check_positive_ms!(longpress.normal_ms);
    check_positive_ms!(longpress.repeat_interval_ms);
    if s.longpress.light_ms > s.longpress.normal_ms {
        return Err(SettingsError::InvalidValue {
            field: "longpress.light_ms".to_string(),
            reason: "must not exceed longpress.normal_ms".to_string(),
        });
    }

    check_positive_ms!(double_press.max_press_ms);
    check_positive_ms!(double_press.max_gap_ms);

    if s.selection.search_limit > s.selection.default_limit {
        return Err(SettingsError::InvalidValue {
            field: "selection.search_limit".to_string(),
            reason: "must not exceed selection.default_limit".to_string(),
        });
    }

    Ok(())
}
