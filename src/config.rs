/// Application configuration: persisted as TOML in the config directory.
///
/// Directory resolution:
///   $VOICE_ALERTS_CONFIG_DIR
///   else %APPDATA%\voice-alerts   (Windows)
///   else $HOME/voice-alerts
///
/// Every field has a default, so a partial (or missing) config.toml is fine.
/// Altitude bands, intervals and the heat threshold are tunable here; the
/// defaults are the values the alert rules were designed around.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// External TTS program. `None` command → announcements are only logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments placed before the utterance text.
    #[serde(default)]
    pub args:    Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// JSON-lines feed written by the in-game plugin.
    #[serde(default)]
    pub feed_path: PathBuf,

    #[serde(default = "default_interval_ms")]
    pub default_interval_ms: u64,

    /// Re-poll period while a part is overheating.
    #[serde(default = "default_heat_alarm_interval_ms")]
    pub heat_alarm_interval_ms: u64,

    #[serde(default = "default_heat_ratio_threshold")]
    pub heat_ratio_threshold: f64,

    /// Strictly ascending band thresholds, metres above terrain.
    #[serde(default = "default_altitude_bands_m")]
    pub altitude_bands_m: Vec<f64>,

    #[serde(default = "default_altitude_band_width_m")]
    pub altitude_band_width_m: f64,

    #[serde(default = "default_true")]
    pub announce_on_load: bool,

    #[serde(default)]
    pub speech: SpeechConfig,
}

fn default_interval_ms() -> u64 { 1_000 }
fn default_heat_alarm_interval_ms() -> u64 { 2_000 }
fn default_heat_ratio_threshold() -> f64 { 0.85 }
fn default_altitude_band_width_m() -> f64 { 2_000.0 }
fn default_true() -> bool { true }

fn default_altitude_bands_m() -> Vec<f64> {
    vec![
        2_000.0, 5_000.0, 10_000.0, 15_000.0, 20_000.0,
        30_000.0, 40_000.0, 50_000.0, 60_000.0,
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_path:              PathBuf::new(),
            default_interval_ms:    default_interval_ms(),
            heat_alarm_interval_ms: default_heat_alarm_interval_ms(),
            heat_ratio_threshold:   default_heat_ratio_threshold(),
            altitude_bands_m:       default_altitude_bands_m(),
            altitude_band_width_m:  default_altitude_band_width_m(),
            announce_on_load:       true,
            speech:                 SpeechConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_interval_ms == 0 || self.heat_alarm_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick intervals must be > 0".into()));
        }
        if !(self.heat_ratio_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "heat_ratio_threshold must be > 0 (got {})",
                self.heat_ratio_threshold
            )));
        }
        if !(self.altitude_band_width_m > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "altitude_band_width_m must be > 0 (got {})",
                self.altitude_band_width_m
            )));
        }
        if self.altitude_bands_m.iter().any(|&t| !(t > 0.0)) {
            return Err(ConfigError::Invalid("altitude bands must be positive".into()));
        }
        if self.altitude_bands_m.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Invalid("altitude bands must be strictly ascending".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

pub fn load_or_default(config_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = config_dir.join(CONFIG_FILE);
    if path.exists() {
        let raw = std::fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&raw)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(cfg)
    } else {
        tracing::info!("No config at {:?}, using defaults", path);
        Ok(AppConfig::default())
    }
}

pub fn save(config: &AppConfig, config_dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(config_dir)?;
    let raw = toml::to_string_pretty(config)?;
    std::fs::write(config_dir.join(CONFIG_FILE), raw)?;
    Ok(())
}

/// Where config.toml and logs/ live.
pub fn config_dir() -> PathBuf {
    resolve_config_dir(
        std::env::var_os("VOICE_ALERTS_CONFIG_DIR").map(PathBuf::from),
        std::env::var_os("APPDATA").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn resolve_config_dir(
    explicit: Option<PathBuf>,
    appdata:  Option<PathBuf>,
    home:     Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = explicit.filter(|d| !d.as_os_str().is_empty()) {
        return dir;
    }
    appdata
        .or(home)
        .unwrap_or_else(std::env::temp_dir)
        .join("voice-alerts")
}
