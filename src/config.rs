use std::path::PathBuf;

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::constants::{level::DEFAULT_LEVELS_PATH, LOOP_TIME};

/// Runtime configuration for the headless runner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawConfig")]
pub struct Config {
    /// Level data source
    pub levels_path: PathBuf,
    /// RNG seed. `None` seeds from the operating system, so runs differ.
    pub seed: Option<u64>,
    /// Fixed simulation steps per second, at least 1
    pub tick_rate: u32,
    /// Stop after this many ticks even if the run has not ended
    pub max_ticks: Option<u64>,
    /// Sleep between ticks so the simulation runs at wall-clock speed
    pub realtime: bool,
    /// Default log filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Config {
    /// Length of one simulation step, in seconds.
    pub fn step_seconds(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }
}

impl Default for Config {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

/// Configuration exactly as read from the providers, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConfig {
    levels_path: PathBuf,
    seed: Option<u64>,
    tick_rate: u32,
    max_ticks: Option<u64>,
    realtime: bool,
    log_filter: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            levels_path: PathBuf::from(DEFAULT_LEVELS_PATH),
            seed: None,
            tick_rate: (1.0 / LOOP_TIME.as_secs_f64()).round() as u32,
            max_ticks: None,
            realtime: true,
            log_filter: "info".to_string(),
        }
    }
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let log_filter = match raw.log_filter.trim() {
            "" => "info".to_string(),
            filter => filter.to_string(),
        };

        Config {
            levels_path: raw.levels_path,
            seed: raw.seed,
            tick_rate: raw.tick_rate.max(1),
            max_ticks: raw.max_ticks,
            realtime: raw.realtime,
            log_filter,
        }
    }
}

/// The provider stack: built-in defaults, overridden by `BREATHE_*` environment variables.
pub fn figment() -> Figment {
    Figment::from(Serialized::defaults(RawConfig::default())).merge(Env::prefixed("BREATHE_"))
}

pub fn load_config() -> Result<Config, figment::Error> {
    figment().extract()
}
