use core::fmt::{Debug, Display};
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Default availability window in minutes since midnight.
pub const DEFAULT_WINDOW_START_MINUTES: u16 = 8 * 60;
pub const DEFAULT_WINDOW_END_MINUTES: u16 = 20 * 60;

fn clock(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Tunables of one matching run.
///
/// Times are kept as `"HH:MM"` strings here and validated by the optimizer when it
/// turns this bundle into its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub window_start: String,
    pub window_end: String,
    pub session_duration_minutes: u16,
    pub slot_step_minutes: u16,
    /// Travel time that has to lie between a session and any class, on both sides.
    pub buffer_minutes: u16,
    pub max_group_size: usize,
    /// Used for peers that did not declare how many groups they take.
    pub default_peer_capacity: u32,
    /// Upper bound of learner subsets tried per group size, index 0 is size 1.
    pub combination_caps: Vec<usize>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            window_start: clock(DEFAULT_WINDOW_START_MINUTES),
            window_end: clock(DEFAULT_WINDOW_END_MINUTES),
            session_duration_minutes: 60,
            slot_step_minutes: 30,
            buffer_minutes: 5,
            max_group_size: 4,
            default_peer_capacity: 2,
            combination_caps: vec![100, 100, 75, 50],
        }
    }
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

fn figment(file: &Path) -> Figment {
    Figment::from(Serialized::defaults(MatchingConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed("PGM_"))
}

pub fn get_config() -> Result<MatchingConfig, ConfigError> {
    get_config_from("pgm.toml")
}

/// Same as [`get_config`] but reads the given toml file instead of `pgm.toml`.
/// A missing file is not an error, the defaults apply.
pub fn get_config_from(file: impl AsRef<Path>) -> Result<MatchingConfig, ConfigError> {
    Ok(figment(file.as_ref()).extract()?)
}
