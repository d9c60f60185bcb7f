use peer_group_matching_config::{get_config, MatchingConfig};

use crate::error::MatchingError;
use crate::time::{ClockTime, DEFAULT_WINDOW_END, DEFAULT_WINDOW_START};

/// Validated form of [`MatchingConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    window_start: ClockTime,
    window_end: ClockTime,
    session_duration_minutes: u16,
    slot_step_minutes: u16,
    buffer_minutes: u16,
    max_group_size: usize,
    default_peer_capacity: u32,
    combination_caps: Vec<usize>,
}

pub const LARGEST_GROUP: usize = 4;

impl Settings {
    /// Loads `pgm.toml` and `PGM_*` environment variables on top of the defaults.
    pub fn load() -> Result<Self, MatchingError> {
        Self::try_from(&get_config()?)
    }

    #[must_use]
    pub const fn window_start(&self) -> ClockTime {
        self.window_start
    }

    #[must_use]
    pub const fn window_end(&self) -> ClockTime {
        self.window_end
    }

    #[must_use]
    pub const fn session_duration_minutes(&self) -> u16 {
        self.session_duration_minutes
    }

    #[must_use]
    pub const fn slot_step_minutes(&self) -> u16 {
        self.slot_step_minutes
    }

    #[must_use]
    pub const fn buffer_minutes(&self) -> u16 {
        self.buffer_minutes
    }

    #[must_use]
    pub const fn max_group_size(&self) -> usize {
        self.max_group_size
    }

    #[must_use]
    pub const fn default_peer_capacity(&self) -> u32 {
        self.default_peer_capacity
    }

    /// How many learner subsets of `size` are tried before giving up on that size.
    #[must_use]
    pub fn combination_cap(&self, size: usize) -> usize {
        size.checked_sub(1)
            .and_then(|index| self.combination_caps.get(index))
            .copied()
            .unwrap_or(0)
    }
}

impl TryFrom<&MatchingConfig> for Settings {
    type Error = MatchingError;

    fn try_from(config: &MatchingConfig) -> Result<Self, Self::Error> {
        let window_start = ClockTime::parse(&config.window_start)?;
        let window_end = ClockTime::parse(&config.window_end)?;
        if window_end <= window_start {
            return Err(MatchingError::EmptyWindow {
                start: config.window_start.clone(),
                end: config.window_end.clone(),
            });
        }
        if config.session_duration_minutes == 0 {
            return Err(MatchingError::ZeroMinutes("session duration"));
        }
        if config.slot_step_minutes == 0 {
            return Err(MatchingError::ZeroMinutes("slot step"));
        }
        if !(1..=LARGEST_GROUP).contains(&config.max_group_size) {
            return Err(MatchingError::GroupSize(config.max_group_size));
        }
        if config.combination_caps.len() < config.max_group_size {
            return Err(MatchingError::CombinationCaps {
                caps: config.combination_caps.len(),
                max_group_size: config.max_group_size,
            });
        }
        if let Some(index) = config.combination_caps[..config.max_group_size]
            .iter()
            .position(|cap| *cap == 0)
        {
            return Err(MatchingError::ZeroCombinationCap(index + 1));
        }
        Ok(Self {
            window_start,
            window_end,
            session_duration_minutes: config.session_duration_minutes,
            slot_step_minutes: config.slot_step_minutes,
            buffer_minutes: config.buffer_minutes,
            max_group_size: config.max_group_size,
            default_peer_capacity: config.default_peer_capacity,
            combination_caps: config.combination_caps.clone(),
        })
    }
}

impl TryFrom<MatchingConfig> for Settings {
    type Error = MatchingError;

    fn try_from(config: MatchingConfig) -> Result<Self, Self::Error> {
        Self::try_from(&config)
    }
}

impl Default for Settings {
    fn default() -> Self {
        let config = MatchingConfig::default();
        Self {
            window_start: DEFAULT_WINDOW_START,
            window_end: DEFAULT_WINDOW_END,
            session_duration_minutes: config.session_duration_minutes,
            slot_step_minutes: config.slot_step_minutes,
            buffer_minutes: config.buffer_minutes,
            max_group_size: config.max_group_size,
            default_peer_capacity: config.default_peer_capacity,
            combination_caps: config.combination_caps,
        }
    }
}
