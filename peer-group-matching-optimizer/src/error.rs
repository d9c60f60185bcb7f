use peer_group_matching_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("malformed clock time {0:?}, expected HH:MM")]
    Malformed(String),
    #[error("{0} minutes is outside of a day")]
    OutOfRange(u16),
    #[error("time slot {start}-{end} ends before it starts")]
    NegativeDuration { start: String, end: String },
}

/// Precondition violations. Learners that simply can't be placed are not errors,
/// they end up in [`crate::model::UnmatchedParticipant`].
#[derive(Error, Debug)]
pub enum MatchingError {
    #[error("time error: {0}")]
    Time(#[from] TimeError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0} must be greater than zero")]
    ZeroMinutes(&'static str),
    #[error("availability window {start}-{end} is empty")]
    EmptyWindow { start: String, end: String },
    #[error("max group size {0} is outside of 1..=4")]
    GroupSize(usize),
    #[error("{caps} combination caps configured but groups may have up to {max_group_size} learners")]
    CombinationCaps { caps: usize, max_group_size: usize },
    #[error("combination cap for groups of {0} is zero")]
    ZeroCombinationCap(usize),
    #[error("learner {0} requested help more than once")]
    DuplicateLearner(String),
    #[error("peer {0} is listed more than once")]
    DuplicatePeer(String),
    #[error("schedule for {0} is listed more than once")]
    DuplicateSchedule(String),
}
