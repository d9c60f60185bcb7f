//! Matching engine that puts learners and learning peers into small weekly study groups.
//!
//! [`run_matching`] takes an immutable [`MatchingInput`] snapshot and returns the
//! proposed groups together with every learner that could not be placed.

extern crate alloc;

pub mod availability;
pub mod combinations;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod instructor;
pub mod model;
pub mod settings;
pub mod time;

pub use engine::run_matching;
pub use error::{MatchingError, TimeError};
pub use model::{MatchingInput, MatchingResult};
pub use settings::Settings;
