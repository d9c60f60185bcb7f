use core::fmt::{self, Debug, Display};

use peer_group_matching_config::{DEFAULT_WINDOW_END_MINUTES, DEFAULT_WINDOW_START_MINUTES};
use serde::{Deserialize, Serialize};

use crate::error::TimeError;
use crate::model::ClassSchedule;
use crate::settings::Settings;

const MINUTES_PER_DAY: u16 = 24 * 60;

pub(crate) const DEFAULT_WINDOW_START: ClockTime = ClockTime(DEFAULT_WINDOW_START_MINUTES);
pub(crate) const DEFAULT_WINDOW_END: ClockTime = ClockTime(DEFAULT_WINDOW_END_MINUTES);

/// Minutes since midnight, always within a single day.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const fn from_minutes(minutes: u16) -> Result<Self, TimeError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(TimeError::OutOfRange(minutes));
        }
        Ok(Self(minutes))
    }

    /// Accepts exactly `HH:MM` on a 24 hour clock.
    pub fn parse(time: &str) -> Result<Self, TimeError> {
        let malformed = || TimeError::Malformed(time.to_owned());
        let (hours, minutes) = time.split_once(':').ok_or_else(malformed)?;
        let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if hours.len() != 2
            || minutes.len() != 2
            || !all_digits(hours)
            || !all_digits(minutes)
        {
            return Err(malformed());
        }
        let hours: u16 = hours.parse().map_err(|_| malformed())?;
        let minutes: u16 = minutes.parse().map_err(|_| malformed())?;
        if hours >= 24 || minutes >= 60 {
            return Err(malformed());
        }
        Ok(Self(hours * 60 + minutes))
    }

    #[must_use]
    pub const fn minutes(self) -> u16 {
        self.0
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

pub fn to_minutes(time: &str) -> Result<u16, TimeError> {
    ClockTime::parse(time).map(ClockTime::minutes)
}

pub fn to_time(minutes: u16) -> Result<String, TimeError> {
    ClockTime::from_minutes(minutes).map(|time| time.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Self; 5] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
    ];
}

impl Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
        })
    }
}

#[derive(Deserialize)]
struct RawTimeSlot {
    start: ClockTime,
    end: ClockTime,
}

/// Half-open interval `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSlot")]
pub struct TimeSlot {
    start: ClockTime,
    end: ClockTime,
}

impl TryFrom<RawTimeSlot> for TimeSlot {
    type Error = TimeError;

    fn try_from(value: RawTimeSlot) -> Result<Self, Self::Error> {
        Self::new(value.start, value.end)
    }
}

impl TimeSlot {
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self, TimeError> {
        if end < start {
            return Err(TimeError::NegativeDuration {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, TimeError> {
        Self::new(ClockTime::parse(start)?, ClockTime::parse(end)?)
    }

    #[must_use]
    pub const fn start(self) -> ClockTime {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> ClockTime {
        self.end
    }
}

impl Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[must_use]
pub fn overlaps(a: TimeSlot, b: TimeSlot) -> bool {
    a.start < b.end && b.start < a.end
}

/// Whether `candidate`, widened by `buffer_minutes` on both ends, touches any busy interval.
#[must_use]
pub fn conflicts(candidate: TimeSlot, busy: &[TimeSlot], buffer_minutes: u16) -> bool {
    let start = candidate.start.minutes().saturating_sub(buffer_minutes);
    let end = candidate.end.minutes().saturating_add(buffer_minutes);
    busy.iter()
        .any(|class| start < class.end.minutes() && class.start.minutes() < end)
}

/// Every slot of `duration_minutes` starting at a multiple of `step_minutes` after
/// `window_start` that ends no later than `window_end`.
#[must_use]
pub fn candidate_slots(
    window_start: ClockTime,
    window_end: ClockTime,
    duration_minutes: u16,
    step_minutes: u16,
) -> Vec<TimeSlot> {
    if duration_minutes == 0 || step_minutes == 0 {
        return Vec::new();
    }
    let mut slots = Vec::new();
    let mut start = window_start.minutes();
    while let Some(end) = start.checked_add(duration_minutes) {
        if end > window_end.minutes() {
            break;
        }
        // both ends lie inside the window, so they are valid clock times
        slots.push(TimeSlot {
            start: ClockTime(start),
            end: ClockTime(end),
        });
        let Some(next) = start.checked_add(step_minutes) else {
            break;
        };
        start = next;
    }
    slots
}

/// Candidate slots of `day` that conflict with none of the given schedules.
#[must_use]
pub fn available_slots(
    schedules: &[&ClassSchedule],
    day: Weekday,
    settings: &Settings,
) -> Vec<TimeSlot> {
    candidate_slots(
        settings.window_start(),
        settings.window_end(),
        settings.session_duration_minutes(),
        settings.slot_step_minutes(),
    )
    .into_iter()
    .filter(|slot| {
        !schedules
            .iter()
            .any(|schedule| conflicts(*slot, schedule.day(day), settings.buffer_minutes()))
    })
    .collect()
}
