use alloc::collections::BTreeSet;

use crate::instructor::names_match;
use crate::model::{CourseSlot, LearningPeer};
use crate::time::Weekday;

fn slot_teaches(slot: &CourseSlot, course_code: &str, instructor: &str) -> bool {
    if slot.course_code.trim() != course_code.trim() {
        return false;
    }
    instructor.trim().is_empty()
        || (!slot.instructor.trim().is_empty() && names_match(&slot.instructor, instructor))
}

/// Whether the peer is qualified for the course, and for the instructor unless that is
/// blank.
#[must_use]
pub fn can_teach(peer: &LearningPeer, course_code: &str, instructor: &str) -> bool {
    peer.teaching_slots()
        .any(|slot| slot_teaches(slot, course_code, instructor))
}

/// The instructor under which the peer teaches the course, blank if unknown.
#[must_use]
pub fn teaching_instructor<'a>(peer: &'a LearningPeer, course_code: &str) -> &'a str {
    peer.teaching_slots()
        .find(|slot| slot.course_code.trim() == course_code.trim())
        .map_or("", |slot| slot.instructor.as_str())
}

#[must_use]
pub fn capacity(peer: &LearningPeer, default_capacity: u32) -> u32 {
    peer.groups.unwrap_or(default_capacity)
}

#[must_use]
pub fn has_capacity(peer: &LearningPeer, assigned_this_run: u32, default_capacity: u32) -> bool {
    assigned_this_run < capacity(peer, default_capacity)
}

/// Bookkeeping for one peer during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerState {
    pub assigned: u32,
    pub days_used: BTreeSet<Weekday>,
}

impl PeerState {
    pub fn assign(&mut self, day: Weekday) {
        self.assigned += 1;
        self.days_used.insert(day);
    }
}
