// these come from the ingestion adapter of the surrounding application
// emails are the join keys between requests, peers and schedules so they have to be unique

use alloc::collections::BTreeSet;
use core::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::time::{TimeSlot, Weekday};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerRequest {
    pub email: String,
    pub name: String,
    pub course_code: String,
    /// Free text, may be blank.
    pub instructor: String,
    pub instructor_match_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_number: Option<String>,
}

impl LearnerRequest {
    /// A blank instructor downgrades the requirement, whatever the flag says.
    #[must_use]
    pub fn effective_instructor_required(&self) -> bool {
        self.instructor_match_required && !self.instructor.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSlot {
    pub course_code: String,
    #[serde(default)]
    pub instructor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPeer {
    pub email: String,
    pub name: String,
    /// Maximum number of groups in one run. `None` falls back to the configured default.
    #[serde(default)]
    pub groups: Option<u32>,
    /// The (up to three) main courses of the peer.
    #[serde(default)]
    pub course_slots: Vec<CourseSlot>,
    #[serde(default)]
    pub other_courses: Vec<CourseSlot>,
}

impl LearningPeer {
    /// Main slots first, then the other courses.
    pub fn teaching_slots(&self) -> impl Iterator<Item = &CourseSlot> {
        self.course_slots
            .iter()
            .take(3)
            .chain(self.other_courses.iter())
    }
}

/// Fixed weekly commitments of a learner or a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSchedule {
    pub email: String,
    #[serde(default)]
    pub monday: Vec<TimeSlot>,
    #[serde(default)]
    pub tuesday: Vec<TimeSlot>,
    #[serde(default)]
    pub wednesday: Vec<TimeSlot>,
    #[serde(default)]
    pub thursday: Vec<TimeSlot>,
    #[serde(default)]
    pub friday: Vec<TimeSlot>,
}

impl ClassSchedule {
    #[must_use]
    pub fn empty(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            monday: Vec::new(),
            tuesday: Vec::new(),
            wednesday: Vec::new(),
            thursday: Vec::new(),
            friday: Vec::new(),
        }
    }

    #[must_use]
    pub fn day(&self, day: Weekday) -> &[TimeSlot] {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut Vec<TimeSlot> {
        match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
        }
    }
}

/// Snapshot the engine runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingInput {
    pub requests: Vec<LearnerRequest>,
    pub peers: Vec<LearningPeer>,
    pub learner_schedules: Vec<ClassSchedule>,
    pub peer_schedules: Vec<ClassSchedule>,
    /// Learners that already have a group, used for "new requests only" runs.
    #[serde(default)]
    pub excluded_learner_emails: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSlot {
    pub day: Weekday,
    #[serde(flatten)]
    pub slot: TimeSlot,
}

impl Display for MeetingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPeer {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLearner {
    pub id: String,
    pub name: String,
    pub email: String,
    /// The instructor the learner named in the request, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedGroup {
    pub course_code: String,
    pub instructor: String,
    pub peer: GroupPeer,
    pub learners: Vec<GroupLearner>,
    pub time_slot: MeetingSlot,
    pub status: GroupStatus,
}

impl ProposedGroup {
    /// Returns `false` if the group was already decided on.
    pub fn approve(&mut self) -> bool {
        self.decide(GroupStatus::Approved)
    }

    pub fn reject(&mut self) -> bool {
        self.decide(GroupStatus::Rejected)
    }

    fn decide(&mut self, status: GroupStatus) -> bool {
        if self.status != GroupStatus::Pending {
            return false;
        }
        self.status = status;
        true
    }
}

/// Why a learner did not get a group. The labels are shown verbatim to reviewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConstraintFailure {
    #[serde(rename = "Missing schedule")]
    MissingSchedule,
    #[serde(rename = "No eligible peers")]
    NoEligiblePeers,
    #[serde(rename = "Peer capacity exhausted")]
    PeerCapacityExhausted,
    #[serde(rename = "Schedule conflict")]
    ScheduleConflict,
}

impl ConstraintFailure {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MissingSchedule => "Missing schedule",
            Self::NoEligiblePeers => "No eligible peers",
            Self::PeerCapacityExhausted => "Peer capacity exhausted",
            Self::ScheduleConflict => "Schedule conflict",
        }
    }
}

impl Display for ConstraintFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedParticipant {
    pub id: String,
    pub name: String,
    pub email: String,
    pub course_code: String,
    pub constraint_failure: ConstraintFailure,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_learners: usize,
    pub total_peers: usize,
    pub matched_learners: usize,
    pub unmatched_learners: usize,
    pub proposed_groups: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingResult {
    pub groups: Vec<ProposedGroup>,
    pub unmatched: Vec<UnmatchedParticipant>,
}

impl MatchingResult {
    #[must_use]
    pub fn matched_learners(&self) -> usize {
        self.groups.iter().map(|group| group.learners.len()).sum()
    }

    #[must_use]
    pub fn summary(&self, total_peers: usize) -> RunSummary {
        let matched_learners = self.matched_learners();
        RunSummary {
            total_learners: matched_learners + self.unmatched.len(),
            total_peers,
            matched_learners,
            unmatched_learners: self.unmatched.len(),
            proposed_groups: self.groups.len(),
        }
    }

    /// Peers that did not receive a single group in this run, in input order.
    #[must_use]
    pub fn idle_peers<'a>(&self, peers: &'a [LearningPeer]) -> Vec<&'a LearningPeer> {
        let busy: BTreeSet<&str> = self
            .groups
            .iter()
            .map(|group| group.peer.email.as_str())
            .collect();
        peers
            .iter()
            .filter(|peer| !busy.contains(peer.email.as_str()))
            .collect()
    }
}
