use alloc::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::{debug, info, trace, warn};

use crate::availability::best_slot;
use crate::combinations::candidate_groups;
use crate::eligibility::{can_teach, capacity, has_capacity, teaching_instructor, PeerState};
use crate::error::MatchingError;
use crate::instructor::{normalize, reconcile};
use crate::model::{
    ClassSchedule, ConstraintFailure, GroupLearner, GroupPeer, GroupStatus, LearnerRequest,
    LearningPeer, MatchingInput, MatchingResult, ProposedGroup, UnmatchedParticipant,
};
use crate::settings::Settings;

/// Instructor-bound partitions sort first so specialised peers are used for them before
/// flexible demand gets to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Requirement {
    Instructor,
    Any,
}

impl Requirement {
    fn of(learner: &LearnerRequest) -> Self {
        if learner.effective_instructor_required() {
            Self::Instructor
        } else {
            Self::Any
        }
    }
}

fn index_schedules<'a>(
    schedules: &'a [ClassSchedule],
) -> Result<BTreeMap<&'a str, &'a ClassSchedule>, MatchingError> {
    let mut index = BTreeMap::new();
    for schedule in schedules {
        if index.insert(schedule.email.as_str(), schedule).is_some() {
            return Err(MatchingError::DuplicateSchedule(schedule.email.clone()));
        }
    }
    Ok(index)
}

fn ensure_unique<'a>(
    emails: impl IntoIterator<Item = &'a str>,
    error: impl Fn(String) -> MatchingError,
) -> Result<(), MatchingError> {
    let mut seen = BTreeSet::new();
    for email in emails {
        if !seen.insert(email) {
            return Err(error(email.to_owned()));
        }
    }
    Ok(())
}

fn describe(peer: &LearningPeer) -> String {
    format!("{} <{}>", peer.name, peer.email)
}

fn describe_all<'p>(peers: impl IntoIterator<Item = &'p LearningPeer>) -> String {
    peers.into_iter().map(describe).join(", ")
}

/// Bookkeeping of one run, dropped when the run returns.
struct Run<'a> {
    settings: &'a Settings,
    peers: &'a [LearningPeer],
    learner_schedules: BTreeMap<&'a str, &'a ClassSchedule>,
    peer_schedules: BTreeMap<&'a str, &'a ClassSchedule>,
    peer_states: BTreeMap<&'a str, PeerState>,
    matched: BTreeSet<&'a str>,
    recorded: BTreeSet<&'a str>,
    result: MatchingResult,
}

impl<'a> Run<'a> {
    fn assigned(&self, peer: &LearningPeer) -> u32 {
        self.peer_states
            .get(peer.email.as_str())
            .map_or(0, |state| state.assigned)
    }

    fn peer_has_capacity(&self, peer: &LearningPeer) -> bool {
        has_capacity(peer, self.assigned(peer), self.settings.default_peer_capacity())
    }

    fn is_open(&self, learner: &LearnerRequest) -> bool {
        let email = learner.email.as_str();
        !self.matched.contains(email) && !self.recorded.contains(email)
    }

    fn record(&mut self, learner: &'a LearnerRequest, failure: ConstraintFailure, detail: String) {
        debug!(learner = %learner.email, %failure, %detail, "learner stays unmatched");
        self.recorded.insert(learner.email.as_str());
        self.result.unmatched.push(UnmatchedParticipant {
            id: learner.email.clone(),
            name: learner.name.clone(),
            email: learner.email.clone(),
            course_code: learner.course_code.clone(),
            constraint_failure: failure,
            detail,
        });
    }

    fn record_all(
        &mut self,
        learners: &[&'a LearnerRequest],
        failure: ConstraintFailure,
        detail: &str,
    ) {
        for learner in learners.iter().copied() {
            self.record(learner, failure, detail.to_owned());
        }
    }

    /// Builds a group if the peer and every learner share a conflict-free slot.
    fn try_form_group(
        &self,
        learners: &[&'a LearnerRequest],
        peer: &'a LearningPeer,
        course_code: &str,
        instructor: &str,
    ) -> Option<ProposedGroup> {
        let mut schedules = Vec::with_capacity(learners.len() + 1);
        schedules.push(*self.peer_schedules.get(peer.email.as_str())?);
        for learner in learners {
            schedules.push(*self.learner_schedules.get(learner.email.as_str())?);
        }

        let no_days = BTreeSet::new();
        let days_used = self
            .peer_states
            .get(peer.email.as_str())
            .map_or(&no_days, |state| &state.days_used);
        let Some(time_slot) = best_slot(&schedules, days_used, self.settings) else {
            trace!(
                peer = %peer.email,
                learners = %learners.iter().map(|learner| &learner.email).join(", "),
                "no common slot"
            );
            return None;
        };

        Some(ProposedGroup {
            course_code: course_code.to_owned(),
            instructor: instructor.to_owned(),
            peer: GroupPeer {
                id: peer.email.clone(),
                name: peer.name.clone(),
                email: peer.email.clone(),
            },
            learners: learners
                .iter()
                .map(|learner| GroupLearner {
                    id: learner.email.clone(),
                    name: learner.name.clone(),
                    email: learner.email.clone(),
                    instructor: Some(learner.instructor.trim())
                        .filter(|instructor| !instructor.is_empty())
                        .map(ToOwned::to_owned),
                })
                .collect(),
            time_slot,
            status: GroupStatus::Pending,
        })
    }

    fn commit(&mut self, group: ProposedGroup, peer: &'a LearningPeer, learners: &[&'a LearnerRequest]) {
        debug!(
            peer = %peer.email,
            course = %group.course_code,
            slot = %group.time_slot,
            size = group.learners.len(),
            "formed group"
        );
        self.peer_states
            .entry(peer.email.as_str())
            .or_default()
            .assign(group.time_slot.day);
        self.matched
            .extend(learners.iter().map(|learner| learner.email.as_str()));
        self.result.groups.push(group);
    }

    /// Matches `own` learners, optionally filling groups up with the rest of `pool`.
    /// Only `own` learners are reported as unmatched here.
    fn match_partition(
        &mut self,
        course_code: &str,
        required_instructor: Option<&str>,
        own: &[&'a LearnerRequest],
        pool: &[&'a LearnerRequest],
    ) {
        let own_open: Vec<&LearnerRequest> = own
            .iter()
            .copied()
            .filter(|learner| self.is_open(learner))
            .collect();
        if own_open.is_empty() {
            return;
        }
        let requested = required_instructor.unwrap_or("");
        debug!(
            course = course_code,
            instructor = requested,
            learners = own_open.len(),
            pool = pool.len(),
            "matching partition"
        );

        let peers = self.peers;
        let settings = self.settings;
        let eligible: Vec<&'a LearningPeer> = peers
            .iter()
            .filter(|peer| can_teach(peer, course_code, requested))
            .collect();
        if eligible.is_empty() {
            let detail = match required_instructor {
                Some(instructor) => {
                    format!("no peer teaches {course_code} for instructor {instructor}")
                }
                None => format!("no peer teaches {course_code}"),
            };
            self.record_all(&own_open, ConstraintFailure::NoEligiblePeers, &detail);
            return;
        }

        let (available, full): (Vec<&LearningPeer>, Vec<&LearningPeer>) = eligible
            .iter()
            .copied()
            .partition(|peer| self.peer_has_capacity(peer));
        if available.is_empty() {
            let detail = format!(
                "every eligible peer is at capacity: {}",
                full.iter()
                    .map(|peer| format!(
                        "{} ({}/{})",
                        describe(peer),
                        self.assigned(peer),
                        capacity(peer, settings.default_peer_capacity())
                    ))
                    .join(", ")
            );
            self.record_all(&own_open, ConstraintFailure::PeerCapacityExhausted, &detail);
            return;
        }

        // peers without a schedule can't be tried, they only show up in the detail
        let (scheduled, unscheduled): (Vec<&LearningPeer>, Vec<&LearningPeer>) = available
            .iter()
            .copied()
            .partition(|peer| self.peer_schedules.contains_key(peer.email.as_str()));

        let own_emails: BTreeSet<&str> = own.iter().map(|learner| learner.email.as_str()).collect();
        let mut attempted: Vec<&'a LearningPeer> = Vec::new();
        for peer in scheduled {
            while self.peer_has_capacity(peer)
                && own.iter().any(|learner| self.is_open(learner))
            {
                if !attempted.iter().any(|tried| tried.email == peer.email) {
                    attempted.push(peer);
                }
                let open: Vec<&'a LearnerRequest> = pool
                    .iter()
                    .copied()
                    .filter(|learner| self.is_open(learner))
                    .collect();
                let instructor = required_instructor.map_or_else(
                    || normalize(teaching_instructor(peer, course_code)),
                    ToOwned::to_owned,
                );
                let formed = candidate_groups(&open, settings.max_group_size(), move |size| {
                    settings.combination_cap(size)
                })
                .filter(|candidate| {
                    candidate
                        .iter()
                        .any(|learner| own_emails.contains(learner.email.as_str()))
                })
                .find_map(|candidate| {
                    self.try_form_group(&candidate, peer, course_code, &instructor)
                        .map(|group| (group, candidate))
                });
                let Some((group, members)) = formed else {
                    break;
                };
                self.commit(group, peer, &members);
            }
        }

        let leftover: Vec<&'a LearnerRequest> = own
            .iter()
            .copied()
            .filter(|learner| self.is_open(learner))
            .collect();
        if leftover.is_empty() {
            return;
        }
        let mut detail = if attempted.is_empty() {
            "no eligible peer could be tried".to_owned()
        } else {
            format!(
                "no common free slot with peers tried: {}",
                describe_all(attempted.iter().copied())
            )
        };
        let filled: Vec<&LearningPeer> = attempted
            .iter()
            .copied()
            .filter(|peer| !self.peer_has_capacity(peer))
            .collect();
        if !filled.is_empty() {
            detail.push_str("; filled up during this partition: ");
            detail.push_str(&describe_all(filled));
        }
        if !full.is_empty() {
            detail.push_str("; at capacity: ");
            detail.push_str(&describe_all(full.iter().copied()));
        }
        if !unscheduled.is_empty() {
            detail.push_str("; without schedule: ");
            detail.push_str(&describe_all(unscheduled.iter().copied()));
        }
        self.record_all(&leftover, ConstraintFailure::ScheduleConflict, &detail);
    }
}

/// Runs the matching engine over one snapshot.
///
/// Every request that is not excluded ends up either in exactly one group or in the
/// unmatched list. Errors are only returned for malformed input, never for learners
/// that can't be placed.
pub fn run_matching(
    input: &MatchingInput,
    settings: &Settings,
) -> Result<MatchingResult, MatchingError> {
    ensure_unique(
        input.requests.iter().map(|request| request.email.as_str()),
        MatchingError::DuplicateLearner,
    )?;
    ensure_unique(
        input.peers.iter().map(|peer| peer.email.as_str()),
        MatchingError::DuplicatePeer,
    )?;
    let mut run = Run {
        settings,
        peers: &input.peers,
        learner_schedules: index_schedules(&input.learner_schedules)?,
        peer_schedules: index_schedules(&input.peer_schedules)?,
        peer_states: BTreeMap::new(),
        matched: BTreeSet::new(),
        recorded: BTreeSet::new(),
        result: MatchingResult::default(),
    };

    let learners: Vec<&LearnerRequest> = input
        .requests
        .iter()
        .filter(|request| !input.excluded_learner_emails.contains(&request.email))
        .collect();
    info!(
        learners = learners.len(),
        excluded = input.requests.len() - learners.len(),
        peers = input.peers.len(),
        "starting matching run"
    );

    let (scheduled, unscheduled): (Vec<&LearnerRequest>, Vec<&LearnerRequest>) = learners
        .iter()
        .copied()
        .partition(|learner| run.learner_schedules.contains_key(learner.email.as_str()));
    run.record_all(
        &unscheduled,
        ConstraintFailure::MissingSchedule,
        "no class schedule on file for this learner",
    );

    let partitions: BTreeMap<(Requirement, &str), Vec<&LearnerRequest>> = scheduled
        .iter()
        .copied()
        .into_group_map_by(|learner| (Requirement::of(learner), learner.course_code.trim()))
        .into_iter()
        .collect();

    for ((requirement, course_code), course_learners) in &partitions {
        match requirement {
            Requirement::Instructor => {
                let flexible = partitions
                    .get(&(Requirement::Any, *course_code))
                    .map_or(&[][..], Vec::as_slice);
                for cluster in reconcile(course_learners.iter().copied(), |learner| {
                    learner.instructor.as_str()
                }) {
                    let pool: Vec<&LearnerRequest> = cluster
                        .members
                        .iter()
                        .chain(flexible.iter())
                        .copied()
                        .filter(|learner| run.is_open(learner))
                        .collect();
                    run.match_partition(course_code, Some(&cluster.label), &cluster.members, &pool);
                }
            }
            Requirement::Any => {
                run.match_partition(course_code, None, course_learners, course_learners);
            }
        }
    }

    for learner in learners.iter().copied() {
        if run.is_open(learner) {
            warn!(learner = %learner.email, "learner was neither matched nor reported");
            run.record(
                learner,
                ConstraintFailure::ScheduleConflict,
                "no placement was attempted for this learner".to_owned(),
            );
        }
    }

    info!(
        groups = run.result.groups.len(),
        matched = run.result.matched_learners(),
        unmatched = run.result.unmatched.len(),
        "finished matching run"
    );
    Ok(run.result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseSlot;
    use crate::time::{TimeSlot, Weekday};

    fn learner(email: &str, course_code: &str, instructor: &str, required: bool) -> LearnerRequest {
        LearnerRequest {
            email: email.to_owned(),
            name: email.to_owned(),
            course_code: course_code.to_owned(),
            instructor: instructor.to_owned(),
            instructor_match_required: required,
            section_number: None,
        }
    }

    fn peer(email: &str, groups: Option<u32>, courses: &[(&str, &str)]) -> LearningPeer {
        LearningPeer {
            email: email.to_owned(),
            name: email.to_owned(),
            groups,
            course_slots: courses
                .iter()
                .map(|(course_code, instructor)| CourseSlot {
                    course_code: (*course_code).to_owned(),
                    instructor: (*instructor).to_owned(),
                })
                .collect(),
            other_courses: Vec::new(),
        }
    }

    fn free(email: &str) -> ClassSchedule {
        ClassSchedule::empty(email)
    }

    #[test]
    fn requirement_order() {
        assert!(Requirement::Instructor < Requirement::Any);
        assert_eq!(
            Requirement::of(&learner("a", "C", "  ", true)),
            Requirement::Any
        );
        assert_eq!(
            Requirement::of(&learner("a", "C", "Lee", true)),
            Requirement::Instructor
        );
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut input = MatchingInput {
            requests: vec![learner("a", "C", "", false), learner("a", "C", "", false)],
            ..MatchingInput::default()
        };
        assert!(matches!(
            run_matching(&input, &Settings::default()),
            Err(MatchingError::DuplicateLearner(email)) if email == "a"
        ));

        input.requests.pop();
        input.peers = vec![peer("p", None, &[]), peer("p", None, &[])];
        assert!(matches!(
            run_matching(&input, &Settings::default()),
            Err(MatchingError::DuplicatePeer(_))
        ));

        input.peers.pop();
        input.learner_schedules = vec![free("a"), free("a")];
        assert!(matches!(
            run_matching(&input, &Settings::default()),
            Err(MatchingError::DuplicateSchedule(_))
        ));
    }

    #[test]
    fn empty_snapshot_is_an_empty_result() {
        let result = run_matching(&MatchingInput::default(), &Settings::default()).unwrap();
        assert_eq!(result, MatchingResult::default());
    }

    #[test]
    fn flexible_learners_fill_specialist_groups() {
        let input = MatchingInput {
            requests: vec![
                learner("flex", "MATH 1505", "", false),
                learner("bound", "MATH 1505", "J. Smith", true),
            ],
            peers: vec![peer("p", Some(1), &[("MATH 1505", "John Smith")])],
            learner_schedules: vec![free("flex"), free("bound")],
            peer_schedules: vec![free("p")],
            excluded_learner_emails: BTreeSet::new(),
        };
        let result = run_matching(&input, &Settings::default()).unwrap();
        assert!(result.unmatched.is_empty(), "{:?}", result.unmatched);
        assert_eq!(result.groups.len(), 1);
        let group = &result.groups[0];
        assert_eq!(group.instructor, "j. smith");
        let emails: Vec<&str> = group.learners.iter().map(|l| l.email.as_str()).collect();
        assert_eq!(emails, vec!["bound", "flex"]);
        assert_eq!(group.learners[0].instructor.as_deref(), Some("J. Smith"));
        assert_eq!(group.learners[1].instructor, None);
    }

    #[test]
    fn specialists_are_not_spent_on_flexible_only_groups() {
        // the bound learner is never free, the flexible one must not take the peer here
        let mut blocked = free("bound");
        for day in Weekday::ALL {
            *blocked.day_mut(day) = vec![TimeSlot::parse("07:00", "21:00").unwrap()];
        }
        let input = MatchingInput {
            requests: vec![
                learner("bound", "MATH 1505", "Smith", true),
                learner("flex", "MATH 1505", "", false),
            ],
            peers: vec![peer("p", Some(1), &[("MATH 1505", "Smith")])],
            learner_schedules: vec![blocked, free("flex")],
            peer_schedules: vec![free("p")],
            excluded_learner_emails: BTreeSet::new(),
        };
        let result = run_matching(&input, &Settings::default()).unwrap();
        assert_eq!(result.unmatched.len(), 1);
        assert_eq!(result.unmatched[0].email, "bound");
        assert_eq!(
            result.unmatched[0].constraint_failure,
            ConstraintFailure::ScheduleConflict
        );
        // the flexible partition still gets the peer afterwards
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].learners[0].email, "flex");
        assert_eq!(result.groups[0].instructor, "smith");
    }

    #[test]
    fn peer_keeps_forming_groups_while_capacity_lasts() {
        let requests: Vec<LearnerRequest> = (0..9)
            .map(|index| learner(&format!("l{index}"), "COMP 1501", "", false))
            .collect();
        let learner_schedules = requests.iter().map(|request| free(&request.email)).collect();
        let input = MatchingInput {
            requests,
            peers: vec![peer("p", Some(2), &[("COMP 1501", "")])],
            learner_schedules,
            peer_schedules: vec![free("p")],
            excluded_learner_emails: BTreeSet::new(),
        };
        let result = run_matching(&input, &Settings::default()).unwrap();
        assert_eq!(result.groups.len(), 2);
        assert!(result.groups.iter().all(|group| group.learners.len() == 4));
        // the second group moves to another day
        assert_eq!(result.groups[0].time_slot.day, Weekday::Monday);
        assert_eq!(result.groups[1].time_slot.day, Weekday::Tuesday);
        assert_eq!(result.unmatched.len(), 1);
        let unmatched = &result.unmatched[0];
        assert_eq!(unmatched.email, "l8");
        // capacity ran out inside the peer loop, that is still a conflict
        assert_eq!(unmatched.constraint_failure, ConstraintFailure::ScheduleConflict);
        assert_eq!(
            unmatched.detail,
            "no common free slot with peers tried: p <p>; filled up during this partition: p <p>"
        );
    }

    #[test]
    fn peer_without_schedule_is_reported() {
        let input = MatchingInput {
            requests: vec![learner("l", "COMP 1501", "", false)],
            peers: vec![peer("p", None, &[("COMP 1501", "")])],
            learner_schedules: vec![free("l")],
            peer_schedules: Vec::new(),
            excluded_learner_emails: BTreeSet::new(),
        };
        let result = run_matching(&input, &Settings::default()).unwrap();
        assert_eq!(
            result.unmatched[0].constraint_failure,
            ConstraintFailure::ScheduleConflict
        );
        assert_eq!(
            result.unmatched[0].detail,
            "no eligible peer could be tried; without schedule: p <p>"
        );
    }
}
