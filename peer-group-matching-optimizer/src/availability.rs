use alloc::collections::BTreeSet;

use crate::model::{ClassSchedule, MeetingSlot};
use crate::settings::Settings;
use crate::time::{available_slots, TimeSlot, Weekday};

/// Participants arriving from or leaving for a class this close count as on campus.
const ON_CAMPUS_MINUTES: u16 = 90;
const NEAR_MINUTES: u16 = 60;
const PREFERRED_MINUTES: u16 = 120;

/// How convenient a slot is for a group, better slots compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotScore {
    Unconstrained,
    WithinTwoHours,
    WithinHour,
    Gap,
}

/// Minutes between the slot and the closest class, `None` without classes.
fn proximity(slot: TimeSlot, classes: &[TimeSlot]) -> Option<u16> {
    let start = slot.start().minutes();
    let end = slot.end().minutes();
    classes
        .iter()
        .map(|class| {
            if end <= class.start().minutes() {
                class.start().minutes() - end
            } else if start >= class.end().minutes() {
                start - class.end().minutes()
            } else {
                0
            }
        })
        .min()
}

fn between_own_classes(slot: TimeSlot, classes: &[TimeSlot]) -> bool {
    classes.iter().any(|class| class.end() <= slot.start())
        && classes.iter().any(|class| class.start() >= slot.end())
}

fn group_on_campus(slot: TimeSlot, schedules: &[&ClassSchedule], day: Weekday) -> bool {
    let start = slot.start().minutes();
    let end = slot.end().minutes();
    let classes = || schedules.iter().flat_map(|schedule| schedule.day(day));
    let arriving = classes().any(|class| {
        let class_end = class.end().minutes();
        class_end <= start && start - class_end <= ON_CAMPUS_MINUTES
    });
    let leaving = classes().any(|class| {
        let class_start = class.start().minutes();
        class_start >= end && class_start - end <= ON_CAMPUS_MINUTES
    });
    arriving && leaving
}

#[must_use]
pub fn score_slot(slot: TimeSlot, schedules: &[&ClassSchedule], day: Weekday) -> SlotScore {
    if schedules
        .iter()
        .any(|schedule| between_own_classes(slot, schedule.day(day)))
        || group_on_campus(slot, schedules, day)
    {
        return SlotScore::Gap;
    }
    match schedules
        .iter()
        .filter_map(|schedule| proximity(slot, schedule.day(day)))
        .min()
    {
        Some(minutes) if minutes <= NEAR_MINUTES => SlotScore::WithinHour,
        Some(minutes) if minutes <= PREFERRED_MINUTES => SlotScore::WithinTwoHours,
        _ => SlotScore::Unconstrained,
    }
}

/// The most convenient conflict-free slot of the week for all given schedules.
///
/// Equal scores prefer a day the peer has no group on yet, after that the earliest
/// slot (monday first) wins.
#[must_use]
pub fn best_slot(
    schedules: &[&ClassSchedule],
    days_used_by_peer: &BTreeSet<Weekday>,
    settings: &Settings,
) -> Option<MeetingSlot> {
    let mut best: Option<((SlotScore, bool), MeetingSlot)> = None;
    for day in Weekday::ALL {
        let fresh_day = !days_used_by_peer.contains(&day);
        for slot in available_slots(schedules, day, settings) {
            let rank = (score_slot(slot, schedules, day), fresh_day);
            if best.as_ref().map_or(true, |(best_rank, _)| rank > *best_rank) {
                best = Some((rank, MeetingSlot { day, slot }));
            }
        }
    }
    best.map(|(_, slot)| slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot::parse(start, end).unwrap()
    }

    fn schedule(email: &str, day: Weekday, classes: &[(&str, &str)]) -> ClassSchedule {
        let mut schedule = ClassSchedule::empty(email);
        *schedule.day_mut(day) = classes.iter().map(|(start, end)| slot(start, end)).collect();
        schedule
    }

    #[test]
    fn personal_gap_scores_highest() {
        let learner = schedule(
            "l@example.org",
            Weekday::Monday,
            &[("08:00", "10:00"), ("16:00", "17:00")],
        );
        assert_eq!(
            score_slot(slot("12:00", "13:00"), &[&learner], Weekday::Monday),
            SlotScore::Gap
        );
        assert_eq!(
            score_slot(slot("17:30", "18:30"), &[&learner], Weekday::Monday),
            SlotScore::WithinHour
        );
    }

    #[test]
    fn group_on_campus_counts_as_gap() {
        let arriving = schedule("a@example.org", Weekday::Monday, &[("09:00", "10:30")]);
        let leaving = schedule("b@example.org", Weekday::Monday, &[("13:00", "14:00")]);
        let both = [&arriving, &leaving];
        assert_eq!(score_slot(slot("11:00", "12:00"), &both, Weekday::Monday), SlotScore::Gap);
        // leaving class starts 120 minutes after the session ends, too far
        assert_eq!(
            score_slot(slot("10:00", "11:00"), &[&leaving], Weekday::Monday),
            SlotScore::WithinTwoHours
        );
        assert_eq!(
            score_slot(slot("10:35", "11:00"), &both, Weekday::Monday),
            SlotScore::WithinHour
        );
    }

    #[test]
    fn proximity_tiers() {
        let peer = schedule("p@example.org", Weekday::Tuesday, &[("08:00", "09:00")]);
        let day = Weekday::Tuesday;
        assert_eq!(score_slot(slot("10:00", "11:00"), &[&peer], day), SlotScore::WithinHour);
        assert_eq!(score_slot(slot("10:30", "11:30"), &[&peer], day), SlotScore::WithinTwoHours);
        assert_eq!(score_slot(slot("11:00", "12:00"), &[&peer], day), SlotScore::WithinTwoHours);
        assert_eq!(score_slot(slot("11:30", "12:30"), &[&peer], day), SlotScore::Unconstrained);
        assert_eq!(
            score_slot(slot("10:00", "11:00"), &[&peer], Weekday::Monday),
            SlotScore::Unconstrained
        );
    }

    #[test]
    fn best_slot_prefers_score_then_earliest() {
        let peer = schedule("p@example.org", Weekday::Wednesday, &[("12:00", "13:00")]);
        let learner = ClassSchedule::empty("l@example.org");
        let best = best_slot(&[&peer, &learner], &BTreeSet::new(), &Settings::default()).unwrap();
        // hour tier starts at 10:00, monday and tuesday are unconstrained
        assert_eq!(
            best,
            MeetingSlot {
                day: Weekday::Wednesday,
                slot: slot("10:00", "11:00"),
            }
        );
    }

    #[test]
    fn best_slot_prefers_unused_day_on_ties() {
        let mut peer = ClassSchedule::empty("p@example.org");
        peer.monday = vec![slot("12:00", "13:00")];
        peer.tuesday = vec![slot("12:00", "13:00")];
        let used = BTreeSet::from([Weekday::Monday]);
        let best = best_slot(&[&peer], &used, &Settings::default()).unwrap();
        assert_eq!(best.day, Weekday::Tuesday);
        assert_eq!(best.slot, slot("10:00", "11:00"));

        let best = best_slot(&[&peer], &BTreeSet::new(), &Settings::default()).unwrap();
        assert_eq!(best.day, Weekday::Monday);
    }

    #[test]
    fn no_slot_when_every_day_is_blocked() {
        let mut busy = ClassSchedule::empty("p@example.org");
        for day in Weekday::ALL {
            *busy.day_mut(day) = vec![slot("07:00", "21:00")];
        }
        assert_eq!(best_slot(&[&busy], &BTreeSet::new(), &Settings::default()), None);
    }

    #[test]
    fn unconstrained_schedules_take_monday_morning() {
        let free = ClassSchedule::empty("p@example.org");
        let best = best_slot(&[&free], &BTreeSet::new(), &Settings::default()).unwrap();
        assert_eq!(best.day, Weekday::Monday);
        assert_eq!(best.slot, slot("08:00", "09:00"));
    }
}
