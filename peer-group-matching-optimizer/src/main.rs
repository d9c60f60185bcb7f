use peer_group_matching_optimizer::model::{
    ClassSchedule, CourseSlot, LearnerRequest, LearningPeer, MatchingInput,
};
use peer_group_matching_optimizer::time::TimeSlot;
use peer_group_matching_optimizer::{run_matching, MatchingError, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn request(email: &str, name: &str, instructor: &str, required: bool) -> LearnerRequest {
    LearnerRequest {
        email: email.to_owned(),
        name: name.to_owned(),
        course_code: "MATH 1505".to_owned(),
        instructor: instructor.to_owned(),
        instructor_match_required: required,
        section_number: None,
    }
}

fn demo_snapshot() -> Result<MatchingInput, MatchingError> {
    let peer_moritz = LearningPeer {
        email: "moritz@example.org".to_owned(),
        name: "Moritz".to_owned(),
        groups: Some(2),
        course_slots: vec![CourseSlot {
            course_code: "MATH 1505".to_owned(),
            instructor: "Dr. Marina Elliott".to_owned(),
        }],
        other_courses: vec![CourseSlot {
            course_code: "COMP 1501".to_owned(),
            instructor: String::new(),
        }],
    };

    let mut schedule_moritz = ClassSchedule::empty("moritz@example.org");
    schedule_moritz.monday = vec![
        TimeSlot::parse("08:30", "09:50")?,
        TimeSlot::parse("14:30", "15:50")?,
    ];
    schedule_moritz.wednesday = vec![TimeSlot::parse("10:00", "11:20")?];

    let requests = vec![
        request("anna@example.org", "Anna", "elliot", true),
        request("ben@example.org", "Ben", "", true),
        request("carla@example.org", "Carla", "Prof. Smith", false),
    ];

    let mut schedule_anna = ClassSchedule::empty("anna@example.org");
    schedule_anna.monday = vec![TimeSlot::parse("10:00", "11:20")?];
    let mut schedule_ben = ClassSchedule::empty("ben@example.org");
    schedule_ben.monday = vec![TimeSlot::parse("11:30", "12:50")?];
    // carla has no schedule on file and can't be placed

    Ok(MatchingInput {
        requests,
        peers: vec![peer_moritz],
        learner_schedules: vec![schedule_anna, schedule_ben],
        peer_schedules: vec![schedule_moritz],
        ..MatchingInput::default()
    })
}

pub fn main() -> Result<(), MatchingError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    let input = demo_snapshot()?;
    let result = run_matching(&input, &settings)?;

    for group in &result.groups {
        info!("{group:#?}");
    }
    for unmatched in &result.unmatched {
        info!(
            email = %unmatched.email,
            failure = %unmatched.constraint_failure,
            detail = %unmatched.detail,
            "unmatched"
        );
    }
    info!("{:#?}", result.summary(input.peers.len()));
    for peer in result.idle_peers(&input.peers) {
        info!(peer = %peer.email, "peer without group");
    }
    Ok(())
}
