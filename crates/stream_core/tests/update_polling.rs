use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use stream_core::{
    update, Effect, JobStatus, Msg, PagingState, PollPhase, Viewport, EMPTY_NOTHING_FOUND,
};

const JOB: &str = "job-token";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(stream_logging::initialize_for_tests);
}

fn open_with_job() -> (PagingState, Vec<Effect>) {
    update(
        PagingState::new(),
        Msg::PageOpened {
            job: Some(JOB.to_string()),
            viewport: Viewport {
                first_visible_row: 0,
                visible_rows: 100,
            },
        },
    )
}

fn status(
    state: PagingState,
    status: JobStatus,
    label: &str,
    count: u64,
) -> (PagingState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReceived {
            status,
            label: label.to_string(),
            count,
        },
    )
}

fn rows(count: u64) -> Vec<String> {
    (0..count).map(|i| format!("row {i}")).collect()
}

#[test]
fn opening_with_job_checks_status_immediately() {
    init_logging();
    let (state, effects) = open_with_job();

    assert_eq!(
        effects,
        vec![Effect::CheckStatus {
            job: JOB.to_string()
        }]
    );
    assert_eq!(state.phase(), PollPhase::Polling);
}

#[test]
fn opening_without_job_stays_idle() {
    init_logging();
    for job in [None, Some(String::new())] {
        let (state, effects) = update(
            PagingState::new(),
            Msg::PageOpened {
                job,
                viewport: Viewport::default(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.phase(), PollPhase::Idle);
        assert!(state.is_settled());
        assert_eq!(state.view().empty_message, Some(EMPTY_NOTHING_FOUND));

        let (_state, effects) = update(state, Msg::PollDue);
        assert!(effects.is_empty());
    }
}

#[test]
fn gathering_schedules_next_poll_after_fixed_interval() {
    init_logging();
    let (state, _) = open_with_job();
    let (state, effects) = status(state, JobStatus::Gathering, "GATHERING RESULTS", 0);

    assert_eq!(
        effects,
        vec![Effect::SchedulePoll {
            after: Duration::from_secs(1)
        }]
    );
    assert_eq!(state.phase(), PollPhase::Waiting);

    let (_state, effects) = update(state, Msg::PollDue);
    assert_eq!(
        effects,
        vec![Effect::CheckStatus {
            job: JOB.to_string()
        }]
    );
}

#[test]
fn polls_never_overlap() {
    init_logging();
    let (state, _) = open_with_job();

    // The first check is still in flight.
    let (state, effects) = update(state, Msg::PollDue);
    assert!(effects.is_empty());
    let (_state, effects) = update(state, Msg::PollDue);
    assert!(effects.is_empty());
}

#[test]
fn done_stops_polling_and_loads_one_page() {
    init_logging();
    let (state, _) = open_with_job();
    let (state, effects) = status(state, JobStatus::Done, "DONE GATHERING RESULTS", 5);

    assert_eq!(
        effects,
        vec![Effect::LoadPage {
            job: JOB.to_string(),
            offset: 0
        }]
    );
    assert_eq!(state.phase(), PollPhase::Terminal);

    let (state, effects) = update(
        state,
        Msg::PageReceived {
            count: 5,
            rows: rows(5),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.loaded_count(), 5);
    assert!(state.is_settled());

    let (_state, effects) = update(state, Msg::PollDue);
    assert!(effects.is_empty());
}

#[test]
fn cancelled_is_terminal() {
    init_logging();
    let (state, _) = open_with_job();
    let (state, effects) = status(state, JobStatus::Cancelled, "CANCELLED", 0);

    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Terminal);
    assert!(state.is_settled());
}

#[test]
fn transport_error_is_sticky() {
    init_logging();
    let (state, _) = open_with_job();
    let (state, effects) = update(
        state,
        Msg::StatusFailed {
            message: "API call error: connection refused".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "API call error: connection refused".to_string()
        }]
    );
    assert!(state.is_errored());
    assert_eq!(state.phase(), PollPhase::Failed);

    // A manual retry makes no network call.
    let (state, effects) = update(state, Msg::PollDue);
    assert!(effects.is_empty());

    // Late responses are ignored.
    let (state, effects) = status(state, JobStatus::Done, "DONE GATHERING RESULTS", 3);
    assert!(effects.is_empty());
    assert_eq!(state.results_count(), 0);

    // A second failure does not alert again.
    let (_state, effects) = update(
        state,
        Msg::StatusFailed {
            message: "again".to_string(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn remote_error_state_halts_session() {
    init_logging();
    let (state, _) = open_with_job();
    let (state, effects) = status(state, JobStatus::Error, "ERROR", 10);

    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], Effect::Alert { .. }));
    assert!(state.is_errored());

    let (_state, effects) = update(state, Msg::PollDue);
    assert!(effects.is_empty());
}

#[test]
fn page_failure_also_stops_polling() {
    init_logging();
    let (state, _) = open_with_job();
    let (state, effects) = status(state, JobStatus::Gathering, "GATHERING RESULTS", 30);
    assert_eq!(effects.len(), 2);

    let (state, effects) = update(
        state,
        Msg::PageFailed {
            message: "API call error: timeout".to_string(),
        },
    );
    assert_eq!(effects.len(), 1);
    assert!(!state.is_loading());

    let (_state, effects) = update(state, Msg::PollDue);
    assert!(effects.is_empty());
}
