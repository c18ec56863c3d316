use std::sync::Once;

use pretty_assertions::assert_eq;
use stream_core::{update, Effect, JobStatus, Msg, PagingConfig, PagingState, Viewport};

const JOB: &str = "job-token";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(stream_logging::initialize_for_tests);
}

fn open(visible_rows: u64) -> PagingState {
    let (state, _) = update(
        PagingState::new(),
        Msg::PageOpened {
            job: Some(JOB.to_string()),
            viewport: Viewport {
                first_visible_row: 0,
                visible_rows,
            },
        },
    );
    state
}

fn done(state: PagingState, count: u64) -> (PagingState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReceived {
            status: JobStatus::Done,
            label: "DONE GATHERING RESULTS".to_string(),
            count,
        },
    )
}

fn page(state: PagingState, count: u64) -> (PagingState, Vec<Effect>) {
    let rows = (0..count).map(|i| format!("row {i}")).collect();
    update(state, Msg::PageReceived { count, rows })
}

fn load_page(offset: u64) -> Effect {
    Effect::LoadPage {
        job: JOB.to_string(),
        offset,
    }
}

fn count_page_loads(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::LoadPage { .. }))
        .count()
}

#[test]
fn pages_continue_until_total_is_loaded() {
    init_logging();
    // Viewport taller than the result set: no scrollbar, so loading continues.
    let state = open(100);
    let (state, effects) = done(state, 45);
    assert_eq!(effects, vec![load_page(0)]);

    let (state, effects) = page(state, 20);
    assert_eq!(effects, vec![load_page(20)]);

    let (state, effects) = page(state, 20);
    assert_eq!(effects, vec![load_page(40)]);

    let (state, effects) = page(state, 5);
    assert!(effects.is_empty());
    assert_eq!(state.loaded_count(), 45);
    assert!(state.all_loaded());
    assert!(state.is_settled());
    assert_eq!(state.rows().len(), 45);

    // Scrolling after everything is loaded requests nothing.
    let (_state, effects) = update(state, Msg::ViewportChanged(Viewport::at_bottom(45, 100)));
    assert!(effects.is_empty());
}

#[test]
fn overflowing_content_waits_for_scroll() {
    init_logging();
    let state = open(10);
    let (state, _) = done(state, 100);
    let (state, effects) = page(state, 20);
    assert!(effects.is_empty());
    assert!(!state.is_settled());

    // Scrolled, but far from the bottom.
    let (state, effects) = update(
        state,
        Msg::ViewportChanged(Viewport {
            first_visible_row: 0,
            visible_rows: 10,
        }),
    );
    assert!(effects.is_empty());

    let (_state, effects) = update(state, Msg::ViewportChanged(Viewport::at_bottom(20, 10)));
    assert_eq!(effects, vec![load_page(20)]);
}

#[test]
fn scroll_burst_during_fetch_yields_exactly_one_more_fetch() {
    init_logging();
    let state = open(10);
    let (state, _) = done(state, 100);
    let (state, _) = page(state, 20);

    let (mut state, effects) = update(state, Msg::ViewportChanged(Viewport::at_bottom(20, 10)));
    assert_eq!(effects, vec![load_page(20)]);
    assert!(state.is_loading());

    let mut burst_effects = Vec::new();
    for _ in 0..5 {
        let (next, effects) = update(state, Msg::ViewportChanged(Viewport::at_bottom(20, 10)));
        burst_effects.extend(effects);
        state = next;
    }
    assert!(burst_effects.is_empty());
    assert!(state.hit_bottom());

    let (state, effects) = page(state, 20);
    assert_eq!(effects, vec![load_page(40)]);
    assert!(!state.hit_bottom());

    let (_state, effects) = page(state, 20);
    assert_eq!(count_page_loads(&effects), 0);
}

#[test]
fn polls_while_gathering_do_not_duplicate_inflight_page() {
    init_logging();
    let state = open(100);
    let (state, effects) = update(
        state,
        Msg::StatusReceived {
            status: JobStatus::Gathering,
            label: "GATHERING RESULTS".to_string(),
            count: 7,
        },
    );
    assert_eq!(count_page_loads(&effects), 1);

    let (state, _) = update(state, Msg::PollDue);
    let (_state, effects) = update(
        state,
        Msg::StatusReceived {
            status: JobStatus::Gathering,
            label: "GATHERING RESULTS".to_string(),
            count: 12,
        },
    );
    assert_eq!(count_page_loads(&effects), 0);
}

#[test]
fn empty_page_waits_for_next_status() {
    init_logging();
    let state = open(100);
    let (state, _) = update(
        state,
        Msg::StatusReceived {
            status: JobStatus::Gathering,
            label: "GATHERING RESULTS".to_string(),
            count: 10,
        },
    );
    let (state, effects) = page(state, 0);
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::PollDue);
    let (_state, effects) = update(
        state,
        Msg::StatusReceived {
            status: JobStatus::Gathering,
            label: "GATHERING RESULTS".to_string(),
            count: 10,
        },
    );
    assert!(effects.contains(&load_page(0)));
}

#[test]
fn short_page_after_terminal_status_marks_exhaustion() {
    init_logging();
    let state = open(100);
    let (state, _) = done(state, 45);
    let (state, _) = page(state, 20);
    let (state, _) = page(state, 20);
    // Three of the last five messages could not be decoded.
    let (state, effects) = page(state, 2);

    assert!(effects.is_empty());
    assert_eq!(state.loaded_count(), 42);
    assert!(state.all_loaded());
    assert!(state.is_settled());
}

fn gathering(state: PagingState, count: u64) -> (PagingState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReceived {
            status: JobStatus::Gathering,
            label: "GATHERING RESULTS".to_string(),
            count,
        },
    )
}

#[test]
fn short_page_requested_while_gathering_is_not_exhaustion() {
    init_logging();
    let state = open(100);
    let (state, effects) = gathering(state, 10);
    assert_eq!(count_page_loads(&effects), 1);

    let (state, effects) = page(state, 3);

    assert!(!state.all_loaded());
    assert!(!state.is_settled());
    assert_eq!(effects, vec![load_page(3)]);
}

#[test]
fn job_finishing_during_inflight_page_keeps_paging() {
    init_logging();
    let state = open(5);
    let (state, effects) = gathering(state, 7);
    assert_eq!(effects.last(), Some(&load_page(0)));

    let (state, _) = update(state, Msg::PollDue);
    let (state, effects) = done(state, 45);
    assert_eq!(count_page_loads(&effects), 0);

    let (state, effects) = page(state, 7);
    assert!(effects.is_empty());
    assert_eq!(state.loaded_count(), 7);
    assert!(!state.all_loaded());
    assert!(!state.is_settled());

    let (state, effects) = update(state, Msg::ViewportChanged(Viewport::at_bottom(7, 5)));
    assert_eq!(effects, vec![load_page(7)]);

    // Requested after the job finished, so a short page now ends paging.
    let (state, _) = page(state, 20);
    let (state, _) = update(state, Msg::ViewportChanged(Viewport::at_bottom(27, 5)));
    let (state, effects) = page(state, 18);
    assert!(effects.is_empty());
    assert_eq!(state.loaded_count(), 45);
    assert!(state.is_settled());
}

#[test]
fn custom_page_size_drives_exhaustion() {
    init_logging();
    let config = PagingConfig {
        page_size: 5,
        ..PagingConfig::default()
    };
    let (state, _) = update(
        PagingState::with_config(config),
        Msg::PageOpened {
            job: Some(JOB.to_string()),
            viewport: Viewport {
                first_visible_row: 0,
                visible_rows: 100,
            },
        },
    );
    let (state, _) = done(state, 30);
    let (state, effects) = page(state, 5);
    assert_eq!(effects, vec![load_page(5)]);

    let (state, effects) = page(state, 4);
    assert!(effects.is_empty());
    assert!(state.all_loaded());
}
