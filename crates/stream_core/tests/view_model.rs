use stream_core::{
    update, JobStatus, Msg, PagingState, Viewport, EMPTY_ERROR, EMPTY_LOADING,
    EMPTY_NOTHING_FOUND, STATUS_ERROR, STATUS_LOADING,
};

fn opened() -> PagingState {
    let (state, _) = update(
        PagingState::new(),
        Msg::PageOpened {
            job: Some("job".to_string()),
            viewport: Viewport {
                first_visible_row: 0,
                visible_rows: 50,
            },
        },
    );
    state
}

#[test]
fn placeholder_texts_before_first_status() {
    let mut state = opened();
    let view = state.view();

    assert_eq!(view.status_text, STATUS_LOADING);
    assert_eq!(view.found, None);
    assert_eq!(view.empty_message, Some(EMPTY_LOADING));
    assert!(view.spinner_visible);
    assert!(!view.settled);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn terminal_without_results_reports_nothing_found() {
    let (state, _) = update(
        opened(),
        Msg::StatusReceived {
            status: JobStatus::Done,
            label: "DONE GATHERING RESULTS".to_string(),
            count: 0,
        },
    );
    let view = state.view();

    assert_eq!(view.status_text, "DONE GATHERING RESULTS");
    assert_eq!(view.found, Some(0));
    assert_eq!(view.empty_message, Some(EMPTY_NOTHING_FOUND));
    assert!(!view.spinner_visible);
    assert!(view.settled);
}

#[test]
fn rows_replace_empty_message() {
    let (state, _) = update(
        opened(),
        Msg::StatusReceived {
            status: JobStatus::Done,
            label: "DONE GATHERING RESULTS".to_string(),
            count: 2,
        },
    );
    assert!(state.view().spinner_visible);

    let (state, _) = update(
        state,
        Msg::PageReceived {
            count: 2,
            rows: vec!["a".to_string(), "b".to_string()],
        },
    );
    let view = state.view();

    assert_eq!(view.rows, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(view.loaded_count, 2);
    assert_eq!(view.empty_message, None);
    assert!(!view.spinner_visible);
}

#[test]
fn failure_shows_error_texts() {
    let (state, _) = update(
        opened(),
        Msg::StatusFailed {
            message: "API call error: boom".to_string(),
        },
    );
    let view = state.view();

    assert_eq!(view.status_text, STATUS_ERROR);
    assert_eq!(view.empty_message, Some(EMPTY_ERROR));
    assert_eq!(view.error.as_deref(), Some("API call error: boom"));
    assert!(!view.spinner_visible);
    assert!(view.settled);
}
