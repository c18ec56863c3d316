use crate::{Effect, JobStatus, Msg, PagingState};

const JOB_FAILED_MESSAGE: &str = "The search job failed on the remote service.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: PagingState, msg: Msg) -> (PagingState, Vec<Effect>) {
    let effects = match msg {
        Msg::PageOpened { job, viewport } => {
            state.open(job, viewport);
            poll_now(&mut state)
        }
        Msg::PollDue => poll_now(&mut state),
        Msg::StatusReceived {
            status,
            label,
            count,
        } => {
            if state.is_errored() {
                return (state, Vec::new());
            }
            state.apply_status(status, label, count);
            if status == JobStatus::Error {
                return fail(state, JOB_FAILED_MESSAGE.to_string());
            }

            let mut effects = Vec::with_capacity(2);
            if !status.is_terminal() {
                effects.push(Effect::SchedulePoll {
                    after: state.config().poll_interval,
                });
            }
            // Runs on every status, terminal or not: the first rows can show
            // up while the job is still gathering.
            effects.extend(load_more(&mut state));
            effects
        }
        Msg::StatusFailed { message } | Msg::PageFailed { message } => {
            return fail(state, message);
        }
        Msg::PageReceived { count, rows } => {
            if state.is_errored() {
                return (state, Vec::new());
            }
            state.apply_page(count, rows);
            if count > 0 {
                load_more(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::ViewportChanged(viewport) => {
            state.set_viewport(viewport);
            load_more(&mut state)
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn poll_now(state: &mut PagingState) -> Vec<Effect> {
    match state.begin_poll() {
        Some(job) => vec![Effect::CheckStatus { job }],
        None => Vec::new(),
    }
}

fn load_more(state: &mut PagingState) -> Vec<Effect> {
    if !state.wants_more() {
        return Vec::new();
    }
    // A scroll seen while a page is in flight leaves `hit_bottom` set, so the
    // completion of that page issues exactly one follow-up request.
    match state.begin_page() {
        Some((job, offset)) => vec![Effect::LoadPage { job, offset }],
        None => Vec::new(),
    }
}

fn fail(mut state: PagingState, message: String) -> (PagingState, Vec<Effect>) {
    if state.is_errored() {
        return (state, Vec::new());
    }
    state.fail(message.clone());
    (state, vec![Effect::Alert { message }])
}
