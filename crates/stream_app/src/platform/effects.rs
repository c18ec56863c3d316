use std::sync::mpsc;
use std::thread;

use stream_core::{Effect, JobStatus, Msg, Viewport};
use stream_engine::{AjaxReply, EngineEvent, EngineHandle, JobState};
use stream_logging::{mask_id, stream_debug, stream_warn};

use super::app::UiEvent;

/// Carries core effects out to the engine and engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    nonce: String,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, nonce: String) -> Self {
        Self { engine, nonce }
    }

    /// Runs every effect except alerts, which are returned for the UI.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<String> {
        let mut alerts = Vec::new();
        for effect in effects {
            match effect {
                Effect::CheckStatus { job } => {
                    stream_debug!("CheckStatus job={}", mask_id(&job));
                    self.engine.check_status(job, self.nonce.clone());
                }
                Effect::SchedulePoll { after } => self.engine.wake_after(after),
                Effect::LoadPage { job, offset } => {
                    stream_debug!("LoadPage job={} offset={}", mask_id(&job), offset);
                    self.engine.load_results(job, offset, self.nonce.clone());
                }
                Effect::Alert { message } => alerts.push(message),
            }
        }
        alerts
    }

    pub fn spawn_event_loop(
        &self,
        events: mpsc::Receiver<EngineEvent>,
        viewport: Viewport,
        ui_tx: mpsc::Sender<UiEvent>,
    ) {
        thread::spawn(move || {
            while let Ok(event) = events.recv() {
                if ui_tx.send(UiEvent::Engine(map_event(event, viewport))).is_err() {
                    break;
                }
            }
        });
    }
}

pub(crate) fn map_event(event: EngineEvent, viewport: Viewport) -> Msg {
    match event {
        EngineEvent::Submitted { job } => Msg::PageOpened { job, viewport },
        EngineEvent::StatusChecked(reply) => match reply {
            AjaxReply::Success(reply) => Msg::StatusReceived {
                status: map_state(JobState::from_label(&reply.status)),
                label: reply.status,
                count: reply.count,
            },
            AjaxReply::Failure(message) => Msg::StatusFailed { message },
            AjaxReply::Rejected(reason) => Msg::StatusFailed {
                message: format!("request rejected: {reason}"),
            },
        },
        EngineEvent::ResultsLoaded(reply) => match reply {
            AjaxReply::Success(reply) => Msg::PageReceived {
                count: reply.count,
                rows: reply.list,
            },
            AjaxReply::Failure(message) => Msg::PageFailed { message },
            AjaxReply::Rejected(reason) => Msg::PageFailed {
                message: format!("request rejected: {reason}"),
            },
        },
        EngineEvent::Woke => Msg::PollDue,
        EngineEvent::Forwarded { result } => {
            if let Err(err) = result {
                stream_warn!("Record forwarding failed: {}", err);
            }
            Msg::NoOp
        }
    }
}

fn map_state(state: JobState) -> JobStatus {
    match state {
        JobState::Submitted => JobStatus::Submitted,
        JobState::Gathering => JobStatus::Gathering,
        JobState::Done => JobStatus::Done,
        JobState::Cancelled => JobStatus::Cancelled,
        JobState::Error => JobStatus::Error,
    }
}
