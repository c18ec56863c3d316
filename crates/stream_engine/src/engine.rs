use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use serde_json::{Map, Value};
use stream_logging::stream_debug;

use crate::endpoints::{
    AjaxReply, CheckJobRequest, JobStatusReply, LoadResultsRequest, ResultsReply, SearchEndpoints,
};
use crate::SearchArgs;

enum EngineCommand {
    Submit { args: SearchArgs },
    CheckStatus { job: String, nonce: String },
    LoadResults { job: String, offset: u64, nonce: String },
    WakeAfter { delay: Duration },
    Forward { record: Map<String, Value> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Search submitted; carries the job token, or `None` when no job exists.
    Submitted { job: Option<String> },
    StatusChecked(AjaxReply<JobStatusReply>),
    ResultsLoaded(AjaxReply<ResultsReply>),
    /// A delay requested with [`EngineHandle::wake_after`] elapsed.
    Woke,
    Forwarded { result: Result<(), String> },
}

/// Runs viewer calls on a background tokio runtime and reports their
/// outcomes as [`EngineEvent`]s.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        endpoints: Arc<SearchEndpoints>,
    ) -> io::Result<(Self, mpsc::Receiver<EngineEvent>)> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("stream-engine")
            .build()?;

        thread::Builder::new()
            .name("stream-engine-commands".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let endpoints = endpoints.clone();
                    let event_tx = event_tx.clone();
                    runtime.spawn(async move {
                        handle_command(endpoints.as_ref(), command, event_tx).await;
                    });
                }
                stream_debug!("Engine command channel closed; shutting down runtime");
            })?;

        Ok((Self { cmd_tx }, event_rx))
    }

    pub fn submit(&self, args: SearchArgs) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { args });
    }

    pub fn check_status(&self, job: impl Into<String>, nonce: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::CheckStatus {
            job: job.into(),
            nonce: nonce.into(),
        });
    }

    pub fn load_results(&self, job: impl Into<String>, offset: u64, nonce: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::LoadResults {
            job: job.into(),
            offset,
            nonce: nonce.into(),
        });
    }

    pub fn wake_after(&self, delay: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::WakeAfter { delay });
    }

    pub fn forward(&self, record: Map<String, Value>) {
        let _ = self.cmd_tx.send(EngineCommand::Forward { record });
    }
}

async fn handle_command(
    endpoints: &SearchEndpoints,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Submit { args } => {
            let job = match endpoints.driver().search(&args).await {
                Some(_) => endpoints.handoff(),
                None => None,
            };
            EngineEvent::Submitted { job }
        }
        EngineCommand::CheckStatus { job, nonce } => {
            let request = CheckJobRequest { job, nonce };
            EngineEvent::StatusChecked(endpoints.check_job_status(&request).await)
        }
        EngineCommand::LoadResults { job, offset, nonce } => {
            let request = LoadResultsRequest { job, offset, nonce };
            EngineEvent::ResultsLoaded(endpoints.load_results(&request).await)
        }
        EngineCommand::WakeAfter { delay } => {
            tokio::time::sleep(delay).await;
            EngineEvent::Woke
        }
        EngineCommand::Forward { record } => {
            let result = match endpoints.driver().insert_record(record) {
                Ok(task) => match task.await {
                    Ok(delivery) => delivery.map_err(|err| err.to_string()),
                    Err(err) => Err(err.to_string()),
                },
                Err(err) => Err(err.to_string()),
            };
            EngineEvent::Forwarded { result }
        }
    };
    let _ = event_tx.send(event);
}
