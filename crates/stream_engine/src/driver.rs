use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};
use stream_logging::{stream_debug, stream_warn};
use tokio::task::JoinHandle;

use crate::{
    ApiError, JobHandle, JobStatusReport, RecordForwarder, ResultPage, SearchArgs,
    SearchJobApi, SearchQuery, ServiceConfig,
};

/// Activity storage backed by the remote log service: records go out through
/// the receiver, searches run as remote jobs.
pub struct SearchDriver {
    api: Arc<dyn SearchJobApi>,
    forwarder: RecordForwarder,
    config: ServiceConfig,
    last_job: Mutex<Option<JobHandle>>,
}

impl SearchDriver {
    pub fn new(
        api: Arc<dyn SearchJobApi>,
        forwarder: RecordForwarder,
        config: ServiceConfig,
    ) -> Self {
        Self {
            api,
            forwarder,
            config,
            last_job: Mutex::new(None),
        }
    }

    pub fn insert_record(
        &self,
        record: Map<String, Value>,
    ) -> Result<JoinHandle<Result<(), ApiError>>, ApiError> {
        self.forwarder.insert_record(record)
    }

    /// Submits a search job for `args`.
    ///
    /// Never fails: a missing configuration or a failed submission yields
    /// `None`, which the viewer shows as "nothing found".
    pub async fn search(&self, args: &SearchArgs) -> Option<JobHandle> {
        self.search_at(args, Local::now().naive_local()).await
    }

    pub async fn search_at(&self, args: &SearchArgs, now: NaiveDateTime) -> Option<JobHandle> {
        if !self.config.search_enabled() {
            stream_debug!("Search API is not configured; skipping job submission");
            return None;
        }

        let query = SearchQuery::from_args(args, &self.config.site_url, now);
        match self.api.submit(&query).await {
            Ok(job) => {
                *self.last_job.lock().unwrap_or_else(PoisonError::into_inner) = Some(job.clone());
                Some(job)
            }
            Err(err) if err.is_soft() => {
                stream_debug!("Search job not submitted: {}", err);
                None
            }
            Err(err) => {
                stream_warn!("Search job submission failed: {}", err);
                None
            }
        }
    }

    /// The job most recently created by [`SearchDriver::search`].
    pub fn last_search_job(&self) -> Option<JobHandle> {
        self.last_job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn check_job_status(&self, job: &JobHandle) -> Result<JobStatusReport, ApiError> {
        self.api.poll_status(job).await
    }

    pub async fn get_results(
        &self,
        job: &JobHandle,
        offset: u64,
        limit: u64,
    ) -> Result<ResultPage, ApiError> {
        self.api.fetch_page(job, offset, limit).await
    }
}
