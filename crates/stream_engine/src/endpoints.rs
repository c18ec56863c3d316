use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stream_logging::{mask_id, stream_debug, stream_warn};

use crate::{
    JobHandle, JobTokenCodec, NonceError, NonceIssuer, RowRenderer, SearchDriver, TokenError,
    DEFAULT_PAGE_SIZE,
};

/// Nonce action shared by both viewer calls.
pub const NONCE_ACTION: &str = "stream_search_nonce";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckJobRequest {
    pub job: String,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadResultsRequest {
    pub job: String,
    #[serde(default)]
    pub offset: u64,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatusReply {
    /// Remote state label, e.g. `DONE GATHERING RESULTS`.
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsReply {
    pub count: u64,
    pub list: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Nonce,
    Job,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Nonce => write!(f, "invalid nonce"),
            RejectReason::Job => write!(f, "invalid job"),
        }
    }
}

/// Outcome of a viewer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AjaxReply<T> {
    Success(T),
    /// User-visible error message.
    Failure(String),
    /// The request was refused before any remote call; no body is sent.
    Rejected(RejectReason),
}

impl<T: Serialize> AjaxReply<T> {
    /// Response body as `{"success": bool, "data": ...}`; `None` when rejected.
    pub fn body(&self) -> Option<Value> {
        let (success, data) = match self {
            AjaxReply::Success(data) => (true, serde_json::to_value(data).ok()?),
            AjaxReply::Failure(message) => (false, Value::String(message.clone())),
            AjaxReply::Rejected(_) => return None,
        };
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(success));
        body.insert("data".to_string(), data);
        Some(Value::Object(body))
    }
}

/// Server side of the viewer: status checks and page loads against a job
/// token issued by [`SearchEndpoints::handoff`].
pub struct SearchEndpoints {
    driver: Arc<SearchDriver>,
    tokens: JobTokenCodec,
    nonces: NonceIssuer,
    renderer: Arc<dyn RowRenderer>,
    page_size: u64,
}

impl SearchEndpoints {
    pub fn new(
        driver: Arc<SearchDriver>,
        tokens: JobTokenCodec,
        nonces: NonceIssuer,
        renderer: Arc<dyn RowRenderer>,
    ) -> Self {
        Self {
            driver,
            tokens,
            nonces,
            renderer,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn driver(&self) -> &Arc<SearchDriver> {
        &self.driver
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn issue_nonce(&self) -> Result<String, NonceError> {
        self.nonces.create(NONCE_ACTION)
    }

    pub fn encode_job(&self, job: &JobHandle) -> Result<String, TokenError> {
        self.tokens.encode(job)
    }

    /// Token for the last submitted job, handed to the viewer when it opens.
    pub fn handoff(&self) -> Option<String> {
        let job = self.driver.last_search_job()?;
        match self.tokens.encode(&job) {
            Ok(token) => Some(token),
            Err(err) => {
                stream_warn!("Failed to encode job {}: {}", mask_id(&job.id), err);
                None
            }
        }
    }

    pub async fn check_job_status(&self, request: &CheckJobRequest) -> AjaxReply<JobStatusReply> {
        let job = match self.authorize(&request.nonce, &request.job) {
            Ok(job) => job,
            Err(reason) => return AjaxReply::Rejected(reason),
        };

        match self.driver.check_job_status(&job).await {
            Ok(status) => AjaxReply::Success(JobStatusReply {
                status: status.label,
                count: status.result_count,
            }),
            Err(err) => {
                stream_warn!("Status check for job {} failed: {}", mask_id(&job.id), err);
                AjaxReply::Failure(err.to_string())
            }
        }
    }

    pub async fn load_results(&self, request: &LoadResultsRequest) -> AjaxReply<ResultsReply> {
        let job = match self.authorize(&request.nonce, &request.job) {
            Ok(job) => job,
            Err(reason) => return AjaxReply::Rejected(reason),
        };

        match self
            .driver
            .get_results(&job, request.offset, self.page_size)
            .await
        {
            Ok(page) => AjaxReply::Success(ResultsReply {
                count: page.count,
                list: page
                    .events
                    .iter()
                    .map(|event| self.renderer.render(event))
                    .collect(),
            }),
            Err(err) => {
                stream_warn!(
                    "Loading results at {} for job {} failed: {}",
                    request.offset,
                    mask_id(&job.id),
                    err
                );
                AjaxReply::Failure(err.to_string())
            }
        }
    }

    fn authorize(&self, nonce: &str, token: &str) -> Result<JobHandle, RejectReason> {
        if self.nonces.verify(NONCE_ACTION, nonce).is_err() {
            stream_debug!("Rejected viewer call with invalid nonce");
            return Err(RejectReason::Nonce);
        }
        self.tokens.decode(token).map_err(|err| {
            stream_debug!("Rejected viewer call: {}", err);
            RejectReason::Job
        })
    }
}
