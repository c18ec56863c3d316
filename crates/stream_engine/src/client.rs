use std::collections::BTreeMap;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Response, StatusCode, Url};
use stream_logging::{mask_id, stream_debug, stream_info, stream_warn};

use crate::decode::{decode_job_status, decode_messages, decode_submission};
use crate::query::local_time_zone;
use crate::{
    ApiError, ApiSettings, JobHandle, JobStatusReport, ResultPage, SearchQuery, ServiceConfig,
};

/// The remote search-job API: submit a query, poll its status, page through
/// its messages.
#[async_trait::async_trait]
pub trait SearchJobApi: Send + Sync {
    async fn submit(&self, query: &SearchQuery) -> Result<JobHandle, ApiError>;

    async fn poll_status(&self, job: &JobHandle) -> Result<JobStatusReport, ApiError>;

    async fn fetch_page(
        &self,
        job: &JobHandle,
        offset: u64,
        limit: u64,
    ) -> Result<ResultPage, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSearchJobClient {
    config: ServiceConfig,
    settings: ApiSettings,
    http: reqwest::Client,
    time_zone: String,
}

impl ReqwestSearchJobClient {
    pub fn new(config: ServiceConfig, settings: ApiSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            config,
            settings,
            http,
            time_zone: local_time_zone(),
        })
    }

    /// Overrides the time zone name sent with submissions.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn endpoint(&self) -> Result<Url, ApiError> {
        let endpoint = self
            .config
            .api_endpoint()
            .ok_or(ApiError::NotConfigured("search API endpoint"))?;
        Url::parse(endpoint)
            .map_err(|err| ApiError::Transport(format!("invalid API endpoint: {err}")))
    }

    fn credentials(&self) -> Result<(&str, &str), ApiError> {
        self.config
            .credentials()
            .ok_or(ApiError::NotConfigured("search API credentials"))
    }

    fn job_url(&self, job: &JobHandle, tail: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.endpoint()?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::Transport("API endpoint cannot hold a path".to_string()))?;
            segments.pop_if_empty().push(&job.id);
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }

    /// GET against a job resource, retrying transport failures up to the
    /// configured number of attempts.
    async fn get_job(&self, job: &JobHandle, url: Url) -> Result<Vec<u8>, ApiError> {
        if !job.is_valid() {
            return Err(ApiError::MalformedResponse("job handle has no id".to_string()));
        }
        let (access_id, access_key) = self.credentials()?;
        let attempts = self.settings.attempts.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut request = self
                .http
                .get(url.clone())
                .basic_auth(access_id, Some(access_key))
                .timeout(self.settings.request_timeout);
            if let Some(cookie) = job.cookie_header() {
                request = request.header(COOKIE, cookie);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(ApiError::Status(status.as_u16()));
                    }
                    return self.read_body(response).await;
                }
                Err(err) if attempt < attempts && is_retryable(&err) => {
                    stream_warn!(
                        "Search job {} call failed (attempt {}/{}): {}",
                        mask_id(&job.id),
                        attempt,
                        attempts,
                        err
                    );
                }
                Err(err) => return Err(map_reqwest_error(err)),
            }
        }
    }

    async fn read_body(&self, response: Response) -> Result<Vec<u8>, ApiError> {
        let max_bytes = self.settings.max_body_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::MalformedResponse(format!(
                    "response too large (max {max_bytes}, actual {content_len})"
                )));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::MalformedResponse(format!(
                    "response too large (max {max_bytes})"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl SearchJobApi for ReqwestSearchJobClient {
    async fn submit(&self, query: &SearchQuery) -> Result<JobHandle, ApiError> {
        let endpoint = self.endpoint()?;
        let (access_id, access_key) = self.credentials()?;

        let body = query.submit_body(self.config.base_query(), &self.time_zone);
        stream_debug!("Submitting search job: {}", body.query);
        let payload = serde_json::to_vec(&body)
            .map_err(|err| ApiError::Transport(format!("failed to encode request: {err}")))?;

        let response = self
            .http
            .post(endpoint)
            .basic_auth(access_id, Some(access_key))
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.settings.submit_timeout)
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            return Err(ApiError::MalformedResponse(format!(
                "expected 202 Accepted from job submission, got {status}"
            )));
        }

        let cookies = capture_cookies(&response);
        let bytes = self.read_body(response).await?;
        let id = decode_submission(&bytes)?;
        stream_info!(
            "Search job {} created with {} affinity cookie(s)",
            mask_id(&id),
            cookies.len()
        );
        Ok(JobHandle::new(id, cookies))
    }

    async fn poll_status(&self, job: &JobHandle) -> Result<JobStatusReport, ApiError> {
        let url = self.job_url(job, None)?;
        let bytes = self.get_job(job, url).await?;
        let status = decode_job_status(&bytes)?;
        stream_debug!(
            "Search job {} is {:?} with {} result(s)",
            mask_id(&job.id),
            status.state,
            status.result_count
        );
        Ok(status)
    }

    async fn fetch_page(
        &self,
        job: &JobHandle,
        offset: u64,
        limit: u64,
    ) -> Result<ResultPage, ApiError> {
        let mut url = self.job_url(job, Some("messages"))?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());

        let bytes = self.get_job(job, url).await?;
        let page = decode_messages(&bytes)?;
        stream_debug!(
            "Search job {} page at {} returned {} event(s)",
            mask_id(&job.id),
            offset,
            page.count
        );
        Ok(page)
    }
}

/// Session-affinity cookies set by the submission response, as `name → value`.
fn capture_cookies(response: &Response) -> BTreeMap<String, String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(parse_set_cookie)
        .collect()
}

fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Transport(format!("timeout: {err}"));
    }
    ApiError::Transport(err.to_string())
}
