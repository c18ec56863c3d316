use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use stream_logging::{stream_debug, stream_warn};
use tokio::task::JoinHandle;

use crate::{ApiError, ApiSettings, ServiceConfig};

/// Posts activity records to the log service's receiver endpoint.
#[derive(Debug, Clone)]
pub struct RecordForwarder {
    http: reqwest::Client,
    endpoint: Option<String>,
    site: String,
}

impl RecordForwarder {
    pub fn new(config: &ServiceConfig, settings: &ApiSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.receiver_endpoint().map(ToOwned::to_owned),
            site: config.site_url.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Sends `record`, tagged with the site URL, without waiting for the
    /// receiver. Must be called from within a tokio runtime.
    ///
    /// Callers may drop the returned handle; failures are logged either way.
    pub fn insert_record(
        &self,
        mut record: Map<String, Value>,
    ) -> Result<JoinHandle<Result<(), ApiError>>, ApiError> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or(ApiError::NotConfigured("receiver endpoint"))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        record.insert("site".to_string(), Value::String(self.site.clone()));
        let body = serde_json::to_vec(&Value::Object(record))
            .map_err(|err| ApiError::Transport(format!("failed to encode record: {err}")))?;
        let request = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        Ok(runtime.spawn(async move {
            match request.send().await {
                Ok(response) => {
                    stream_debug!("Receiver answered {}", response.status());
                    Ok(())
                }
                Err(err) => {
                    stream_warn!("Failed to forward activity record: {}", err);
                    Err(ApiError::Transport(err.to_string()))
                }
            }
        }))
    }
}
