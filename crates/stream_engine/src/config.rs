use std::time::Duration;

/// Connection details for the remote log service. Every field is optional;
/// missing values disable the matching feature instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceConfig {
    pub receiver_endpoint: Option<String>,
    pub api_endpoint: Option<String>,
    pub access_id: Option<String>,
    pub access_key: Option<String>,
    /// Query expression every search starts from.
    pub base_query: Option<String>,
    /// Site URL used to scope searches and tag forwarded records.
    pub site_url: String,
}

impl ServiceConfig {
    pub fn receiver_endpoint(&self) -> Option<&str> {
        non_empty(&self.receiver_endpoint)
    }

    pub fn api_endpoint(&self) -> Option<&str> {
        non_empty(&self.api_endpoint)
    }

    /// Access id and key, only when both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.access_id)?, non_empty(&self.access_key)?))
    }

    pub fn base_query(&self) -> &str {
        self.base_query.as_deref().unwrap_or_default()
    }

    pub fn search_enabled(&self) -> bool {
        self.api_endpoint().is_some() && self.credentials().is_some()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub connect_timeout: Duration,
    pub submit_timeout: Duration,
    /// Per-attempt timeout for status and page calls.
    pub request_timeout: Duration,
    /// Total attempts for status and page calls on transport failure.
    pub attempts: u32,
    pub max_body_bytes: u64,
    pub page_size: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            attempts: 3,
            max_body_bytes: 8 * 1024 * 1024,
            page_size: crate::DEFAULT_PAGE_SIZE,
        }
    }
}
