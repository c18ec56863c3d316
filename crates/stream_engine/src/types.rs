use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of events requested per page unless the caller asks otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Remote search job identifier plus the session-affinity cookies every
/// follow-up call against that job must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: String,
    pub cookies: BTreeMap<String, String>,
}

impl JobHandle {
    pub fn new(id: impl Into<String>, cookies: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            cookies,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }

    /// `Cookie` header value for follow-up calls, if the job has any cookies.
    pub(crate) fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Gathering,
    Done,
    Cancelled,
    Error,
}

impl JobState {
    /// Maps a remote state label onto the canonical state.
    ///
    /// Unknown labels are treated as still gathering so the client keeps polling.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "NOT STARTED" => JobState::Submitted,
            "GATHERING RESULTS" | "FORCE PAUSED" => JobState::Gathering,
            "DONE GATHERING RESULTS" => JobState::Done,
            "CANCELLED" | "CANCELED" => JobState::Cancelled,
            other if other.contains("ERROR") || other.contains("FAILED") => JobState::Error,
            other => {
                stream_logging::stream_warn!("Unknown search job state {:?}", other);
                JobState::Gathering
            }
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Cancelled | JobState::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Submitted => write!(f, "NOT STARTED"),
            JobState::Gathering => write!(f, "GATHERING RESULTS"),
            JobState::Done => write!(f, "DONE GATHERING RESULTS"),
            JobState::Cancelled => write!(f, "CANCELLED"),
            JobState::Error => write!(f, "ERROR"),
        }
    }
}

/// Result of one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    pub state: JobState,
    /// The label exactly as the remote service reported it.
    pub label: String,
    pub result_count: u64,
}

/// One decoded activity record from a result page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub meta: BTreeMap<String, Value>,
}

impl Event {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field rendered as text; strings are returned unquoted.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultPage {
    pub events: Vec<Event>,
    /// Number of decoded events; may be below the requested limit.
    pub count: u64,
}

impl ResultPage {
    pub fn new(events: Vec<Event>) -> Self {
        let count = events.len() as u64;
        Self { events, count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("API call error: {0}")]
    Transport(String),
    #[error("API call error: http status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Missing configuration is a normal condition, not a failure to report.
    pub fn is_soft(&self) -> bool {
        matches!(self, ApiError::NotConfigured(_))
    }
}
