use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use stream_logging::stream_debug;

use crate::{ApiError, Event, JobState, JobStatusReport, ResultPage};

#[derive(Debug, Deserialize)]
struct RawSubmission {
    id: Option<Value>,
}

// The API names the field `state` in some responses and `status` in others.
#[derive(Debug, Deserialize)]
struct RawJobStatus {
    state: Option<String>,
    status: Option<String>,
    #[serde(rename = "messageCount")]
    message_count: Option<u64>,
}

/// Extracts the job id from a submission response body.
pub fn decode_submission(body: &[u8]) -> Result<String, ApiError> {
    let raw: RawSubmission = serde_json::from_slice(body)
        .map_err(|err| ApiError::MalformedResponse(format!("job submission: {err}")))?;
    let id = match raw.id {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    };
    if id.is_empty() {
        return Err(ApiError::MalformedResponse(
            "job submission response has no id".to_string(),
        ));
    }
    Ok(id)
}

/// Normalizes a status response into one canonical [`JobStatusReport`].
pub fn decode_job_status(body: &[u8]) -> Result<JobStatusReport, ApiError> {
    let raw: RawJobStatus = serde_json::from_slice(body)
        .map_err(|err| ApiError::MalformedResponse(format!("job status: {err}")))?;
    let label = raw.state.or(raw.status).ok_or_else(|| {
        ApiError::MalformedResponse("job status response has no state".to_string())
    })?;
    Ok(JobStatusReport {
        state: JobState::from_label(&label),
        label,
        result_count: raw.message_count.unwrap_or(0),
    })
}

/// Decodes a messages response. Entries without a usable raw payload are
/// dropped; only a body that is not JSON at all is an error.
pub fn decode_messages(body: &[u8]) -> Result<ResultPage, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| ApiError::MalformedResponse(format!("job messages: {err}")))?;
    let messages = match value.get("messages") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    let events: Vec<Event> = messages.iter().filter_map(decode_message).collect();
    if events.len() < messages.len() {
        stream_debug!(
            "Dropped {} of {} messages without a decodable payload",
            messages.len() - events.len(),
            messages.len()
        );
    }
    Ok(ResultPage::new(events))
}

fn decode_message(message: &Value) -> Option<Event> {
    let raw = message.pointer("/map/_raw")?.as_str()?;
    let Value::Object(mut fields) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };
    let meta = normalize_meta(fields.remove("meta"));
    Some(Event { fields, meta })
}

/// Coerces whatever shape `meta` arrived in into a mapping.
pub fn normalize_meta(meta: Option<Value>) -> BTreeMap<String, Value> {
    match meta {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(map)) => map.into_iter().collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        Some(scalar) => BTreeMap::from([("0".to_string(), scalar)]),
    }
}
