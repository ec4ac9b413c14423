//! Request bodies, response envelopes, and HTTP error classification.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use watcher::{ClientError, Timestamp, WorkflowRun};

/// Body of the `workflow_dispatch` request.
#[derive(Debug, Serialize)]
pub(crate) struct DispatchBody<'a> {
    #[serde(rename = "ref")]
    pub git_ref: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: &'a BTreeMap<String, String>,
}

/// Envelope of the workflow run listing.
#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRunsPage {
    #[serde(default)]
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}

/// GitHub's standard error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub(crate) fn decode<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode {
        message: e.to_string(),
    })
}

/// Maps a non-success response to a [`ClientError`].
///
/// GitHub signals primary rate-limit exhaustion with 403 plus
/// `x-ratelimit-remaining: 0`, and secondary limits with 403 or 429 plus
/// `retry-after`.
pub(crate) fn classify(status: u16, headers: &HeaderMap, body: &str) -> ClientError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let exhausted = header_str(headers, "x-ratelimit-remaining") == Some("0");
    let retry_after = retry_after(headers, exhausted);

    match status {
        429 => ClientError::RateLimited { retry_after },
        403 if exhausted || retry_after.is_some() => ClientError::RateLimited { retry_after },
        401 | 403 => ClientError::Unauthorized { status, message },
        404 => ClientError::NotFound { message },
        _ => ClientError::Api { status, message },
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Reads `retry-after` (seconds). `x-ratelimit-reset` (epoch seconds) is sent
/// on every response, so it only counts once the quota is `exhausted`.
fn retry_after(headers: &HeaderMap, exhausted: bool) -> Option<Duration> {
    if let Some(secs) = header_str(headers, "retry-after").and_then(|v| v.parse::<u64>().ok()) {
        return Some(Duration::from_secs(secs));
    }
    if !exhausted {
        return None;
    }
    let reset = header_str(headers, "x-ratelimit-reset")?.parse::<i64>().ok()?;
    let now = Timestamp::now().as_datetime().timestamp();
    Some(Duration::from_secs(u64::try_from(reset - now).unwrap_or(0)))
}
