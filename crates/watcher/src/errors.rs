//! Top-level error types for the workflow watcher.
//!
//! [`WatchError`] covers every condition that ends an invocation with a
//! failure. [`ClientError`] is what a [`crate::WorkflowClient`] implementation
//! reports for a failed remote call; the controller wraps it, unretried, as
//! [`WatchError::Transport`].

use std::time::Duration;

use thiserror::Error;

use crate::RunId;

// ---------------------------------------------------------------------------
// Client errors
// ---------------------------------------------------------------------------

/// The remote call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOperation {
    Dispatch,
    ListRuns,
    GetRun,
}

impl std::fmt::Display for ClientOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Dispatch => "dispatch",
            Self::ListRuns => "list_runs",
            Self::GetRun => "get_run",
        };
        f.write_str(s)
    }
}

/// Failure reported by a workflow API client.
///
/// The controller never retries on these; the classification exists so the
/// operator sees *why* the call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The credential was missing, invalid, or lacks the required scope.
    #[error("authentication failed (HTTP {status}): {message}")]
    Unauthorized {
        /// 401 or 403.
        status: u16,
        message: String,
    },

    /// The repository, workflow, or run does not exist (or is not visible to
    /// the credential).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The platform's rate limit was exhausted.
    #[error("rate limited{}", .retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited {
        /// Derived from `Retry-After` or `x-ratelimit-reset` when present.
        retry_after: Option<Duration>,
    },

    /// Any other non-success HTTP response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// A response arrived but its body could not be decoded.
    #[error("could not decode response: {message}")]
    Decode { message: String },
}

// ---------------------------------------------------------------------------
// Invocation errors
// ---------------------------------------------------------------------------

/// Every way a single dispatch-and-watch invocation can fail.
#[derive(Debug, Error)]
pub enum WatchError {
    /// An input failed basic validity. Raised before any remote call.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A remote call failed; the poll loop was aborted.
    #[error("{operation} call failed")]
    Transport {
        operation: ClientOperation,
        #[source]
        source: ClientError,
    },

    /// No run matching the dispatch could be found within the budget.
    #[error(
        "Timed out. A related workflow run could not be found within {} seconds.",
        .timeout.as_secs()
    )]
    CorrelationTimeout { timeout: Duration },

    /// A run was found but had not completed within the budget.
    #[error(
        "Timed out. Workflow run {run_id} took more than {} seconds to complete. See {html_url} for details.",
        .timeout.as_secs()
    )]
    CompletionTimeout {
        timeout: Duration,
        run_id: RunId,
        html_url: String,
    },

    /// The watched run completed with a failing conclusion.
    #[error("Workflow run {run_id} failed. See {html_url} for details.")]
    WatchedRunFailed { run_id: RunId, html_url: String },
}

impl WatchError {
    /// Shorthand for [`WatchError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn transport(operation: ClientOperation) -> impl FnOnce(ClientError) -> Self {
        move |source| Self::Transport { operation, source }
    }
}
