//! Shared value types for the workflow watcher domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (an interval is strictly positive, a
//! timeout is finite) and participate in the controller's decisions.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delay::Delay;
use crate::errors::WatchError;
use crate::{GitRef, Owner, RepositoryName, RunId, WorkflowId};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Lifecycle status of a workflow run as reported by the platform.
///
/// Only [`RunStatus::Completed`] is terminal. Statuses this crate does not
/// know about deserialize to [`RunStatus::Other`] and are treated as
/// in-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Requested,
    Queued,
    Pending,
    Waiting,
    InProgress,
    Completed,
    #[serde(other)]
    Other,
}

impl RunStatus {
    /// Returns `true` if the run has finished and its conclusion is meaningful.
    pub fn is_terminal(self) -> bool {
        self == Self::Completed
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Outcome of a completed workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    Neutral,
    TimedOut,
    ActionRequired,
    StartupFailure,
    Stale,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for RunConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
            Self::Neutral => "neutral",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
            Self::StartupFailure => "startup_failure",
            Self::Stale => "stale",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// A workflow run record as returned by both the listing and the single-run
/// endpoints.
///
/// Unknown fields in the platform payload are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Platform-assigned run identifier.
    pub id: RunId,

    /// Sequential run number within the workflow, shown in the platform UI.
    #[serde(default)]
    pub run_number: u64,

    /// Link to the run's page; included in failure messages.
    pub html_url: String,

    pub status: RunStatus,

    /// `None` until the run completes.
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,

    /// When the run actually started executing.
    ///
    /// Runs without a start time are never correlated.
    #[serde(default)]
    pub run_started_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Invocation inputs
// ---------------------------------------------------------------------------

/// The workflow to trigger and watch. Constructed once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub owner: Owner,
    pub repository: RepositoryName,
    pub workflow: WorkflowId,
    pub git_ref: GitRef,

    /// `workflow_dispatch` inputs forwarded verbatim in the dispatch body.
    pub inputs: BTreeMap<String, String>,
}

impl DispatchRequest {
    /// Builds a request from raw configuration strings.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Configuration`] naming the first blank field.
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        workflow: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Result<Self, WatchError> {
        Ok(Self {
            owner: Owner::new(owner).ok_or_else(|| WatchError::configuration("owner is empty"))?,
            repository: RepositoryName::new(repository)
                .ok_or_else(|| WatchError::configuration("repository is empty"))?,
            workflow: WorkflowId::new(workflow)
                .ok_or_else(|| WatchError::configuration("workflow id is empty"))?,
            git_ref: GitRef::new(git_ref).ok_or_else(|| WatchError::configuration("ref is empty"))?,
            inputs: BTreeMap::new(),
        })
    }

    /// Replaces the dispatch inputs.
    #[must_use]
    pub fn with_inputs(mut self, inputs: BTreeMap<String, String>) -> Self {
        self.inputs = inputs;
        self
    }
}

impl std::fmt::Display for DispatchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} workflow {} @ {}",
            self.owner, self.repository, self.workflow, self.git_ref
        )
    }
}

// ---------------------------------------------------------------------------

/// Pacing and budget for one invocation.
///
/// Treated as constants once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchSettings {
    interval: Delay,
    timeout: Duration,
    trigger_workflow: bool,
}

impl WatchSettings {
    /// Validates raw interval and timeout values (seconds).
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Configuration`] if `interval_secs` is not a finite
    /// number greater than zero, or if `timeout_secs` is not a finite,
    /// non-negative number.
    pub fn new(
        interval_secs: f64,
        timeout_secs: f64,
        trigger_workflow: bool,
    ) -> Result<Self, WatchError> {
        let interval = Delay::from_secs_f64(interval_secs)
            .map_err(|e| WatchError::configuration(format!("interval: {e}")))?;
        if interval.duration().is_zero() {
            return Err(WatchError::configuration("interval must be greater than zero"));
        }
        let timeout = Delay::from_secs_f64(timeout_secs)
            .map_err(|e| WatchError::configuration(format!("timeout: {e}")))?
            .duration();

        Ok(Self {
            interval,
            timeout,
            trigger_workflow,
        })
    }

    /// The pause issued before every poll.
    pub fn interval(&self) -> Delay {
        self.interval
    }

    /// Wall-clock budget measured from the dispatch moment.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the dispatch call is issued at all.
    pub fn trigger_workflow(&self) -> bool {
        self.trigger_workflow
    }
}
