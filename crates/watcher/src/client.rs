//! Port definitions for the remote workflow platform and the wall clock.
//!
//! Infrastructure crates implement [`WorkflowClient`]; the controller only
//! ever sees the trait object. Implementations are stateless handles and may
//! be shared freely between invocations.

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::{DispatchRequest, Owner, RepositoryName, RunId, Timestamp, WorkflowRun};

/// The triggering-event kind used to filter run listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Runs created through the dispatch endpoint.
    WorkflowDispatch,
}

impl TriggerEvent {
    /// Returns the platform's name for this event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkflowDispatch => "workflow_dispatch",
        }
    }
}

/// Remote workflow operations the controller depends on.
///
/// None of these are retried by the caller; an `Err` ends the invocation.
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Requests a new run of `request.workflow` on `request.git_ref`.
    ///
    /// The platform returns no run identifier.
    async fn dispatch(&self, request: &DispatchRequest) -> Result<(), ClientError>;

    /// Lists recent runs of the request's workflow on its branch, filtered to
    /// `event`, in the platform's own order (most recent first).
    async fn list_runs(
        &self,
        request: &DispatchRequest,
        event: TriggerEvent,
    ) -> Result<Vec<WorkflowRun>, ClientError>;

    /// Fetches the current state of one run.
    async fn get_run(
        &self,
        owner: &Owner,
        repository: &RepositoryName,
        run_id: RunId,
    ) -> Result<WorkflowRun, ClientError>;
}

/// Source of wall-clock time for the dispatch moment.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
