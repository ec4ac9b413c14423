//! Core domain for `runwatch`: trigger a remote workflow and wait for the run
//! it produced.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used by the watcher, plus the dispatch-and-poll
//! controller itself. Infrastructure crates implement the traits defined here;
//! they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate does no network I/O. It
//! defines *what* is needed from the workflow platform; the `github` crate
//! defines *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RunId`, `WorkflowId`, `GitRef`, etc.) |
//! | [`types`] | Value types (`Timestamp`, `WorkflowRun`, `DispatchRequest`, `WatchSettings`) |
//! | [`errors`] | Client and invocation error types |
//! | [`delay`] | The cancellable pause that paces polling |
//! | [`client`] | `WorkflowClient` and `Clock` port traits |
//! | [`controller`] | The dispatch/correlate/poll state machine and its `Verdict` |

pub mod client;
pub mod controller;
pub mod delay;
pub mod errors;
pub mod identifiers;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::{Clock, SystemClock, TriggerEvent, WorkflowClient};
pub use controller::{
    correlate, decide, CandidateRun, DispatchController, DispatchMoment, Observation, Step,
    Verdict,
};
pub use delay::{Delay, DelayError};
pub use errors::{ClientError, ClientOperation, WatchError};
pub use identifiers::{GitRef, InvocationId, Owner, RepositoryName, RunId, WorkflowId};
pub use types::{
    DispatchRequest, RunConclusion, RunStatus, Timestamp, WatchSettings, WorkflowRun,
};
