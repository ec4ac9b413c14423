//! GitHub Actions infrastructure adapter.
//!
//! Implements the [`watcher::WorkflowClient`] trait against the GitHub REST
//! API using [`reqwest`]:
//!
//! | Trait method | Endpoint |
//! |--------------|----------|
//! | `dispatch` | `POST /repos/{owner}/{repo}/actions/workflows/{workflow_id}/dispatches` |
//! | `list_runs` | `GET /repos/{owner}/{repo}/actions/workflows/{workflow_id}/runs` |
//! | `get_run` | `GET /repos/{owner}/{repo}/actions/runs/{run_id}` |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Authentication
//! headers, API versioning, HTTP status classification and payload decoding
//! are handled here; the [`watcher`] crate never sees them.

mod client;
mod responses;

pub use client::{GithubClient, GithubConfig, DEFAULT_API_URL};
