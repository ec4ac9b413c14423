//! Command-line and environment configuration.

use std::collections::BTreeMap;

use clap::{ArgAction, Parser, ValueEnum};
use github::{GithubConfig, DEFAULT_API_URL};
use watcher::{DispatchRequest, WatchError, WatchSettings};

/// Trigger a GitHub Actions workflow and wait for the run it started.
#[derive(Parser)]
#[command(name = "runwatch", version, about, long_about = None)]
pub struct Cli {
    /// Token used to authenticate against the GitHub API.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Owner of the repository containing the workflow.
    #[arg(long, env = "RUNWATCH_OWNER")]
    pub owner: String,

    /// Repository containing the workflow.
    #[arg(long, env = "RUNWATCH_REPO")]
    pub repo: String,

    /// Git ref (branch or tag) to run the workflow on.
    #[arg(long = "ref", env = "RUNWATCH_REF", default_value = "main")]
    pub git_ref: String,

    /// Workflow id or workflow file name (e.g. `deploy.yml`).
    #[arg(long, env = "RUNWATCH_WORKFLOW_ID")]
    pub workflow_id: String,

    /// Seconds to wait before each poll.
    #[arg(long, env = "RUNWATCH_INTERVAL", default_value_t = 10.0)]
    pub interval: f64,

    /// Seconds to wait for the run to complete, measured from the dispatch.
    #[arg(long, env = "RUNWATCH_TIMEOUT", default_value_t = 600.0)]
    pub timeout: f64,

    /// Dispatch the workflow before watching. With `false`, only watch for a
    /// run started after this invocation began.
    #[arg(
        long,
        env = "RUNWATCH_TRIGGER_WORKFLOW",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub trigger_workflow: bool,

    /// Workflow dispatch input; may be repeated.
    #[arg(long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Format of the final run record printed to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Format of log lines written to stderr.
    #[arg(long, value_enum, env = "RUNWATCH_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Final run record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line.
    Text,
    /// The run record as JSON.
    Json,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// The workflow to dispatch and watch.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Configuration`] if any name is blank.
    pub fn dispatch_request(&self) -> Result<DispatchRequest, WatchError> {
        let inputs: BTreeMap<String, String> = self.inputs.iter().cloned().collect();
        Ok(DispatchRequest::new(&self.owner, &self.repo, &self.workflow_id, &self.git_ref)?
            .with_inputs(inputs))
    }

    /// Validated pacing and budget.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Configuration`] for a non-numeric, non-positive
    /// interval or a non-numeric, negative timeout.
    pub fn watch_settings(&self) -> Result<WatchSettings, WatchError> {
        WatchSettings::new(self.interval, self.timeout, self.trigger_workflow)
    }

    pub fn github_config(&self) -> GithubConfig {
        GithubConfig::new(self.token.clone()).with_api_url(self.api_url.clone())
    }
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.trim().is_empty() {
        return Err(format!("input key is empty in `{raw}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
