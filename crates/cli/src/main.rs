//! `runwatch` CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags and environment variables via `clap`,
//!    validated into domain types before any remote call.
//! 2. **Wire observability**: configure `tracing-subscriber` (text or JSON on
//!    stderr) and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry
//!    OTLP exporter.
//! 3. **Construct infrastructure**: create the `GithubClient` and inject it
//!    into the `DispatchController`.
//! 4. **Report the verdict**: log every failure, print the final run record on
//!    success, and map the outcome to the process exit code.

mod args;
mod output;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use github::GithubClient;
use tracing::{error, info, info_span, Instrument};
use watcher::{DispatchController, InvocationId};

use crate::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match telemetry::init(cli.log_format) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let invocation_id = InvocationId::new_random();
    let code = match run(&cli)
        .instrument(info_span!("runwatch", invocation_id = %invocation_id))
        .await
    {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    let request = cli.dispatch_request()?;
    let settings = cli.watch_settings()?;
    let client = GithubClient::new(cli.github_config()).context("Failed to create GitHub client")?;

    let verdict = DispatchController::new(Arc::new(client), settings)
        .run(&request)
        .await?;

    let failures = verdict.failures();
    if !failures.is_empty() {
        for failure in &failures {
            error!("{failure}");
        }
        return Ok(ExitCode::FAILURE);
    }

    if let Some(run) = verdict.run() {
        info!(run_id = %run.id, "Watched workflow run succeeded");
        println!("{}", output::render_run(run, cli.output)?);
    }
    Ok(ExitCode::SUCCESS)
}
