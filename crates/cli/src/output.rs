//! Rendering of the final run record.

use anyhow::{Context, Result};
use watcher::WorkflowRun;

use crate::args::OutputFormat;

pub fn render_run(run: &WorkflowRun, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(run).context("Failed to serialize run record")
        }
        OutputFormat::Text => Ok(format!(
            "Workflow run {} (#{}) {} with conclusion {}: {}",
            run.id,
            run.run_number,
            run.status,
            run.conclusion
                .map_or_else(|| "none".to_string(), |c| c.to_string()),
            run.html_url
        )),
    }
}
