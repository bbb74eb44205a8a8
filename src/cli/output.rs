//! Output formatting utilities for CLI operations.

use std::io::{self, Write};

use git_pr::{GitPrError, WorkflowOutcome};

fn io_error(error: &io::Error) -> GitPrError {
    GitPrError::Io {
        message: error.to_string(),
    }
}

/// Writes a line to stdout.
pub fn write_line(message: &str) -> Result<(), GitPrError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{message}").map_err(|error| io_error(&error))
}

/// Writes the result of a create run to stdout.
pub fn write_outcome(outcome: &WorkflowOutcome) -> Result<(), GitPrError> {
    let mut stdout = io::stdout().lock();
    write_outcome_to(&mut stdout, outcome)
}

/// Writes the result of a create run to the given writer.
pub fn write_outcome_to<W: Write>(
    writer: &mut W,
    outcome: &WorkflowOutcome,
) -> Result<(), GitPrError> {
    match outcome {
        WorkflowOutcome::Aborted { reason } => {
            writeln!(writer, "Aborted ({reason}); nothing was submitted.")
                .map_err(|e| io_error(&e))
        }
        WorkflowOutcome::Submitted(report) => {
            writeln!(writer, "Review request: {}", report.result.web_url)
                .map_err(|e| io_error(&e))?;
            if !report.draft.reviewers.is_empty() {
                let handles: Vec<_> = report
                    .draft
                    .reviewers
                    .iter()
                    .map(|member| member.handle.as_str())
                    .collect();
                writeln!(writer, "Reviewers: {}", handles.join(", ")).map_err(|e| io_error(&e))?;
            }
            if let Some(url) = report.ci_url.as_deref() {
                writeln!(writer, "CI build: {url}").map_err(|e| io_error(&e))?;
            }
            Ok(())
        }
    }
}

/// Writes a JSON record to stdout, pretty-printed.
pub fn write_record(record: &serde_json::Value) -> Result<(), GitPrError> {
    let rendered = serde_json::to_string_pretty(record).map_err(|error| GitPrError::Io {
        message: error.to_string(),
    })?;
    write_line(&rendered)
}
