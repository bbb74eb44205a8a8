//! Logging setup and structured workflow telemetry.
//!
//! Diagnostics go through `tracing` to stderr. Separately, the workflow
//! reports the milestones an operator needs for recovery (was the request
//! created, which follow-ups ran) as [`TelemetryEvent`]s through a
//! [`TelemetrySink`].

use std::io;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global tracing subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`. Only the first call in a
/// process has an effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(io::stderr).with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(io::stderr).with_target(false))
            .try_init()
            .ok();
    }
}

/// A structured telemetry event emitted by the review request workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// The operator aborted the draft.
    DraftAborted,
    /// The backend rejected a submission attempt; the draft is edited again.
    SubmissionRejected {
        /// One-based attempt number.
        attempt: u32,
        /// Rejection detail.
        message: String,
    },
    /// The request now exists on the backend.
    RequestSubmitted {
        /// Browser URL of the request.
        web_url: String,
        /// Attempt that succeeded.
        attempt: u32,
    },
    /// Approvers were assigned.
    ApproversAssigned {
        /// Number of approvers.
        count: usize,
    },
    /// A CI build was scheduled.
    CiTriggered {
        /// Build URL.
        url: String,
    },
    /// Triggering CI failed; the request is unaffected.
    CiFailed {
        /// Failure detail.
        message: String,
    },
    /// The CI result comment was posted.
    CommentPosted,
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for local debugging and is not transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::TelemetryEvent;

    #[rstest]
    #[case::unit(TelemetryEvent::DraftAborted, json!({"type": "draft_aborted"}))]
    #[case::submitted(
        TelemetryEvent::RequestSubmitted { web_url: "https://x/1".to_owned(), attempt: 2 },
        json!({"type": "request_submitted", "web_url": "https://x/1", "attempt": 2})
    )]
    #[case::ci_failed(
        TelemetryEvent::CiFailed { message: "queue".to_owned() },
        json!({"type": "ci_failed", "message": "queue"})
    )]
    fn events_serialise_with_type_tag(
        #[case] event: TelemetryEvent,
        #[case] expected: serde_json::Value,
    ) {
        let value = serde_json::to_value(&event).expect("event should serialise");
        assert_eq!(value, expected);
    }
}
