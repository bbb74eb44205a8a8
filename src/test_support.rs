//! Deterministic collaborators for driving the workflow in tests.
//!
//! ```
//! use git_pr::test_support::ScriptedEditor;
//!
//! let editor = ScriptedEditor::new(["Fix the parser\n\nDetails"]);
//! assert_eq!(editor.remaining(), 1);
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::editor::DraftEditor;
use crate::error::GitPrError;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Editor that replaces the draft with the next scripted text on each call.
///
/// The text found in the file before each edit is kept, so tests can check
/// what the operator was shown.
#[derive(Debug, Default)]
pub struct ScriptedEditor {
    scripts: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedEditor {
    /// Creates an editor that writes `scripts` in order.
    #[must_use]
    pub fn new<I, S>(scripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scripts: Mutex::new(scripts.into_iter().map(Into::into).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of scripted texts not yet used.
    #[must_use]
    pub fn remaining(&self) -> usize {
        lock(&self.scripts).len()
    }

    /// Returns the draft text as it was before each edit.
    #[must_use]
    pub fn seen(&self) -> Vec<String> {
        lock(&self.seen).clone()
    }
}

impl DraftEditor for ScriptedEditor {
    fn edit(&self, path: &Path) -> Result<(), GitPrError> {
        let before =
            fs::read_to_string(path).map_err(|error| GitPrError::io("read draft file", &error))?;
        lock(&self.seen).push(before);

        let Some(next) = lock(&self.scripts).pop_front() else {
            return Err(GitPrError::Editor {
                message: "scripted editor ran out of drafts".to_owned(),
            });
        };
        fs::write(path, next).map_err(|error| GitPrError::io("write draft file", &error))
    }
}

/// Telemetry sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingTelemetrySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetrySink {
    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<TelemetryEvent> {
        lock(&self.events).clone()
    }

    /// Removes and returns the recorded events.
    #[must_use]
    pub fn take(&self) -> Vec<TelemetryEvent> {
        lock(&self.events).drain(..).collect()
    }
}

impl TelemetrySink for RecordingTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        lock(&self.events).push(event);
    }
}
