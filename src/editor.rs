//! Editor collaborator: hands the draft to the operator and waits.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

use crate::error::GitPrError;

/// Editor used when nothing else is configured.
pub const FALLBACK_EDITOR: &str = "/usr/bin/editor";

/// Opens a file for interactive editing and returns once the operator is
/// done with it.
#[cfg_attr(test, mockall::automock)]
pub trait DraftEditor {
    /// Blocks until the operator has saved and closed `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::Editor`] when the editor cannot be started or
    /// exits unsuccessfully.
    fn edit(&self, path: &Path) -> Result<(), GitPrError>;
}

/// Runs an editor command through the shell, bound to the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEditor {
    command: String,
}

impl SystemEditor {
    /// Creates an editor from a shell command such as `vim` or `code --wait`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Returns the configured command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl DraftEditor for SystemEditor {
    fn edit(&self, path: &Path) -> Result<(), GitPrError> {
        tracing::debug!(command = %self.command, path = %path.display(), "launching editor");

        let status = Command::new("sh")
            .arg("-c")
            .arg(format!("{} \"$@\"", self.command))
            .arg(&self.command)
            .arg(path)
            .status()
            .map_err(|error| GitPrError::Editor {
                message: format!("failed to launch `{}`: {error}", self.command),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(GitPrError::Editor {
                message: format!("`{}` exited with {status}", self.command),
            })
        }
    }
}

/// Picks the editor command: the configured value, then `GIT_EDITOR`, then
/// `EDITOR`, then [`FALLBACK_EDITOR`].
#[must_use]
pub fn resolve_editor(configured: Option<&str>) -> String {
    configured
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| non_empty_var("GIT_EDITOR"))
        .or_else(|| non_empty_var("EDITOR"))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_owned())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(OsString::into_string)
        .and_then(Result::ok)
}

/// Temporary file holding the draft between edits.
///
/// The file is removed when the value is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Creates the file and writes `content` into it.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::Io`] when the file cannot be created or written.
    pub fn create(content: &str) -> Result<Self, GitPrError> {
        let mut file = tempfile::Builder::new()
            .prefix(".gitpr")
            .suffix(".txt")
            .tempfile()
            .map_err(|error| GitPrError::io("create draft file", &error))?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|error| GitPrError::io("write draft file", &error))?;
        Ok(Self { file })
    }

    /// Returns the path handed to the editor.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the current content from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::Io`] when the file cannot be read.
    pub fn read(&self) -> Result<String, GitPrError> {
        fs::read_to_string(self.path()).map_err(|error| GitPrError::io("read draft file", &error))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DraftEditor, FALLBACK_EDITOR, ScratchFile, SystemEditor, resolve_editor};
    use crate::error::GitPrError;

    #[test]
    fn scratch_file_round_trips_and_is_removed() {
        let scratch = ScratchFile::create("Title\n\nBody").expect("scratch file should exist");
        let path = scratch.path().to_path_buf();

        assert!(
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(".gitpr"))
        );
        assert_eq!(scratch.read().expect("should read"), "Title\n\nBody");

        drop(scratch);
        assert!(!path.exists(), "scratch file should be removed on drop");
    }

    #[test]
    fn system_editor_passes_path_as_argument() {
        let scratch = ScratchFile::create("draft title\n").expect("scratch file should exist");
        let editor = SystemEditor::new("sed -i -e s/draft/edited/");

        editor.edit(scratch.path()).expect("editor should succeed");

        assert_eq!(scratch.read().expect("should read"), "edited title\n");
    }

    #[test]
    fn failing_editor_is_reported() {
        let scratch = ScratchFile::create("").expect("scratch file should exist");

        let error = SystemEditor::new("false")
            .edit(scratch.path())
            .expect_err("false exits non-zero");

        assert!(matches!(error, GitPrError::Editor { .. }));
    }

    #[rstest]
    #[case::configured(Some("nano"), Some("vim"), Some("emacs"), "nano")]
    #[case::git_editor(None, Some("vim"), Some("emacs"), "vim")]
    #[case::editor(Some("  "), None, Some("emacs"), "emacs")]
    #[case::fallback(None, None, None, FALLBACK_EDITOR)]
    fn editor_resolution_order(
        #[case] configured: Option<&str>,
        #[case] git_editor: Option<&str>,
        #[case] editor: Option<&str>,
        #[case] expected: &str,
    ) {
        let _guard = env_lock::lock_env([("GIT_EDITOR", git_editor), ("EDITOR", editor)]);

        assert_eq!(resolve_editor(configured), expected);
    }
}
