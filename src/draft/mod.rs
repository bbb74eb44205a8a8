//! The request being prepared by the operator.

pub mod template;

use std::collections::BTreeSet;

use crate::backend::{BackendKind, Member};
use crate::directives::{ControlDirectives, DirectiveKey};

pub use template::{
    DraftTemplateContext, TemplateMember, render_branch_name, render_ci_comment,
    render_request_draft,
};

/// Marker that aborts the workflow when it starts the title.
pub const ABORT_MARKER: char = '!';

/// A validated request ready for submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// First non-comment line of the edited text.
    pub title: String,
    /// Remaining text with directive lines removed.
    pub body: String,
    /// Resolved reviewers, in directive order without duplicates.
    pub reviewers: Vec<Member>,
    /// Labels to apply.
    pub labels: BTreeSet<String>,
    /// Whether the source branch is removed on merge.
    pub remove_source_branch: bool,
    /// Handles mentioned on `Notify` lines of the body.
    pub notify_handles: Vec<String>,
    /// CI suite to run after submission.
    pub ci_suite: Option<String>,
}

impl Draft {
    /// Assembles a draft from the validated text and its directives.
    ///
    /// Label and remove-branch directives are read from the keys the backend
    /// understands; `remove_default` applies when no usable value is present.
    #[must_use]
    pub fn assemble(
        title: String,
        body: String,
        directives: &ControlDirectives,
        reviewers: Vec<Member>,
        backend: BackendKind,
        remove_default: bool,
    ) -> Self {
        let labels = backend
            .label_directive()
            .map(|key| parse_labels(directives.values(key)))
            .unwrap_or_default();

        let remove_source_branch = backend
            .remove_directive()
            .and_then(|key| directives.first(key))
            .and_then(parse_flag)
            .unwrap_or(remove_default);

        let ci_suite = directives
            .first(DirectiveKey::JenkinsSuite)
            .filter(|suite| !suite.is_empty())
            .map(ToOwned::to_owned);

        let notify_handles = notify_handles(&body);

        Self {
            title,
            body,
            reviewers,
            labels,
            remove_source_branch,
            notify_handles,
            ci_suite,
        }
    }

    /// Returns the labels joined with commas.
    #[must_use]
    pub fn labels_csv(&self) -> String {
        self.labels.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

/// Outcome of validating the edited text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedText {
    /// The operator asked to abort.
    Aborted {
        /// Title as entered, or empty when nothing was left.
        title: String,
    },
    /// Title and description ready for directive parsing.
    Accepted {
        /// First line.
        title: String,
        /// Remaining lines, trimmed.
        body: String,
    },
}

/// Splits stripped text into title and body.
///
/// An empty title or one starting with [`ABORT_MARKER`] aborts.
#[must_use]
pub fn validate_text(stripped: &str) -> ValidatedText {
    let trimmed = stripped.trim();
    let (first, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
    let title = first.trim().to_owned();

    if title.is_empty() || title.starts_with(ABORT_MARKER) {
        return ValidatedText::Aborted { title };
    }

    ValidatedText::Accepted {
        title,
        body: rest.trim().to_owned(),
    }
}

/// Splits label directive values on commas, dropping blanks.
#[must_use]
pub fn parse_labels(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parses a yes/no directive value.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Collects `@handle` mentions from lines starting with `Notify`.
#[must_use]
pub fn notify_handles(body: &str) -> Vec<String> {
    let mut handles: Vec<String> = Vec::new();
    for line in body.lines().filter(|line| line.trim_start().starts_with("Notify")) {
        for token in line.split_whitespace() {
            let Some(handle) = token.strip_prefix('@') else {
                continue;
            };
            let handle = handle.trim_end_matches([',', '.', ';', ':']);
            if !handle.is_empty() && !handles.iter().any(|known| known == handle) {
                handles.push(handle.to_owned());
            }
        }
    }
    handles
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Draft, ValidatedText, notify_handles, parse_flag, parse_labels, validate_text};
    use crate::backend::{BackendKind, Member};
    use crate::directives::extract_directives;

    #[rstest]
    #[case::title_and_body("Title\n\nBody line\nmore", "Title", "Body line\nmore")]
    #[case::title_only("  Title only  ", "Title only", "")]
    #[case::leading_blank_lines("\n\nTitle\nBody", "Title", "Body")]
    fn validate_accepts_titles(#[case] text: &str, #[case] title: &str, #[case] body: &str) {
        assert_eq!(
            validate_text(text),
            ValidatedText::Accepted {
                title: title.to_owned(),
                body: body.to_owned(),
            }
        );
    }

    #[rstest]
    #[case::bang("!abort this\nbody", "!abort this")]
    #[case::empty("   \n  ", "")]
    fn validate_aborts(#[case] text: &str, #[case] title: &str) {
        assert_eq!(
            validate_text(text),
            ValidatedText::Aborted {
                title: title.to_owned()
            }
        );
    }

    #[test]
    fn labels_split_on_commas_and_deduplicate() {
        let values = vec!["backend, perf".to_owned(), "perf".to_owned(), " ".to_owned()];
        let labels: Vec<_> = parse_labels(&values).into_iter().collect();
        assert_eq!(labels, vec!["backend", "perf"]);
    }

    #[rstest]
    #[case("yes", Some(true))]
    #[case("TRUE", Some(true))]
    #[case("0", Some(false))]
    #[case("maybe", None)]
    #[case("", None)]
    fn flags_parse(#[case] value: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_flag(value), expected);
    }

    #[test]
    fn notify_handles_are_collected_once() {
        let body = "Intro @not-a-notify\nNotify @infra/dp, @bob\nNotify @bob.";
        assert_eq!(notify_handles(body), vec!["infra/dp", "bob"]);
    }

    #[test]
    fn assemble_reads_backend_specific_directives() {
        let (directives, body) = extract_directives(
            "Body\nGitlab-Label: a, b\nGithub-Label: ignored\nGitlab-Remove: no\nJenkins-Suite: smoke",
        );
        let reviewers = vec![Member::new("bob", "Bob")];

        let draft = Draft::assemble(
            "Title".to_owned(),
            body,
            &directives,
            reviewers.clone(),
            BackendKind::GitLab,
            true,
        );

        assert_eq!(draft.labels_csv(), "a,b");
        assert!(!draft.remove_source_branch);
        assert_eq!(draft.ci_suite.as_deref(), Some("smoke"));
        assert_eq!(draft.reviewers, reviewers);
        assert_eq!(draft.body, "Body");
    }

    #[test]
    fn assemble_falls_back_to_defaults() {
        let (directives, body) = extract_directives("Body\nJenkins-Suite: \nGitlab-Remove: later");

        let draft = Draft::assemble(
            "Title".to_owned(),
            body,
            &directives,
            Vec::new(),
            BackendKind::GitLab,
            true,
        );

        assert!(draft.remove_source_branch, "unparseable value keeps default");
        assert_eq!(draft.ci_suite, None, "empty suite means no CI");
        assert!(draft.labels.is_empty());
    }
}
