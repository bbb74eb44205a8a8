//! Control directives embedded in the free-text request description.
//!
//! The operator edits a single plain-text surface. Besides the title and
//! description it may contain directive lines such as
//!
//! ```text
//! Review-By: alice Alice Example
//! Gitlab-Label: backend
//! Jenkins-Suite: smoke
//! ```
//!
//! Parsing runs as two line-oriented passes: [`strip`] drops operator
//! instructions (lines starting with `#`), then [`extract_directives`] pulls
//! out every line of the form `Word-Word: value` whose key belongs to the
//! known vocabulary. Other lines, including `Key: value` lines with an
//! unknown key, stay in the description untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Marker that starts an instructional comment line.
pub const COMMENT_MARKER: char = '#';

/// Directive keys understood by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectiveKey {
    /// `Review-By`: a reviewer handle followed by free text.
    ReviewBy,
    /// `Gitlab-Label`: comma-separated labels for a GitLab merge request.
    GitlabLabel,
    /// `Gitlab-Remove`: whether GitLab removes the source branch on merge.
    GitlabRemove,
    /// `Jenkins-Suite`: CI suite to run once the request exists.
    JenkinsSuite,
    /// `Github-Label`: comma-separated labels for a GitHub pull request.
    GithubLabel,
    /// `Bitbucket-Close`: whether Bitbucket closes the source branch.
    BitbucketClose,
}

impl DirectiveKey {
    /// Every known key, in rendering order.
    pub const ALL: [Self; 6] = [
        Self::ReviewBy,
        Self::GitlabLabel,
        Self::GitlabRemove,
        Self::JenkinsSuite,
        Self::GithubLabel,
        Self::BitbucketClose,
    ];

    /// Returns the key as written in the text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReviewBy => "Review-By",
            Self::GitlabLabel => "Gitlab-Label",
            Self::GitlabRemove => "Gitlab-Remove",
            Self::JenkinsSuite => "Jenkins-Suite",
            Self::GithubLabel => "Github-Label",
            Self::BitbucketClose => "Bitbucket-Close",
        }
    }
}

impl fmt::Display for DirectiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known directive key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirective(pub String);

impl fmt::Display for UnknownDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown directive key: {}", self.0)
    }
}

impl std::error::Error for UnknownDirective {}

impl FromStr for DirectiveKey {
    type Err = UnknownDirective;

    /// Keys are case-sensitive and must match exactly.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| UnknownDirective(value.to_owned()))
    }
}

/// Directive values keyed by [`DirectiveKey`], each list in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlDirectives {
    entries: BTreeMap<DirectiveKey, Vec<String>>,
}

impl ControlDirectives {
    /// Creates an empty directive set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value for `key`.
    pub fn push(&mut self, key: DirectiveKey, value: impl Into<String>) {
        self.entries.entry(key).or_default().push(value.into());
    }

    /// Returns every value recorded for `key`, in document order.
    #[must_use]
    pub fn values(&self, key: DirectiveKey) -> &[String] {
        self.entries.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Returns the first value for `key`, if any.
    #[must_use]
    pub fn first(&self, key: DirectiveKey) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }

    /// Returns true when no directive was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Serialises the directives back into `Key: value` lines, grouped by key.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| format!("{key}: {value}")))
            .collect()
    }
}

/// Returns the first value recorded for `key`, or `None`.
#[must_use]
pub fn directive(directives: &ControlDirectives, key: DirectiveKey) -> Option<&str> {
    directives.first(key)
}

/// Removes every line that starts with [`COMMENT_MARKER`].
///
/// The operation is idempotent.
///
/// # Example
///
/// ```
/// use git_pr::directives::strip;
///
/// assert_eq!(strip("# note\nTitle\n#Review-By: bob\nBody"), "Title\nBody");
/// ```
#[must_use]
pub fn strip(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with(COMMENT_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts directive lines from `text`.
///
/// Returns the directives together with the remaining text, trimmed of
/// surrounding whitespace.
#[must_use]
pub fn extract_directives(text: &str) -> (ControlDirectives, String) {
    let mut directives = ControlDirectives::new();
    let mut remainder = Vec::new();

    for line in text.lines() {
        match parse_directive_line(line) {
            Some((key, value)) => directives.push(key, value),
            None => remainder.push(line),
        }
    }

    (directives, remainder.join("\n").trim().to_owned())
}

/// Parses a single `Word-Word: value` line with a known key.
///
/// The key must be two capitalised ASCII words joined by a hyphen and be
/// followed by a colon and either a space or the end of the line. The value
/// is trimmed.
#[must_use]
pub fn parse_directive_line(line: &str) -> Option<(DirectiveKey, String)> {
    let (key, rest) = line.split_once(':')?;
    if !(rest.is_empty() || rest.starts_with(' ')) || !is_directive_shaped(key) {
        return None;
    }
    let parsed = key.parse::<DirectiveKey>().ok()?;
    Some((parsed, rest.trim().to_owned()))
}

fn is_directive_shaped(key: &str) -> bool {
    let Some((first, second)) = key.split_once('-') else {
        return false;
    };
    is_capitalised_word(first) && is_capitalised_word(second)
}

fn is_capitalised_word(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(head) = chars.next() else {
        return false;
    };
    let tail = chars.as_str();
    head.is_ascii_uppercase() && !tail.is_empty() && tail.chars().all(|c| c.is_ascii_lowercase())
}
