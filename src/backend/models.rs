//! Backend-neutral models exchanged between the workflow and backends.

use serde::{Deserialize, Serialize};

/// Membership state reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// The account can be assigned work.
    Active,
    /// The account has been blocked by an administrator.
    Blocked,
    /// The backend does not report a state.
    #[default]
    Unknown,
}

impl MemberStatus {
    /// Maps a backend `state` string.
    #[must_use]
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some("active") => Self::Active,
            Some("blocked" | "banned" | "blocked_pending_approval") => Self::Blocked,
            _ => Self::Unknown,
        }
    }
}

/// A person in the backend's team or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Login handle, unique within the backend.
    pub handle: String,
    /// Human readable name.
    pub display_name: String,
    /// Backend numeric identifier, needed for approver assignment.
    pub numeric_id: Option<u64>,
    /// Membership state.
    pub status: MemberStatus,
}

impl Member {
    /// Creates an active member without a numeric id.
    #[must_use]
    pub fn new(handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display_name: display_name.into(),
            numeric_id: None,
            status: MemberStatus::Active,
        }
    }

    /// Sets the numeric id.
    #[must_use]
    pub const fn with_numeric_id(mut self, id: u64) -> Self {
        self.numeric_id = Some(id);
        self
    }

    /// Sets the membership state.
    #[must_use]
    pub const fn with_status(mut self, status: MemberStatus) -> Self {
        self.status = status;
        self
    }
}

/// Source and target branches of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchPair {
    /// Branch the changes were pushed to.
    pub source: String,
    /// Branch the changes should land on.
    pub target: String,
}

/// Repository coordinates on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRef {
    /// Owner path; may contain `/` for nested GitLab groups.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl ProjectRef {
    /// Creates a project reference.
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Returns `owner/repo`.
    #[must_use]
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Returns `owner/repo` encoded as a single path segment.
    #[must_use]
    pub fn encoded_path(&self) -> String {
        encode_segment(&self.full_path())
    }
}

/// Percent-encodes a value so it fits in one URL path segment.
#[must_use]
pub fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Identifiers assigned by the backend after a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Backend-global request id.
    pub request_id: String,
    /// Backend-local sequence number used in follow-up URLs.
    pub internal_sequence_id: u64,
    /// Project identifier used in follow-up URLs.
    pub host_project_id: String,
    /// Browser URL of the request.
    pub web_url: String,
}

/// Result of a merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The request was merged.
    Merged {
        /// Web URL of the merged request.
        web_url: String,
    },
    /// The backend does not merge requests from this tool.
    Unsupported,
}

/// Optional follow-up operations a backend implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Assigns required approvers after creation.
    pub approvers: bool,
    /// Posts comments onto an existing request.
    pub comments: bool,
    /// Merges an open request.
    pub merge: bool,
}
