//! GitLab merge requests (REST API v4).

use http::header::HeaderName;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use super::models::{
    BranchPair, Capabilities, Member, MemberStatus, MergeOutcome, ProjectRef, SubmissionResult,
    encode_segment,
};
use super::{BackendKind, HostingBackend, decode};
use crate::draft::Draft;
use crate::error::GitPrError;
use crate::transport::RestClient;

/// Header carrying the personal access token.
pub const TOKEN_HEADER: HeaderName = HeaderName::from_static("private-token");

const PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct ApiMember {
    id: u64,
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: Option<String>,
}

impl From<ApiMember> for Member {
    fn from(api: ApiMember) -> Self {
        Self::new(api.username, api.name)
            .with_numeric_id(api.id)
            .with_status(MemberStatus::from_state(api.state.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
struct ApiMergeRequest {
    id: u64,
    iid: u64,
    project_id: u64,
    web_url: String,
}

impl From<ApiMergeRequest> for SubmissionResult {
    fn from(api: ApiMergeRequest) -> Self {
        Self {
            request_id: api.id.to_string(),
            internal_sequence_id: api.iid,
            host_project_id: api.project_id.to_string(),
            web_url: api.web_url,
        }
    }
}

/// GitLab backend implementing the full approver and comment path.
#[derive(Debug, Clone)]
pub struct GitLabBackend {
    client: RestClient,
    project: ProjectRef,
}

impl GitLabBackend {
    /// Creates a backend for `project`.
    #[must_use]
    pub const fn new(client: RestClient, project: ProjectRef) -> Self {
        Self { client, project }
    }

    fn request_path(submission: &SubmissionResult, suffix: &str) -> String {
        format!(
            "projects/{}/merge_requests/{}/{suffix}",
            submission.host_project_id, submission.internal_sequence_id
        )
    }
}

impl HostingBackend for GitLabBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GitLab
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            approvers: true,
            comments: true,
            merge: true,
        }
    }

    fn team_members(&self, team: &str) -> Result<Vec<Member>, GitPrError> {
        let url = self
            .client
            .url(&format!("groups/{}/members", encode_segment(team)));
        let records = self
            .client
            .fetch_all(Method::GET, &url, Some(&[("per_page", PAGE_SIZE)]))?;

        records
            .into_iter()
            .map(|record| decode::<ApiMember>("group members", record).map(Member::from))
            .collect()
    }

    fn submit(
        &self,
        draft: &Draft,
        branches: &BranchPair,
    ) -> Result<SubmissionResult, GitPrError> {
        let reviewer_ids: Vec<u64> = draft
            .reviewers
            .iter()
            .filter_map(|member| member.numeric_id)
            .collect();
        let payload = json!({
            "source_branch": branches.source,
            "target_branch": branches.target,
            "title": draft.title,
            "description": draft.body,
            "labels": draft.labels_csv(),
            "remove_source_branch": draft.remove_source_branch,
            "reviewer_ids": reviewer_ids,
        });
        let url = self.client.url(&format!(
            "projects/{}/merge_requests",
            self.project.encoded_path()
        ));

        let record = self
            .client
            .execute(Method::POST, &url, None, Some(&payload))?;
        decode::<ApiMergeRequest>("merge request", record).map(SubmissionResult::from)
    }

    fn set_approvers(
        &self,
        submission: &SubmissionResult,
        approvers: &[Member],
    ) -> Result<(), GitPrError> {
        let approver_ids: Vec<u64> = approvers
            .iter()
            .filter_map(|member| member.numeric_id)
            .collect();
        let payload = json!({
            "approver_ids": approver_ids,
            "approver_group_ids": [],
        });
        let url = self.client.url(&Self::request_path(submission, "approvers"));

        self.client
            .execute(Method::PUT, &url, None, Some(&payload))?;
        Ok(())
    }

    fn post_comment(&self, submission: &SubmissionResult, body: &str) -> Result<(), GitPrError> {
        let url = self.client.url(&Self::request_path(submission, "notes"));
        self.client
            .execute(Method::POST, &url, None, Some(&json!({ "body": body })))?;
        Ok(())
    }

    fn merge(&self, branches: &BranchPair) -> Result<MergeOutcome, GitPrError> {
        let url = self.client.url(&format!(
            "projects/{}/merge_requests",
            self.project.encoded_path()
        ));
        let query = [
            ("state", "opened"),
            ("source_branch", branches.source.as_str()),
            ("target_branch", branches.target.as_str()),
        ];
        let records = self.client.fetch_all(Method::GET, &url, Some(&query))?;

        let open: Vec<ApiMergeRequest> = records
            .into_iter()
            .map(|record| decode("merge request", record))
            .collect::<Result<_, _>>()?;
        let [request] = <[ApiMergeRequest; 1]>::try_from(open).map_err(|open| {
            GitPrError::AmbiguousRequest {
                source_branch: branches.source.clone(),
                target_branch: branches.target.clone(),
                count: open.len(),
            }
        })?;

        let merge_url = self.client.url(&format!(
            "projects/{}/merge_requests/{}/merge",
            request.project_id, request.iid
        ));
        let merged = self.client.execute(Method::PUT, &merge_url, None, None)?;
        let web_url = merged
            .get("web_url")
            .and_then(Value::as_str)
            .map_or(request.web_url, ToOwned::to_owned);

        Ok(MergeOutcome::Merged { web_url })
    }

    fn test(&self, path: &str) -> Result<Value, GitPrError> {
        let url = self.client.url(path);
        Ok(self.client.execute(Method::GET, &url, None, None)?)
    }
}
