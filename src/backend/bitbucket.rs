//! Bitbucket Cloud pull requests (REST API 2.0).
//!
//! Bitbucket paginates inside the response body, so list endpoints go
//! through [`RestClient::fetch_values`]. Reviewers are sent by username and
//! there is no separate approver step.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use super::models::{
    BranchPair, Capabilities, Member, MergeOutcome, ProjectRef, SubmissionResult, encode_segment,
};
use super::{BackendKind, HostingBackend, decode, skipped};
use crate::draft::Draft;
use crate::error::GitPrError;
use crate::transport::RestClient;

const MERGE_STRATEGY: &str = "merge_commit";

#[derive(Debug, Deserialize)]
struct ApiUser {
    #[serde(alias = "nickname")]
    username: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiHref {
    #[serde(default)]
    href: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiLinks {
    #[serde(default)]
    html: ApiHref,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    id: u64,
    #[serde(default)]
    links: ApiLinks,
}

/// Bitbucket backend.
#[derive(Debug, Clone)]
pub struct BitbucketBackend {
    client: RestClient,
    project: ProjectRef,
}

impl BitbucketBackend {
    /// Creates a backend for `project`.
    #[must_use]
    pub const fn new(client: RestClient, project: ProjectRef) -> Self {
        Self { client, project }
    }

    fn pull_requests_path(&self) -> String {
        format!(
            "repositories/{}/{}/pullrequests",
            encode_segment(&self.project.owner),
            encode_segment(&self.project.repo)
        )
    }
}

impl HostingBackend for BitbucketBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Bitbucket
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            merge: true,
            ..Capabilities::default()
        }
    }

    fn team_members(&self, team: &str) -> Result<Vec<Member>, GitPrError> {
        let url = self
            .client
            .url(&format!("teams/{}/members", encode_segment(team)));
        let records = self.client.fetch_values(&url, None)?;

        records
            .into_iter()
            .map(|record| {
                decode::<ApiUser>("team members", record)
                    .map(|user| Member::new(user.username, user.display_name))
            })
            .collect()
    }

    fn submit(
        &self,
        draft: &Draft,
        branches: &BranchPair,
    ) -> Result<SubmissionResult, GitPrError> {
        let reviewers: Vec<Value> = draft
            .reviewers
            .iter()
            .map(|member| json!({ "username": member.handle }))
            .collect();
        let payload = json!({
            "title": draft.title,
            "description": draft.body,
            "source": { "branch": { "name": branches.source } },
            "destination": { "branch": { "name": branches.target } },
            "reviewers": reviewers,
            "close_source_branch": draft.remove_source_branch,
        });
        let url = self.client.url(&self.pull_requests_path());

        let record = self
            .client
            .execute(Method::POST, &url, None, Some(&payload))?;
        let pull = decode::<ApiPullRequest>("pull request", record)?;

        Ok(SubmissionResult {
            request_id: pull.id.to_string(),
            internal_sequence_id: pull.id,
            host_project_id: self.project.full_path(),
            web_url: pull.links.html.href,
        })
    }

    fn set_approvers(
        &self,
        _submission: &SubmissionResult,
        _approvers: &[Member],
    ) -> Result<(), GitPrError> {
        skipped(self.kind(), "set approvers");
        Ok(())
    }

    fn post_comment(&self, _submission: &SubmissionResult, _body: &str) -> Result<(), GitPrError> {
        skipped(self.kind(), "post comment");
        Ok(())
    }

    fn merge(&self, branches: &BranchPair) -> Result<MergeOutcome, GitPrError> {
        let filter = format!(
            r#"state="OPEN" AND source.branch.name="{}" AND destination.branch.name="{}""#,
            branches.source, branches.target
        );
        let url = self.client.url(&self.pull_requests_path());
        let records = self
            .client
            .fetch_values(&url, Some(&[("q", filter.as_str())]))?;

        let open: Vec<ApiPullRequest> = records
            .into_iter()
            .map(|record| decode("pull request", record))
            .collect::<Result<_, _>>()?;
        let [pull] = <[ApiPullRequest; 1]>::try_from(open).map_err(|open| {
            GitPrError::AmbiguousRequest {
                source_branch: branches.source.clone(),
                target_branch: branches.target.clone(),
                count: open.len(),
            }
        })?;

        let merge_url = self
            .client
            .url(&format!("{}/{}/merge", self.pull_requests_path(), pull.id));
        let merged = self.client.execute(
            Method::POST,
            &merge_url,
            None,
            Some(&json!({ "merge_strategy": MERGE_STRATEGY })),
        )?;
        let web_url = decode::<ApiPullRequest>("merged pull request", merged)
            .map(|merged| merged.links.html.href)
            .ok()
            .filter(|href| !href.is_empty())
            .unwrap_or(pull.links.html.href);

        Ok(MergeOutcome::Merged { web_url })
    }

    fn test(&self, path: &str) -> Result<Value, GitPrError> {
        let url = self.client.url(path);
        Ok(self.client.execute(Method::GET, &url, None, None)?)
    }
}
