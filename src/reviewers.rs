//! Maps `Review-By` handles onto roster members.

use crate::backend::{HostingBackend, Member, MemberStatus};
use crate::directives::{ControlDirectives, DirectiveKey};
use crate::error::GitPrError;

/// Returns the handle of a `Review-By` value: its first whitespace token.
#[must_use]
pub fn reviewer_handle(value: &str) -> Option<&str> {
    value.split_whitespace().next()
}

/// Resolves every `Review-By` handle against `roster`.
///
/// Members are returned in directive order. A handle missing from the roster
/// is dropped with a warning and a repeated handle is only resolved once.
#[must_use]
pub fn resolve_reviewers(directives: &ControlDirectives, roster: &[Member]) -> Vec<Member> {
    let mut resolved: Vec<Member> = Vec::new();

    for handle in directives
        .values(DirectiveKey::ReviewBy)
        .iter()
        .filter_map(|value| reviewer_handle(value))
    {
        if resolved.iter().any(|member| member.handle == handle) {
            continue;
        }
        match roster.iter().find(|member| member.handle == handle) {
            Some(member) => resolved.push(member.clone()),
            None => tracing::warn!(handle, "reviewer is not in the team roster, dropping"),
        }
    }

    resolved
}

/// Removes the operator and blocked members from a roster.
#[must_use]
pub fn eligible_members(roster: Vec<Member>, operator: &str) -> Vec<Member> {
    roster
        .into_iter()
        .filter(|member| member.handle != operator && member.status != MemberStatus::Blocked)
        .collect()
}

/// Fetches the team roster and keeps only eligible members.
///
/// An empty team name yields an empty roster without a network call.
///
/// # Errors
///
/// Propagates roster lookup failures from the backend.
pub fn list_members(
    backend: &dyn HostingBackend,
    team: &str,
    operator: &str,
) -> Result<Vec<Member>, GitPrError> {
    if team.is_empty() {
        return Ok(Vec::new());
    }
    let roster = backend.team_members(team)?;
    let total = roster.len();
    let eligible = eligible_members(roster, operator);
    tracing::debug!(team, total, eligible = eligible.len(), "team roster loaded");
    Ok(eligible)
}
