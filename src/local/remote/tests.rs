//! Unit tests for Git remote URL parsing.

use rstest::rstest;

use super::super::error::LocalDiscoveryError;
use super::parse_remote_url;

#[rstest]
#[case::ssh_scp_style("git@gitlab.com:owner/repo.git", "owner", "repo")]
#[case::ssh_scp_style_no_git_suffix("git@github.com:owner/repo", "owner", "repo")]
#[case::scp_without_user("gitlab.example.com:owner/repo.git", "owner", "repo")]
#[case::nested_group("git@gitlab.com:infra/dp/scheduler.git", "infra/dp", "scheduler")]
#[case::https("https://github.com/owner/repo.git", "owner", "repo")]
#[case::https_nested_group("https://gitlab.com/a/b/c/repo", "a/b/c", "repo")]
#[case::ssh_url_style("ssh://git@github.com/owner/repo.git", "owner", "repo")]
#[case::with_trailing_slash("https://github.com/owner/repo/", "owner", "repo")]
#[case::local_path("/srv/git/team/tool.git", "srv/git/team", "tool")]
fn parses_owner_and_repository(
    #[case] input: &str,
    #[case] expected_owner: &str,
    #[case] expected_repo: &str,
) {
    let origin = parse_remote_url(input).expect("should parse successfully");

    assert_eq!(origin.owner(), expected_owner);
    assert_eq!(origin.repository(), expected_repo);
}

#[rstest]
#[case::scp("git@gitlab.example.com:owner/repo.git", Some("gitlab.example.com"), None)]
#[case::https_with_port("https://ghe.example.com:8443/owner/repo.git", Some("ghe.example.com"), Some(8443))]
#[case::local("/srv/git/owner/repo", None, None)]
fn records_host_and_port(
    #[case] input: &str,
    #[case] host: Option<&str>,
    #[case] port: Option<u16>,
) {
    let origin = parse_remote_url(input).expect("should parse successfully");

    assert_eq!(origin.host(), host);
    assert_eq!(origin.port(), port);
}

#[rstest]
#[case::empty_url("")]
#[case::single_segment("not-a-url")]
#[case::url_missing_repo("https://github.com/owner")]
#[case::scp_missing_owner("git@github.com:repo.git")]
fn parse_invalid_urls_returns_error(#[case] input: &str) {
    let result = parse_remote_url(input);

    assert!(
        matches!(result, Err(LocalDiscoveryError::InvalidRemoteUrl { .. })),
        "expected InvalidRemoteUrl for '{input}', got {result:?}"
    );
}
