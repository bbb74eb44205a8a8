//! Unit tests for local repository discovery, history, and push.

use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

use super::discovery::{LocalRepository, Upstream, discover_repository, format_commit_log};
use super::error::LocalDiscoveryError;
use super::push::push_branch;

/// Commits an empty tree change with `message` on top of `HEAD`.
fn commit(repo: &Repository, message: &str) -> Oid {
    let signature = Signature::now("Alice", "alice@example.com").expect("valid signature");
    let tree_id = repo
        .index()
        .and_then(|mut index| index.write_tree())
        .expect("should write tree");
    let tree = repo.find_tree(tree_id).expect("tree should exist");
    let parent = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .expect("should commit")
}

/// Creates a repository on `main` tracking `origin/main` with one base commit.
fn create_tracking_repo(origin_url: &str) -> (TempDir, Repository) {
    let temp_dir = TempDir::new().expect("should create temp directory");
    let repo = Repository::init(temp_dir.path()).expect("should init repository");
    repo.set_head("refs/heads/main").expect("should point HEAD at main");
    repo.remote("origin", origin_url)
        .expect("should add origin remote");
    let base = commit(&repo, "Base commit");
    repo.reference("refs/remotes/origin/main", base, true, "test upstream")
        .expect("should create tracking ref");
    {
        let mut config = repo.config().expect("should open config");
        config
            .set_str("branch.main.remote", "origin")
            .expect("should set remote");
        config
            .set_str("branch.main.merge", "refs/heads/main")
            .expect("should set merge");
    }
    (temp_dir, repo)
}

#[test]
fn discovers_branch_and_upstream() {
    let (temp_dir, _repo) = create_tracking_repo("git@gitlab.com:infra/dp/scheduler.git");

    let local_repo = discover_repository(temp_dir.path()).expect("should discover repository");

    assert_eq!(local_repo.branch(), "main");
    assert_eq!(
        local_repo.upstream(),
        Some(&Upstream {
            remote: "origin".to_owned(),
            branch: "main".to_owned(),
        })
    );
    let origin = local_repo.remote_origin().expect("origin should parse");
    assert_eq!(origin.owner(), "infra/dp");
    assert_eq!(origin.repository(), "scheduler");
}

#[test]
fn discover_from_subdirectory() {
    let (temp_dir, _repo) = create_tracking_repo("https://gitlab.com/owner/repo.git");
    let subdir = temp_dir.path().join("src").join("lib");
    std::fs::create_dir_all(&subdir).expect("should create subdirectory");

    let local_repo = discover_repository(&subdir).expect("should discover from subdirectory");

    assert_eq!(
        local_repo
            .workdir()
            .canonicalize()
            .expect("should canonicalize"),
        temp_dir
            .path()
            .canonicalize()
            .expect("should canonicalize temp")
    );
}

#[test]
fn discover_not_a_repo() {
    let temp_dir = TempDir::new().expect("should create temp directory");

    let result = discover_repository(temp_dir.path());

    assert!(matches!(result, Err(LocalDiscoveryError::NotARepository)));
}

#[test]
fn branch_without_upstream_falls_back_to_origin() {
    let temp_dir = TempDir::new().expect("should create temp directory");
    let repo = Repository::init(temp_dir.path()).expect("should init repository");
    repo.set_head("refs/heads/topic").expect("should point HEAD");
    commit(&repo, "Only commit");

    let local_repo = discover_repository(temp_dir.path()).expect("should discover repository");

    assert_eq!(local_repo.upstream(), None);
    assert_eq!(local_repo.remote_name(), "origin");
    assert!(matches!(
        local_repo.remote_origin(),
        Err(LocalDiscoveryError::RemoteNotFound { name }) if name == "origin"
    ));
    assert_eq!(
        local_repo.commit_messages().expect("history should load"),
        vec!["Only commit"]
    );
}

#[test]
fn detached_head_is_rejected() {
    let (temp_dir, repo) = create_tracking_repo("git@gitlab.com:owner/repo.git");
    let head = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .expect("head commit");
    repo.set_head_detached(head.id()).expect("should detach");

    let result = discover_repository(temp_dir.path());

    assert!(matches!(result, Err(LocalDiscoveryError::DetachedHead)));
}

#[test]
fn commit_messages_are_oldest_first_and_exclude_upstream() {
    let (temp_dir, repo) = create_tracking_repo("git@gitlab.com:owner/repo.git");
    commit(&repo, "Fix queue starvation\n\nThe worker could spin.\n");
    commit(&repo, "Add regression test\n");

    let local_repo = discover_repository(temp_dir.path()).expect("should discover repository");
    let messages = local_repo.commit_messages().expect("history should load");

    assert_eq!(
        messages,
        vec![
            "Fix queue starvation\n\nThe worker could spin.",
            "Add regression test"
        ]
    );
    assert_eq!(
        format_commit_log(&messages),
        "Fix queue starvation\n\nThe worker could spin.\n - Add regression test"
    );
}

fn local_repository(path: &Path) -> LocalRepository {
    discover_repository(path).expect("should discover repository")
}

#[test]
fn push_branch_updates_remote_ref() {
    let remote_dir = TempDir::new().expect("should create remote directory");
    let bare = Repository::init_bare(remote_dir.path()).expect("should init bare remote");
    let remote_url = remote_dir.path().to_string_lossy().to_string();
    let (temp_dir, repo) = create_tracking_repo(&remote_url);
    let head = commit(&repo, "Work to push");
    let local_repo = local_repository(temp_dir.path());

    push_branch(local_repo.workdir(), local_repo.remote_name(), "alice/fix")
        .expect("push should succeed");

    let pushed = bare
        .find_reference("refs/heads/alice/fix")
        .expect("remote branch should exist");
    assert_eq!(pushed.target(), Some(head));
}

#[test]
fn push_to_missing_remote_fails() {
    let (temp_dir, _repo) = create_tracking_repo("git@gitlab.com:owner/repo.git");

    let result = push_branch(temp_dir.path(), "nowhere", "alice/fix");

    assert!(matches!(result, Err(LocalDiscoveryError::Push { .. })));
}
