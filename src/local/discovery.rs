//! Local Git repository discovery.
//!
//! This module finds the repository containing the working directory and
//! reads the pieces the workflow needs from it: the current branch, its
//! upstream, the remote URL, and the commits not yet on the upstream.

use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository, Sort};

use super::error::LocalDiscoveryError;
use super::remote::{RemoteOrigin, parse_remote_url};

/// Remote used when the current branch has no upstream.
pub const DEFAULT_REMOTE_NAME: &str = "origin";

/// Remote and branch the current branch tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Remote name, such as `origin`.
    pub remote: String,
    /// Branch name on the remote, without the `refs/heads/` prefix.
    pub branch: String,
}

/// A discovered local Git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepository {
    /// Path to the repository working directory.
    workdir: PathBuf,
    /// Short name of the checked out branch.
    branch: String,
    /// Tracking configuration of the checked out branch.
    upstream: Option<Upstream>,
}

impl LocalRepository {
    /// Returns the path to the repository working directory.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Returns the checked out branch.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the upstream of the checked out branch, if configured.
    #[must_use]
    pub const fn upstream(&self) -> Option<&Upstream> {
        self.upstream.as_ref()
    }

    /// Returns the remote to push to and read the URL from.
    #[must_use]
    pub fn remote_name(&self) -> &str {
        self.upstream
            .as_ref()
            .map_or(DEFAULT_REMOTE_NAME, |upstream| upstream.remote.as_str())
    }

    /// Reads and parses the URL of [`Self::remote_name`].
    ///
    /// # Errors
    ///
    /// Returns `RemoteNotFound` when the remote does not exist and
    /// `InvalidRemoteUrl` when its URL has no owner/repository shape.
    pub fn remote_origin(&self) -> Result<RemoteOrigin, LocalDiscoveryError> {
        let repo = Repository::open(&self.workdir)?;
        let name = self.remote_name();
        let remote = repo.find_remote(name).map_err(|error| {
            if error.code() == ErrorCode::NotFound {
                LocalDiscoveryError::RemoteNotFound {
                    name: name.to_owned(),
                }
            } else {
                LocalDiscoveryError::from(error)
            }
        })?;
        let url = remote
            .url()
            .ok_or_else(|| LocalDiscoveryError::InvalidRemoteUrl {
                url: "(no URL)".to_owned(),
            })?;
        parse_remote_url(url)
    }

    /// Returns the messages of commits reachable from `HEAD` but not from
    /// the upstream tracking ref, oldest first.
    ///
    /// Without a resolvable tracking ref only the `HEAD` commit is returned.
    ///
    /// # Errors
    ///
    /// Returns `Git` when the history cannot be walked.
    pub fn commit_messages(&self) -> Result<Vec<String>, LocalDiscoveryError> {
        let repo = Repository::open(&self.workdir)?;
        let head = repo.head()?.peel_to_commit()?;

        let base = self.upstream.as_ref().and_then(|upstream| {
            let spec = format!("refs/remotes/{}/{}", upstream.remote, upstream.branch);
            repo.revparse_single(&spec).ok().map(|object| object.id())
        });
        let Some(base) = base else {
            tracing::debug!("no upstream tracking ref, using HEAD commit only");
            return Ok(vec![message_of(&head)]);
        };

        let mut walk = repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        walk.push(head.id())?;
        walk.hide(base)?;

        walk.map(|oid| -> Result<String, LocalDiscoveryError> {
            Ok(message_of(&repo.find_commit(oid?)?))
        })
        .collect()
    }
}

fn message_of(commit: &git2::Commit<'_>) -> String {
    commit.message().unwrap_or_default().trim().to_owned()
}

/// Joins commit messages into the draft body.
///
/// The first message is kept as is so its subject becomes the default title;
/// later messages are listed below it.
#[must_use]
pub fn format_commit_log(messages: &[String]) -> String {
    messages.join("\n - ")
}

/// Discovers the local Git repository starting at `start_path`.
///
/// # Errors
///
/// Returns an error if:
/// - The path is not within a Git repository (`NotARepository`)
/// - `HEAD` is not a branch (`DetachedHead`)
/// - Git configuration cannot be read (`Git`)
pub fn discover_repository(start_path: &Path) -> Result<LocalRepository, LocalDiscoveryError> {
    let repo = open_repository(start_path)?;
    let workdir = repo
        .workdir()
        .map(Path::to_path_buf)
        .ok_or(LocalDiscoveryError::NotARepository)?;

    let head = repo.head().map_err(|error| {
        if error.code() == ErrorCode::UnbornBranch {
            LocalDiscoveryError::Git {
                message: "the current branch has no commits yet".to_owned(),
            }
        } else {
            LocalDiscoveryError::from(error)
        }
    })?;
    if !head.is_branch() {
        return Err(LocalDiscoveryError::DetachedHead);
    }
    let branch = head
        .shorthand()
        .ok_or(LocalDiscoveryError::DetachedHead)?
        .to_owned();
    let refname = head.name().ok_or(LocalDiscoveryError::DetachedHead)?;
    let upstream = read_upstream(&repo, refname)?;

    tracing::debug!(
        workdir = %workdir.display(),
        branch,
        upstream = ?upstream,
        "local repository discovered"
    );

    Ok(LocalRepository {
        workdir,
        branch,
        upstream,
    })
}

/// Opens a Git repository starting from the given path.
fn open_repository(start_path: &Path) -> Result<Repository, LocalDiscoveryError> {
    Repository::discover(start_path).map_err(|error| {
        if error.code() == ErrorCode::NotFound {
            LocalDiscoveryError::NotARepository
        } else {
            LocalDiscoveryError::from(error)
        }
    })
}

/// Reads `branch.<name>.remote` and `branch.<name>.merge`.
fn read_upstream(repo: &Repository, refname: &str) -> Result<Option<Upstream>, LocalDiscoveryError> {
    let remote = match repo.branch_upstream_remote(refname) {
        Ok(buf) => buf.as_str().map(ToOwned::to_owned),
        Err(error) if error.code() == ErrorCode::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };
    let merge = match repo.branch_upstream_merge(refname) {
        Ok(buf) => buf.as_str().map(ToOwned::to_owned),
        Err(error) if error.code() == ErrorCode::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };

    Ok(remote.zip(merge).map(|(remote, merge)| Upstream {
        remote,
        branch: merge
            .strip_prefix("refs/heads/")
            .unwrap_or(&merge)
            .to_owned(),
    }))
}
