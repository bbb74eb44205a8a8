//! Git remote URL parsing.
//!
//! The owner is everything before the last path separator, so nested GitLab
//! groups such as `infra/dp` survive intact, and the repository name is the
//! final segment with any `.git` suffix removed.

use super::error::LocalDiscoveryError;

/// Owner and repository derived from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOrigin {
    host: Option<String>,
    port: Option<u16>,
    owner: String,
    repository: String,
}

impl RemoteOrigin {
    /// Returns the repository owner path.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the host, or `None` for local path remotes.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the explicit port, if the URL carried one.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Parses a Git remote URL into owner and repository.
///
/// Supports the following URL formats:
/// - SCP-style SSH: `git@host:owner/repo.git`
/// - URL-style: `https://host/owner/repo`, `ssh://git@host:22/owner/repo.git`
/// - Local paths: `/srv/git/owner/repo.git`
///
/// # Errors
///
/// Returns `LocalDiscoveryError::InvalidRemoteUrl` when no owner and
/// repository can be derived.
pub fn parse_remote_url(url: &str) -> Result<RemoteOrigin, LocalDiscoveryError> {
    let trimmed = url.trim();
    let invalid = || LocalDiscoveryError::InvalidRemoteUrl {
        url: url.to_owned(),
    };

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let (host, port, path) = if trimmed.contains("://") {
        let parsed = url::Url::parse(trimmed).map_err(|_| invalid())?;
        (
            parsed.host_str().map(ToOwned::to_owned),
            parsed.port(),
            parsed.path().to_owned(),
        )
    } else if let Some((host, path)) = split_scp_style(trimmed) {
        (Some(host.to_owned()), None, path.to_owned())
    } else {
        (None, None, trimmed.to_owned())
    };

    let (owner, repository) = split_owner_repo(&path).ok_or_else(invalid)?;
    Ok(RemoteOrigin {
        host,
        port,
        owner,
        repository,
    })
}

/// Splits `[user@]host:path`; the host part may not contain a `/`.
fn split_scp_style(url: &str) -> Option<(&str, &str)> {
    let (authority, path) = url.split_once(':')?;
    if authority.is_empty() || authority.contains('/') {
        return None;
    }
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    Some((host, path))
}

fn split_owner_repo(path: &str) -> Option<(String, String)> {
    let trimmed = path.trim_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let (owner, repository) = trimmed.rsplit_once('/')?;
    let owner = owner.trim_start_matches('/');
    if owner.is_empty() || repository.is_empty() {
        return None;
    }
    Some((owner.to_owned(), repository.to_owned()))
}

#[cfg(test)]
mod tests;
