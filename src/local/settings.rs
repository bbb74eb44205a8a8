//! Settings stored in git configuration under the `pr.` section.
//!
//! Keys are stored in git's `kebab-case` form (`pr.jenkins-url`) and read
//! back as the `snake_case` names used by the configuration file.

use std::collections::BTreeMap;
use std::path::Path;

use camino::Utf8Path;
use git2::{Config, Repository};

use super::error::LocalDiscoveryError;

/// Section holding stored settings.
pub const SETTINGS_SECTION: &str = "pr";

/// Git alias that runs this tool.
pub const ALIAS_KEY: &str = "alias.pr";

/// Opens the configuration seen from `start_path`: the repository's local
/// configuration layered over the global and system files, or only the
/// latter outside a repository.
///
/// # Errors
///
/// Returns `Git` when no configuration can be opened.
pub fn open_config(start_path: &Path) -> Result<Config, LocalDiscoveryError> {
    match Repository::discover(start_path) {
        Ok(repo) => Ok(repo.config()?),
        Err(_) => Ok(Config::open_default()?),
    }
}

/// Opens the user's global configuration file, creating the path if needed.
///
/// # Errors
///
/// Returns `Git` when the file cannot be located or opened.
pub fn open_global_config() -> Result<Config, LocalDiscoveryError> {
    let path = match Config::find_global() {
        Ok(path) => path,
        Err(_) => std::env::var_os("HOME")
            .map(|home| Path::new(&home).join(".gitconfig"))
            .ok_or_else(|| LocalDiscoveryError::Git {
                message: "cannot locate the global git configuration".to_owned(),
            })?,
    };
    Ok(Config::open(&path)?)
}

/// Reads every `pr.*` entry, keyed by `snake_case` name.
///
/// # Errors
///
/// Returns `Git` when the entries cannot be iterated.
pub fn read_settings(config: &Config) -> Result<BTreeMap<String, String>, LocalDiscoveryError> {
    let mut settings = BTreeMap::new();
    let pattern = format!("^{SETTINGS_SECTION}\\..*");
    let mut entries = config.entries(Some(&pattern))?;

    while let Some(entry) = entries.next() {
        let entry = entry?;
        let (Some(name), Some(value)) = (entry.name(), entry.value()) else {
            continue;
        };
        let Some(key) = name.strip_prefix(SETTINGS_SECTION).and_then(|rest| rest.strip_prefix('.'))
        else {
            continue;
        };
        settings.insert(key.replace('-', "_"), value.to_owned());
    }

    Ok(settings)
}

/// Stores each `(snake_case name, value)` pair under `pr.`.
///
/// # Errors
///
/// Returns `Git` when a value cannot be written.
pub fn write_settings(
    config: &mut Config,
    settings: &[(&str, String)],
) -> Result<(), LocalDiscoveryError> {
    for (name, value) in settings {
        let key = format!("{SETTINGS_SECTION}.{}", name.replace('_', "-"));
        config.set_str(&key, value)?;
        tracing::debug!(key, "stored setting");
    }
    Ok(())
}

/// Points `git pr` at `executable`.
///
/// # Errors
///
/// Returns `Git` when the alias cannot be written.
pub fn install_alias(
    config: &mut Config,
    executable: &Utf8Path,
) -> Result<(), LocalDiscoveryError> {
    config.set_str(ALIAS_KEY, &format!("!{executable}"))?;
    Ok(())
}
