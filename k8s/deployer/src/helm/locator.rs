use crate::{
    common::error::{Result, ToolNotFound},
    config::DeployerConfig,
};
use snafu::IntoError;
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Look up a single executable name, either in the given search path or in $PATH.
fn lookup(name: &str, search_path: Option<&OsStr>) -> which::Result<PathBuf> {
    match search_path {
        Some(paths) => which::which_in(name, Some(paths), Path::new(".")),
        None => which::which(name),
    }
}

/// Resolves the chart-manager executable. The preferred name wins when both are present, the
/// legacy name is used otherwise.
pub fn locate_tool(config: &DeployerConfig) -> Result<PathBuf> {
    let search_path = config.search_path().map(|p| p.as_os_str());
    let preferred = config.preferred_tool();
    let legacy = config.legacy_tool();

    match lookup(preferred, search_path) {
        Ok(path) => {
            debug!(path = %path.display(), "Found chart-manager executable");
            return Ok(path);
        }
        Err(_) => {
            info!("No executable '{preferred}' found in path. Falling back to '{legacy}'");
        }
    }

    lookup(legacy, search_path)
        .map(|path| {
            debug!(path = %path.display(), "Found chart-manager executable");
            path
        })
        .map_err(|error| {
            ToolNotFound {
                preferred,
                legacy,
            }
            .into_error(error)
        })
}

#[cfg(all(test, unix))]
mod tests {
    use super::locate_tool;
    use crate::{common::error::Error, config::DeployerConfig};
    use std::{fs, os::unix::fs::PermissionsExt, path::Path};

    fn install_executable(dir: &Path, name: &str) {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_prefers_preferred_tool() {
        let dir = tempfile::tempdir().unwrap();
        install_executable(dir.path(), "helm3");
        install_executable(dir.path(), "helm");

        let config = DeployerConfig::default().with_search_path(dir.path());
        assert_eq!(locate_tool(&config).unwrap(), dir.path().join("helm3"));
    }

    #[test]
    fn test_falls_back_to_legacy_tool() {
        let dir = tempfile::tempdir().unwrap();
        install_executable(dir.path(), "helm");

        let config = DeployerConfig::default().with_search_path(dir.path());
        assert_eq!(locate_tool(&config).unwrap(), dir.path().join("helm"));
    }

    #[test]
    fn test_preferred_tool_in_later_search_path_entry() {
        let legacy_dir = tempfile::tempdir().unwrap();
        let preferred_dir = tempfile::tempdir().unwrap();
        install_executable(legacy_dir.path(), "helm");
        install_executable(preferred_dir.path(), "helm3");

        let search_path =
            std::env::join_paths([legacy_dir.path(), preferred_dir.path()]).unwrap();
        let config = DeployerConfig::default().with_search_path(search_path);
        assert_eq!(
            locate_tool(&config).unwrap(),
            preferred_dir.path().join("helm3")
        );
    }

    #[test]
    fn test_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeployerConfig::default().with_search_path(dir.path());
        assert!(matches!(
            locate_tool(&config),
            Err(Error::ToolNotFound { .. })
        ));
    }

    #[test]
    fn test_non_executable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("helm3"), "not a binary").unwrap();
        install_executable(dir.path(), "helm");

        let config = DeployerConfig::default().with_search_path(dir.path());
        assert_eq!(locate_tool(&config).unwrap(), dir.path().join("helm"));
    }
}
