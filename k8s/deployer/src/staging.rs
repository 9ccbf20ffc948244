use crate::{
    common::{
        error::{Result, StagingCleanup, TempDirCreation},
        file::write_yaml_to_file,
    },
    config::DeployerConfig,
    request::DeploymentRequest,
};
use kube::config::Kubeconfig;
use snafu::ResultExt;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tempfile::{Builder as TempDirBuilder, TempDir};
use tracing::debug;

/// A temporary directory holding the value files and the kubeconfig for exactly one
/// chart-manager invocation. The directory is removed when the scope is released or dropped.
#[derive(Debug)]
pub struct StagingScope {
    dir: Option<TempDir>,
    path: PathBuf,
    value_files: Vec<String>,
    kubeconfig_file: String,
}

impl StagingScope {
    /// The directory which holds the staged files.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Names of the staged value files, relative to the scope, in request order.
    pub fn value_files(&self) -> &[String] {
        self.value_files.as_slice()
    }

    /// Name of the staged kubeconfig file, relative to the scope.
    pub fn kubeconfig_file(&self) -> &str {
        self.kubeconfig_file.as_str()
    }

    /// Removes the directory and everything in it. Releasing more than once, or releasing a
    /// directory which has already been removed, is not an error.
    pub fn release(&mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };

        match dir.close() {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed staging directory");
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error).context(StagingCleanup {
                path: self.path.clone(),
            }),
        }
    }
}

/// Creates a fresh staging scope and writes each of the request's value mappings to its own
/// file, named by its position, followed by the kubeconfig. A partially written scope is removed
/// if any of the writes fail.
pub fn stage(
    request: &DeploymentRequest,
    kubeconfig: &Kubeconfig,
    config: &DeployerConfig,
) -> Result<StagingScope> {
    let dir = TempDirBuilder::new()
        .prefix("helm-deploy-")
        .tempdir()
        .context(TempDirCreation)?;

    let mut scope = StagingScope {
        path: dir.path().to_path_buf(),
        dir: Some(dir),
        value_files: Vec::with_capacity(request.values().len()),
        kubeconfig_file: config.kubeconfig_file_name().to_string(),
    };

    for (idx, values) in request.values().iter().enumerate() {
        let name = format!("{}{}", config.values_file_prefix(), idx);
        write_yaml_to_file(scope.path.join(name.as_str()), values)?;
        scope.value_files.push(name);
    }

    write_yaml_to_file(scope.path.join(scope.kubeconfig_file.as_str()), kubeconfig)?;

    debug!(
        path = %scope.path.display(),
        value_files = scope.value_files.len(),
        "Staged deployment files"
    );

    Ok(scope)
}
