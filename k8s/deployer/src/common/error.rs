use snafu::Snafu;
use std::{fmt, path::PathBuf, time::Duration};

/// The orchestration step which an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Reading and parsing input files.
    Configuration,
    /// Comparing the live cluster version with the expected one.
    VersionGuard,
    /// Resolving the chart-manager executable.
    ToolLocator,
    /// Registering chart repositories and refreshing the index.
    RepositoryRegistrar,
    /// Checking for and creating the target namespace.
    NamespaceEnsure,
    /// Writing value files and the kubeconfig to the staging scope.
    Staging,
    /// Running the upgrade-or-install command.
    DeploymentExecutor,
    /// Creating the basic-auth Secret.
    BasicAuthSecret,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Configuration => "configuration",
            Step::VersionGuard => "version guard",
            Step::ToolLocator => "tool locator",
            Step::RepositoryRegistrar => "repository registrar",
            Step::NamespaceEnsure => "namespace ensure",
            Step::Staging => "deployment staging",
            Step::DeploymentExecutor => "deployment executor",
            Step::BasicAuthSecret => "basic-auth secret",
        };
        f.write_str(name)
    }
}

/// For use with multiple fallible operations which may fail for different reasons, but are
/// defined withing the same scope and must return to the outer scope (calling scope) using
/// the try operator -- '?'.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))]
pub enum Error {
    /// Error for when a file could not be read.
    #[snafu(display("Failed to read file {}: {}", filepath.display(), source))]
    ReadingFile {
        source: std::io::Error,
        filepath: PathBuf,
    },

    /// Error for when yaml could not be parsed from a file.
    #[snafu(display("Failed to parse YAML at {}: {}", filepath.display(), source))]
    YamlParseFromFile {
        source: serde_yaml::Error,
        filepath: PathBuf,
    },

    /// Error for when the configured kubeconfig cannot be turned into a client configuration.
    #[snafu(display("Failed to load kubeconfig: {}", source))]
    KubeconfigLoad {
        source: kube::config::KubeconfigError,
    },

    /// Error for when Kubernetes API client generation fails.
    #[snafu(display("Failed to generate kubernetes client: {}", source))]
    K8sClientGeneration { source: kube::Error },

    /// Error for when the cluster's version could not be read.
    #[snafu(display("Failed to query the Kubernetes cluster version: {}", source))]
    ClusterVersionQuery { source: kube::Error },

    /// Error for when the cluster is not at the configured version.
    #[snafu(display(
        "cluster version mismatch \"Major: {} Minor: {}\". Expected \"Major: {} Minor: {}\".",
        actual_major,
        actual_minor,
        expected_major,
        expected_minor
    ))]
    VersionMismatch {
        actual_major: String,
        actual_minor: String,
        expected_major: String,
        expected_minor: String,
    },

    /// Error for when neither the preferred nor the legacy chart-manager is in the search path.
    #[snafu(display(
        "No executable '{}' or '{}' found in search path: {}",
        preferred,
        legacy,
        source
    ))]
    ToolNotFound {
        source: which::Error,
        preferred: String,
        legacy: String,
    },

    /// Error for when a Helm command could not be started.
    #[snafu(display(
        "Failed to run Helm command,\ncommand: {},\nargs: {:?},\ncommand_error: {}",
        command,
        args,
        source
    ))]
    HelmCommand {
        source: std::io::Error,
        command: String,
        args: Vec<String>,
    },

    /// Error for when a Helm command did not exit within the allowed time.
    #[snafu(display(
        "Helm command timed out after {},\ncommand: {},\nargs: {:?}",
        humantime::format_duration(*timeout),
        command,
        args
    ))]
    CommandTimeout {
        command: String,
        args: Vec<String>,
        timeout: Duration,
    },

    /// Error for when a `helm repo add` or `helm repo update` command exits unsuccessfully.
    #[snafu(display(
        "Helm repository command failed,\ncommand: {},\nargs: {:?},\nexit_code: {:?},\nstd_err: {}",
        command,
        args,
        exit_code,
        std_err
    ))]
    RepositoryRegistrationFailed {
        command: String,
        args: Vec<String>,
        exit_code: Option<i32>,
        std_err: String,
    },

    /// Error for a Kubernetes API request for a namespace resource.
    #[snafu(display(
        "Failed to {} Kubernetes namespace {}: {}",
        operation,
        namespace,
        source
    ))]
    NamespaceOperationFailed {
        source: kube::Error,
        operation: String,
        namespace: String,
    },

    /// Error for when a deployment request is missing a mandatory input.
    #[snafu(display("Invalid deployment request: {}", reason))]
    InvalidDeploymentRequest { reason: String },

    /// Error for when the temporary staging directory could not be created.
    #[snafu(display("Failed to create staging directory: {}", source))]
    TempDirCreation { source: std::io::Error },

    /// Error for when a staged value could not be serialized to YAML.
    #[snafu(display("Failed to serialize YAML for {}: {}", filepath.display(), source))]
    YamlSerialize {
        source: serde_yaml::Error,
        filepath: PathBuf,
    },

    /// Error for when a staged file could not be written.
    #[snafu(display("Failed to write to staged file {}: {}", filepath.display(), source))]
    WriteToStagedFile {
        source: std::io::Error,
        filepath: PathBuf,
    },

    /// Error for when the staging directory could not be removed.
    #[snafu(display("Failed to remove staging directory {}: {}", path.display(), source))]
    StagingCleanup {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Error for when the `helm upgrade --install` command exits unsuccessfully.
    #[snafu(display(
        "Helm upgrade command failed,\ncommand: {},\nargs: {:?},\nexit_code: {:?},\nstd_out: {},\nstd_err: {}",
        command,
        args,
        exit_code,
        std_out,
        std_err
    ))]
    DeploymentExecutionFailed {
        command: String,
        args: Vec<String>,
        exit_code: Option<i32>,
        std_out: String,
        std_err: String,
    },

    /// Error for when a basic-auth Secret request is missing a mandatory input.
    #[snafu(display("Invalid basic-auth secret request: {}", reason))]
    InvalidSecretRequest { reason: String },

    /// Error for a Kubernetes API request for a Secret resource.
    #[snafu(display(
        "Failed to {} Kubernetes Secret {} in namespace {}: {}",
        operation,
        name,
        namespace,
        source
    ))]
    SecretOperationFailed {
        source: kube::Error,
        operation: String,
        name: String,
        namespace: String,
    },
}

impl Error {
    /// The orchestration step which failed.
    pub fn step(&self) -> Step {
        match self {
            Error::ReadingFile { .. }
            | Error::YamlParseFromFile { .. }
            | Error::InvalidDeploymentRequest { .. } => Step::Configuration,
            Error::KubeconfigLoad { .. }
            | Error::K8sClientGeneration { .. }
            | Error::ClusterVersionQuery { .. }
            | Error::VersionMismatch { .. } => Step::VersionGuard,
            Error::ToolNotFound { .. } => Step::ToolLocator,
            Error::RepositoryRegistrationFailed { .. } => Step::RepositoryRegistrar,
            Error::NamespaceOperationFailed { .. } => Step::NamespaceEnsure,
            Error::TempDirCreation { .. }
            | Error::YamlSerialize { .. }
            | Error::WriteToStagedFile { .. }
            | Error::StagingCleanup { .. } => Step::Staging,
            Error::HelmCommand { args, .. } | Error::CommandTimeout { args, .. } => {
                command_step(args)
            }
            Error::DeploymentExecutionFailed { .. } => Step::DeploymentExecutor,
            Error::InvalidSecretRequest { .. } | Error::SecretOperationFailed { .. } => {
                Step::BasicAuthSecret
            }
        }
    }
}

/// Spawn failures and timeouts are attributed to the helm sub-command which was running.
fn command_step(args: &[String]) -> Step {
    match args.first().map(String::as_str) {
        Some("repo") => Step::RepositoryRegistrar,
        _ => Step::DeploymentExecutor,
    }
}

/// A wrapper type to remove repeated Result<T, Error> returns.
pub type Result<T, E = Error> = std::result::Result<T, E>;
