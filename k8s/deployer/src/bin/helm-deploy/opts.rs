use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// These are the supported cli configuration options for helm-deploy.
#[derive(Parser)]
#[command(name = "helm-deploy", version)]
#[command(about = "Deploys Helm charts to a version-pinned Kubernetes cluster", long_about = None)]
pub(crate) struct CliArgs {
    #[command(subcommand)]
    operation: Operation,
}

impl CliArgs {
    pub(crate) fn operation(&self) -> &Operation {
        &self.operation
    }
}

#[derive(Subcommand)]
pub(crate) enum Operation {
    /// Installs or upgrades a Helm release.
    Deploy(DeployArgs),
    /// Creates a Secret holding an htpasswd entry, unless it exists already.
    BasicAuthSecret(BasicAuthSecretArgs),
}

#[derive(Args)]
pub(crate) struct DeployArgs {
    /// YAML file with the cluster's kubeconfig and its expected version.
    #[arg(short, long, env = "HELM_DEPLOY_CONFIG", value_name = "FILE_PATH")]
    config: PathBuf,

    /// This is the Kubernetes Namespace for the Helm release.
    #[arg(short, long)]
    namespace: String,

    /// This is the chart to deploy, e.g. 'concourse/concourse'.
    #[arg(long)]
    chart: String,

    /// This is the release name of the Helm chart.
    #[arg(long)]
    release_name: String,

    /// Pins the chart version.
    #[arg(long)]
    chart_version: Option<String>,

    /// Helm values files, later ones override earlier ones.
    #[arg(short = 'f', long = "values", value_name = "FILE_PATH")]
    values: Vec<PathBuf>,

    /// Upper bound for each Helm invocation.
    #[arg(long, default_value = "15m")]
    timeout: humantime::Duration,

    /// Directories to look for the Helm executable in, instead of $PATH.
    #[arg(long, env = "HELM_DEPLOY_SEARCH_PATH")]
    search_path: Option<String>,
}

impl DeployArgs {
    pub(crate) fn config(&self) -> PathBuf {
        self.config.clone()
    }

    pub(crate) fn namespace(&self) -> String {
        self.namespace.clone()
    }

    pub(crate) fn chart(&self) -> String {
        self.chart.clone()
    }

    pub(crate) fn release_name(&self) -> String {
        self.release_name.clone()
    }

    pub(crate) fn chart_version(&self) -> Option<String> {
        self.chart_version.clone()
    }

    pub(crate) fn values(&self) -> &[PathBuf] {
        self.values.as_slice()
    }

    pub(crate) fn timeout(&self) -> std::time::Duration {
        self.timeout.into()
    }

    pub(crate) fn search_path(&self) -> Option<String> {
        self.search_path.clone()
    }
}

#[derive(Args)]
pub(crate) struct BasicAuthSecretArgs {
    /// YAML file with the cluster's kubeconfig. The ambient kubeconfig is used if this is not set.
    #[arg(short, long, env = "HELM_DEPLOY_CONFIG", value_name = "FILE_PATH")]
    config: Option<PathBuf>,

    /// The Namespace of the Secret. It is created if it does not exist.
    #[arg(short, long)]
    namespace: String,

    /// The name of the Secret.
    #[arg(long)]
    secret_name: String,

    /// The basic-auth user.
    #[arg(long)]
    user: String,

    /// The basic-auth password.
    #[arg(long, env = "BASIC_AUTH_PASSWORD", hide_env_values = true)]
    password: String,
}

impl BasicAuthSecretArgs {
    pub(crate) fn config(&self) -> Option<PathBuf> {
        self.config.clone()
    }

    pub(crate) fn namespace(&self) -> String {
        self.namespace.clone()
    }

    pub(crate) fn secret_name(&self) -> String {
        self.secret_name.clone()
    }

    pub(crate) fn user(&self) -> String {
        self.user.clone()
    }

    pub(crate) fn password(&self) -> String {
        self.password.clone()
    }
}
