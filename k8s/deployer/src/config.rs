use crate::common::{
    constants::{
        CONCOURSE_HELM_CHART_REPO, CONCOURSE_REPO_ALIAS, DEFAULT_INVOCATION_TIMEOUT,
        HELM_LEGACY_EXECUTABLE, HELM_PREFERRED_EXECUTABLE, KUBECONFIG_FILE_NAME,
        STABLE_HELM_CHART_REPO, STABLE_REPO_ALIAS, VALUES_FILE_PREFIX,
    },
    error::{ReadingFile, Result, YamlParseFromFile},
    kube_client::ClusterVersion,
};
use kube::config::Kubeconfig;
use serde::Deserialize;
use snafu::ResultExt;
use std::{ffi::OsString, fs, path::Path, time::Duration};

/// The cluster version which the configuration expects the cluster to be at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpectedVersion {
    pub major: String,
    pub minor: String,
}

impl ExpectedVersion {
    /// Both the major and the minor versions have to be equal.
    pub fn matches(&self, actual: &ClusterVersion) -> bool {
        self.major == actual.major && self.minor == actual.minor
    }
}

/// Access to a target cluster, along with the version it is expected to run.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    kubeconfig: Kubeconfig,
    cluster_version: ExpectedVersion,
}

impl ClusterConfig {
    pub fn new(kubeconfig: Kubeconfig, cluster_version: ExpectedVersion) -> Self {
        Self {
            kubeconfig,
            cluster_version,
        }
    }

    /// Reads a ClusterConfig from a YAML file.
    pub fn from_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let filepath = path.as_ref().to_path_buf();
        let buf = fs::read(filepath.as_path()).context(ReadingFile {
            filepath: filepath.clone(),
        })?;
        serde_yaml::from_slice(buf.as_slice()).context(YamlParseFromFile { filepath })
    }

    /// The credentials which are handed to the chart-manager.
    pub fn kubeconfig(&self) -> &Kubeconfig {
        &self.kubeconfig
    }

    pub fn cluster_version(&self) -> &ExpectedVersion {
        &self.cluster_version
    }
}

/// A chart repository, registered with the chart-manager under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRepository {
    pub alias: String,
    pub url: String,
}

impl ChartRepository {
    pub fn new<A, U>(alias: A, url: U) -> Self
    where
        A: ToString,
        U: ToString,
    {
        Self {
            alias: alias.to_string(),
            url: url.to_string(),
        }
    }
}

/// Settings for the deployer which would otherwise be implicit process state.
#[derive(Debug, Clone)]
pub struct DeployerConfig {
    preferred_tool: String,
    legacy_tool: String,
    search_path: Option<OsString>,
    kubeconfig_file_name: String,
    values_file_prefix: String,
    timeout: Duration,
    repositories: Vec<ChartRepository>,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            preferred_tool: HELM_PREFERRED_EXECUTABLE.to_string(),
            legacy_tool: HELM_LEGACY_EXECUTABLE.to_string(),
            search_path: None,
            kubeconfig_file_name: KUBECONFIG_FILE_NAME.to_string(),
            values_file_prefix: VALUES_FILE_PREFIX.to_string(),
            timeout: DEFAULT_INVOCATION_TIMEOUT,
            repositories: vec![
                ChartRepository::new(CONCOURSE_REPO_ALIAS, CONCOURSE_HELM_CHART_REPO),
                ChartRepository::new(STABLE_REPO_ALIAS, STABLE_HELM_CHART_REPO),
            ],
        }
    }
}

impl DeployerConfig {
    /// Look for the chart-manager in these directories instead of $PATH.
    #[must_use]
    pub fn with_search_path<P>(mut self, search_path: P) -> Self
    where
        P: Into<OsString>,
    {
        self.search_path = Some(search_path.into());
        self
    }

    /// Bound every external invocation by this duration.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the chart repositories which are registered before deploying.
    #[must_use]
    pub fn with_repositories(mut self, repositories: Vec<ChartRepository>) -> Self {
        self.repositories = repositories;
        self
    }

    pub fn preferred_tool(&self) -> &str {
        self.preferred_tool.as_str()
    }

    pub fn legacy_tool(&self) -> &str {
        self.legacy_tool.as_str()
    }

    /// None means $PATH.
    pub fn search_path(&self) -> Option<&OsString> {
        self.search_path.as_ref()
    }

    pub fn kubeconfig_file_name(&self) -> &str {
        self.kubeconfig_file_name.as_str()
    }

    pub fn values_file_prefix(&self) -> &str {
        self.values_file_prefix.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn repositories(&self) -> &[ChartRepository] {
        self.repositories.as_slice()
    }
}
