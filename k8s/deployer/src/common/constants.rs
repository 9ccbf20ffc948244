use std::time::Duration;

/// This is the name of the preferred chart-manager executable.
pub const HELM_PREFERRED_EXECUTABLE: &str = "helm3";

/// This is the name of the chart-manager executable which is used when the preferred one is not
/// present in the search path.
pub const HELM_LEGACY_EXECUTABLE: &str = "helm";

/// This is the alias of the concourse chart repository.
pub const CONCOURSE_REPO_ALIAS: &str = "concourse";

/// This is the URL of the concourse chart repository.
pub const CONCOURSE_HELM_CHART_REPO: &str = "https://concourse-charts.storage.googleapis.com/";

/// This is the alias of the stable chart repository.
pub const STABLE_REPO_ALIAS: &str = "stable";

/// This is the URL of the stable chart repository.
pub const STABLE_HELM_CHART_REPO: &str = "https://kubernetes-charts.storage.googleapis.com/";

/// This is the name of the kubeconfig file inside a staging scope.
pub const KUBECONFIG_FILE_NAME: &str = "kubecfg";

/// Value files inside a staging scope are named with this prefix followed by their position.
pub const VALUES_FILE_PREFIX: &str = "value";

/// This is the environment variable through which helm finds its kubeconfig.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// This is the key under which the htpasswd line is stored in a basic-auth Secret.
pub const BASIC_AUTH_SECRET_KEY: &str = "auth";

/// Every external invocation is bounded by this, unless configured otherwise.
pub const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(15 * 60);
