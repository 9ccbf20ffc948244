use crate::{
    common::{
        error::{NamespaceOperationFailed, Result},
        kube_client::{ClusterClient, KubeClientSet},
    },
    config::{ClusterConfig, DeployerConfig},
    helm::{
        locator::locate_tool,
        process::{ProcessRunner, TokioProcessRunner},
        repository::ensure_repositories,
        upgrade::execute,
    },
    request::DeploymentRequest,
    staging::stage,
    version::ensure_cluster_version,
};
use serde_yaml::Mapping;
use snafu::ResultExt;
use tracing::{info, warn};

/// Creates the Namespace unless it exists already. Losing a creation race to a concurrent
/// deployment into the same Namespace is not an error.
pub async fn ensure_namespace<C>(client: &C, namespace: &str) -> Result<()>
where
    C: ClusterClient + ?Sized,
{
    let exists = client
        .namespace_exists(namespace)
        .await
        .context(NamespaceOperationFailed {
            operation: "get",
            namespace,
        })?;
    if exists {
        return Ok(());
    }

    match client.create_namespace(namespace).await {
        Ok(()) => {
            info!(namespace, "Created Kubernetes namespace");
            Ok(())
        }
        // Ref: https://github.com/kubernetes/apimachinery/blob/v0.27.3/pkg/apis/meta/v1/types.go#L846
        Err(kube::Error::Api(response)) if response.reason.eq("AlreadyExists") => {
            info!(namespace, "Kubernetes namespace already exists");
            Ok(())
        }
        Err(error) => Err(error).context(NamespaceOperationFailed {
            operation: "create",
            namespace,
        }),
    }
}

/// Runs deployments against one cluster. Every step's postcondition is the next step's
/// precondition, so the steps run strictly in order and the first failure ends the run.
pub struct Deployer<C, R> {
    client: C,
    runner: R,
    config: DeployerConfig,
}

impl<C, R> Deployer<C, R>
where
    C: ClusterClient,
    R: ProcessRunner,
{
    pub fn new(client: C, runner: R, config: DeployerConfig) -> Self {
        Self {
            client,
            runner,
            config,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Version guard, tool lookup, repository registration, namespace creation, staging and
    /// upgrade-or-install, in that order. The staging scope is removed on every exit path.
    pub async fn deploy(&self, cluster: &ClusterConfig, request: &DeploymentRequest) -> Result<()> {
        info!(
            release = request.release_name(),
            chart = request.chart_name(),
            namespace = request.namespace(),
            "Starting deployment"
        );

        ensure_cluster_version(&self.client, cluster.cluster_version()).await?;

        let tool = locate_tool(&self.config)?;

        ensure_repositories(&self.runner, tool.as_path(), &self.config).await?;

        ensure_namespace(&self.client, request.namespace()).await?;

        let mut scope = stage(request, cluster.kubeconfig(), &self.config)?;

        let result = execute(
            &self.runner,
            tool.as_path(),
            request,
            &scope,
            &self.config,
        )
        .await;

        settle_release(result, scope.release())
    }
}

/// Combines the upgrade outcome with the outcome of removing its staging scope. The upgrade
/// error takes precedence; a scope left behind after a successful upgrade is still a failure.
fn settle_release(result: Result<()>, released: Result<()>) -> Result<()> {
    match (result, released) {
        (Err(error), Err(cleanup_error)) => {
            warn!(error = %cleanup_error, "Failed to remove staging directory");
            Err(error)
        }
        (result, released) => result.and(released),
    }
}

/// Deploys a chart with the default settings, using the cluster's own kubeconfig for both the
/// version check and the chart-manager.
pub async fn deploy(
    config: &ClusterConfig,
    namespace: &str,
    chart_name: &str,
    release_name: &str,
    values: Vec<Mapping>,
    chart_version: Option<&str>,
) -> Result<()> {
    let request = values
        .into_iter()
        .fold(
            DeploymentRequest::builder()
                .with_namespace(namespace)
                .with_chart(chart_name)
                .with_release_name(release_name)
                .with_chart_version(chart_version),
            |builder, values| builder.with_values(values),
        )
        .build()?;

    deploy_with(config, &request, DeployerConfig::default()).await
}

/// Deploys a request with explicit deployer settings.
pub async fn deploy_with(
    config: &ClusterConfig,
    request: &DeploymentRequest,
    deployer_config: DeployerConfig,
) -> Result<()> {
    let client = KubeClientSet::from_kubeconfig(config.kubeconfig()).await?;
    Deployer::new(client, TokioProcessRunner, deployer_config)
        .deploy(config, request)
        .await
}
