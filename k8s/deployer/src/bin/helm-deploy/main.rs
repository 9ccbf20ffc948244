use crate::opts::{BasicAuthSecretArgs, CliArgs, DeployArgs, Operation};
use clap::Parser;
use helm_deployer::{
    common::{file::read_values_file, kube_client::KubeClientSet},
    deploy_with,
    secret::{create_basic_auth_secret, BasicAuthCredential},
    ClusterConfig, DeployerConfig, DeploymentRequest, Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod opts;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let opts = CliArgs::parse();

    run(&opts).await.map_err(|error| {
        error!(%error, step = %error.step(), "helm-deploy failed");
        error
    })
}

/// Initialize logging components -- tracing.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(opts: &CliArgs) -> Result<()> {
    match opts.operation() {
        Operation::Deploy(args) => run_deploy(args).await,
        Operation::BasicAuthSecret(args) => run_basic_auth_secret(args).await,
    }
}

async fn run_deploy(args: &DeployArgs) -> Result<()> {
    let cluster = ClusterConfig::from_file(args.config())?;

    let mut builder = DeploymentRequest::builder()
        .with_namespace(args.namespace())
        .with_chart(args.chart())
        .with_release_name(args.release_name())
        .with_chart_version(args.chart_version());
    for path in args.values() {
        builder = builder.with_values(read_values_file(path)?);
    }
    let request = builder.build()?;

    let mut deployer_config = DeployerConfig::default().with_timeout(args.timeout());
    if let Some(search_path) = args.search_path() {
        deployer_config = deployer_config.with_search_path(search_path);
    }

    deploy_with(&cluster, &request, deployer_config).await?;

    info!(
        release = request.release_name(),
        namespace = request.namespace(),
        "Deployment complete"
    );
    Ok(())
}

async fn run_basic_auth_secret(args: &BasicAuthSecretArgs) -> Result<()> {
    let client = match args.config() {
        Some(path) => {
            let cluster = ClusterConfig::from_file(path)?;
            KubeClientSet::from_kubeconfig(cluster.kubeconfig()).await?
        }
        None => KubeClientSet::try_default().await?,
    };

    let credential = BasicAuthCredential::new(args.user(), args.password());
    create_basic_auth_secret(
        &client,
        args.secret_name().as_str(),
        args.namespace().as_str(),
        &credential,
    )
    .await
}
