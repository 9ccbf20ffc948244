/// Contains constants, errors and the Kubernetes client.
pub mod common;
/// Settings for the cluster and for the deployer.
pub mod config;
/// Runs a deployment from the version check through to the Helm release.
pub mod deploy;
/// Tools for running the Helm executable.
pub mod helm;
/// The deployment request.
pub mod request;
/// Creates basic-auth Secrets.
pub mod secret;
/// Materializes value files and the kubeconfig in a temporary directory.
pub mod staging;
/// Validates the cluster's version.
pub mod version;

pub use common::error::{Error, Result, Step};
pub use config::{ClusterConfig, DeployerConfig, ExpectedVersion};
pub use deploy::{deploy, deploy_with, Deployer};
pub use request::DeploymentRequest;
