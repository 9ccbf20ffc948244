use crate::common::error::{K8sClientGeneration, KubeconfigLoad, Result};
use async_trait::async_trait;
use k8s_openapi::{
    api::core::v1::{Namespace, Secret},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::{
    api::{Api, PostParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use snafu::ResultExt;
use std::collections::BTreeMap;

/// The version reported by the live cluster's API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterVersion {
    pub major: String,
    pub minor: String,
}

/// The operations the deployer performs against a Kubernetes cluster.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Reads the version of the cluster's API server.
    async fn cluster_version(&self) -> kube::Result<ClusterVersion>;

    /// Checks whether a Namespace exists.
    async fn namespace_exists(&self, name: &str) -> kube::Result<bool>;

    /// Creates a Namespace.
    async fn create_namespace(&self, name: &str) -> kube::Result<()>;

    /// Checks whether a Secret exists in a Namespace.
    async fn secret_exists(&self, name: &str, namespace: &str) -> kube::Result<bool>;

    /// Creates a Secret from string data.
    async fn put_secret(
        &self,
        name: &str,
        namespace: &str,
        data: BTreeMap<String, String>,
    ) -> kube::Result<()>;
}

/// A ClusterClient backed by kube::Client.
#[derive(Clone)]
pub struct KubeClientSet {
    client: Client,
}

impl KubeClientSet {
    /// Generate a client set from the ambient kubeconfig or in-cluster environment.
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await.context(K8sClientGeneration)?;
        Ok(Self { client })
    }

    /// Generate a client set from a kubeconfig structure.
    pub async fn from_kubeconfig(kubeconfig: &Kubeconfig) -> Result<Self> {
        let config =
            Config::from_custom_kubeconfig(kubeconfig.clone(), &KubeConfigOptions::default())
                .await
                .context(KubeconfigLoad)?;
        let client = Client::try_from(config).context(K8sClientGeneration)?;
        Ok(Self { client })
    }

    /// Generate the Namespace api client.
    fn namespaces_api(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }

    /// Generate the Secret api client.
    fn secrets_api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterClient for KubeClientSet {
    async fn cluster_version(&self) -> kube::Result<ClusterVersion> {
        let info = self.client.apiserver_version().await?;
        Ok(ClusterVersion {
            major: info.major,
            minor: info.minor,
        })
    }

    async fn namespace_exists(&self, name: &str) -> kube::Result<bool> {
        Ok(self.namespaces_api().get_opt(name).await?.is_some())
    }

    async fn create_namespace(&self, name: &str) -> kube::Result<()> {
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        self.namespaces_api()
            .create(&PostParams::default(), &namespace)
            .await?;
        Ok(())
    }

    async fn secret_exists(&self, name: &str, namespace: &str) -> kube::Result<bool> {
        Ok(self.secrets_api(namespace).get_opt(name).await?.is_some())
    }

    async fn put_secret(
        &self,
        name: &str,
        namespace: &str,
        data: BTreeMap<String, String>,
    ) -> kube::Result<()> {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            string_data: Some(data),
            type_: Some("Opaque".to_string()),
            ..Default::default()
        };
        self.secrets_api(namespace)
            .create(&PostParams::default(), &secret)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{ClusterClient, ClusterVersion};
    use async_trait::async_trait;
    use kube::error::ErrorResponse;
    use std::{
        collections::{BTreeMap, BTreeSet},
        sync::Mutex,
    };

    /// An in-memory cluster which records every mutation made to it.
    pub(crate) struct FakeCluster {
        pub(crate) version: ClusterVersion,
        pub(crate) namespaces: Mutex<BTreeSet<String>>,
        pub(crate) secrets: Mutex<BTreeMap<(String, String), BTreeMap<String, String>>>,
        pub(crate) fail_namespace_create: bool,
        pub(crate) fail_version_query: bool,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl FakeCluster {
        pub(crate) fn at_version(major: &str, minor: &str) -> Self {
            Self {
                version: ClusterVersion {
                    major: major.to_string(),
                    minor: minor.to_string(),
                },
                namespaces: Mutex::new(BTreeSet::new()),
                secrets: Mutex::new(BTreeMap::new()),
                fail_namespace_create: false,
                fail_version_query: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_namespace(self, name: &str) -> Self {
            self.namespaces.lock().unwrap().insert(name.to_string());
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    pub(crate) fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: reason.to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[async_trait]
    impl ClusterClient for FakeCluster {
        async fn cluster_version(&self) -> kube::Result<ClusterVersion> {
            self.record("cluster_version".to_string());
            if self.fail_version_query {
                return Err(api_error(503, "ServiceUnavailable"));
            }
            Ok(self.version.clone())
        }

        async fn namespace_exists(&self, name: &str) -> kube::Result<bool> {
            self.record(format!("namespace_exists {name}"));
            Ok(self.namespaces.lock().unwrap().contains(name))
        }

        async fn create_namespace(&self, name: &str) -> kube::Result<()> {
            self.record(format!("create_namespace {name}"));
            if self.fail_namespace_create {
                return Err(api_error(403, "Forbidden"));
            }
            if !self.namespaces.lock().unwrap().insert(name.to_string()) {
                return Err(api_error(409, "AlreadyExists"));
            }
            Ok(())
        }

        async fn secret_exists(&self, name: &str, namespace: &str) -> kube::Result<bool> {
            self.record(format!("secret_exists {namespace}/{name}"));
            Ok(self
                .secrets
                .lock()
                .unwrap()
                .contains_key(&(namespace.to_string(), name.to_string())))
        }

        async fn put_secret(
            &self,
            name: &str,
            namespace: &str,
            data: BTreeMap<String, String>,
        ) -> kube::Result<()> {
            self.record(format!("put_secret {namespace}/{name}"));
            self.secrets
                .lock()
                .unwrap()
                .insert((namespace.to_string(), name.to_string()), data);
            Ok(())
        }
    }
}
