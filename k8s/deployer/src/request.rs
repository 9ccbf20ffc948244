use crate::common::error::{InvalidDeploymentRequest, Result};
use serde_yaml::Mapping;
use snafu::ensure;

/// What to deploy and where. Value mappings are passed to the chart-manager in order, so later
/// entries override earlier ones.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    namespace: String,
    chart_name: String,
    release_name: String,
    chart_version: Option<String>,
    values: Vec<Mapping>,
}

impl DeploymentRequest {
    /// This creates an empty builder.
    pub fn builder() -> DeploymentRequestBuilder {
        DeploymentRequestBuilder::default()
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_str()
    }

    pub fn chart_name(&self) -> &str {
        self.chart_name.as_str()
    }

    pub fn release_name(&self) -> &str {
        self.release_name.as_str()
    }

    pub fn chart_version(&self) -> Option<&str> {
        self.chart_version.as_deref()
    }

    pub fn values(&self) -> &[Mapping] {
        self.values.as_slice()
    }
}

/// This is a builder for DeploymentRequest.
#[derive(Default)]
pub struct DeploymentRequestBuilder {
    namespace: Option<String>,
    chart_name: Option<String>,
    release_name: Option<String>,
    chart_version: Option<String>,
    values: Vec<Mapping>,
}

impl DeploymentRequestBuilder {
    /// The Namespace the release is installed into. This is mandatory.
    #[must_use]
    pub fn with_namespace<J>(mut self, ns: J) -> Self
    where
        J: ToString,
    {
        self.namespace = Some(ns.to_string());
        self
    }

    /// The chart reference, e.g. 'concourse/concourse'. This is mandatory.
    #[must_use]
    pub fn with_chart<J>(mut self, chart_name: J) -> Self
    where
        J: ToString,
    {
        self.chart_name = Some(chart_name.to_string());
        self
    }

    /// The name of the Helm release. This is mandatory.
    #[must_use]
    pub fn with_release_name<J>(mut self, release_name: J) -> Self
    where
        J: ToString,
    {
        self.release_name = Some(release_name.to_string());
        self
    }

    /// Pin the chart version. The latest version is used if this is not set.
    #[must_use]
    pub fn with_chart_version<J>(mut self, chart_version: Option<J>) -> Self
    where
        J: ToString,
    {
        self.chart_version = chart_version.map(|v| v.to_string());
        self
    }

    /// Append a value mapping, after the ones which were added before.
    #[must_use]
    pub fn with_values(mut self, values: Mapping) -> Self {
        self.values.push(values);
        self
    }

    /// Build the DeploymentRequest.
    pub fn build(self) -> Result<DeploymentRequest> {
        let namespace = self.namespace.unwrap_or_default();
        let chart_name = self.chart_name.unwrap_or_default();
        let release_name = self.release_name.unwrap_or_default();

        ensure!(
            !namespace.is_empty(),
            InvalidDeploymentRequest {
                reason: "namespace must not be empty"
            }
        );
        ensure!(
            !chart_name.is_empty(),
            InvalidDeploymentRequest {
                reason: "chart name must not be empty"
            }
        );
        ensure!(
            !release_name.is_empty(),
            InvalidDeploymentRequest {
                reason: "release name must not be empty"
            }
        );

        Ok(DeploymentRequest {
            namespace,
            chart_name,
            release_name,
            chart_version: self.chart_version.filter(|v| !v.is_empty()),
            values: self.values,
        })
    }
}
