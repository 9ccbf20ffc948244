use crate::{
    common::{
        error::{ClusterVersionQuery, Result, VersionMismatch},
        kube_client::ClusterClient,
    },
    config::ExpectedVersion,
};
use snafu::{ensure, ResultExt};
use tracing::info;

/// Fails unless the cluster's major and minor versions are exactly the expected ones. This has
/// to pass before anything on the cluster or in the chart-manager's state is changed.
pub async fn ensure_cluster_version<C>(client: &C, expected: &ExpectedVersion) -> Result<()>
where
    C: ClusterClient + ?Sized,
{
    let actual = client.cluster_version().await.context(ClusterVersionQuery)?;

    ensure!(
        expected.matches(&actual),
        VersionMismatch {
            actual_major: actual.major.as_str(),
            actual_minor: actual.minor.as_str(),
            expected_major: expected.major.as_str(),
            expected_minor: expected.minor.as_str(),
        }
    );

    info!(
        major = actual.major.as_str(),
        minor = actual.minor.as_str(),
        "Validated cluster version"
    );
    Ok(())
}
