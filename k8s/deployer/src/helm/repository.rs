use crate::{
    common::error::{RepositoryRegistrationFailed, Result},
    config::DeployerConfig,
    helm::process::{Invocation, ProcessRunner},
    vec_to_strings,
};
use snafu::ensure;
use std::path::Path;
use tracing::{debug, info};

/// The `repo add` and `repo update` invocations, in the order they have to run.
pub fn repository_invocations(tool: &Path, config: &DeployerConfig) -> Vec<Invocation> {
    let mut invocations: Vec<Invocation> = config
        .repositories()
        .iter()
        .map(|repo| {
            Invocation::new(
                tool,
                vec_to_strings!["repo", "add", repo.alias.as_str(), repo.url.as_str()],
            )
        })
        .collect();
    invocations.push(Invocation::new(tool, vec_to_strings!["repo", "update"]));
    invocations
}

/// Registers the configured chart repositories and refreshes the local repository index. Each
/// registration is idempotent, so nothing is rolled back when a later one fails.
pub async fn ensure_repositories<R>(
    runner: &R,
    tool: &Path,
    config: &DeployerConfig,
) -> Result<()>
where
    R: ProcessRunner + ?Sized,
{
    for invocation in repository_invocations(tool, config) {
        debug!(command = %invocation.command(), args = ?invocation.args(), "Helm repo command");

        let output = runner.run(&invocation, config.timeout()).await?;
        ensure!(
            output.status.success(),
            RepositoryRegistrationFailed {
                command: invocation.command(),
                args: invocation.args().to_vec(),
                exit_code: output.status.code(),
                std_err: String::from_utf8_lossy(output.stderr.as_slice()).to_string(),
            }
        );
    }

    info!(
        repositories = config.repositories().len(),
        "Registered chart repositories"
    );
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::{ensure_repositories, repository_invocations};
    use crate::{
        common::error::{Error, Step},
        config::{ChartRepository, DeployerConfig},
        helm::process::tests::RecordingRunner,
    };
    use std::path::Path;

    #[test]
    fn test_repository_invocations() {
        let invocations =
            repository_invocations(Path::new("/usr/bin/helm3"), &DeployerConfig::default());
        let args: Vec<Vec<String>> = invocations.iter().map(|i| i.args().to_vec()).collect();

        assert_eq!(
            args,
            vec![
                vec![
                    "repo",
                    "add",
                    "concourse",
                    "https://concourse-charts.storage.googleapis.com/"
                ],
                vec![
                    "repo",
                    "add",
                    "stable",
                    "https://kubernetes-charts.storage.googleapis.com/"
                ],
                vec!["repo", "update"],
            ]
        );
        assert!(invocations
            .iter()
            .all(|i| i.program() == Path::new("/usr/bin/helm3")));
    }

    #[tokio::test]
    async fn test_ensure_repositories_runs_every_invocation() {
        let runner = RecordingRunner::default();
        ensure_repositories(&runner, Path::new("helm"), &DeployerConfig::default())
            .await
            .unwrap();
        assert_eq!(runner.invocations().len(), 3);
    }

    #[tokio::test]
    async fn test_ensure_repositories_stops_at_first_failure() {
        let runner = RecordingRunner::failing("repo", 1);
        let config = DeployerConfig::default().with_repositories(vec![
            ChartRepository::new("a", "https://a.example.com/"),
            ChartRepository::new("b", "https://b.example.com/"),
        ]);

        let error = ensure_repositories(&runner, Path::new("helm"), &config)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            Error::RepositoryRegistrationFailed {
                exit_code: Some(1),
                ..
            }
        ));
        assert_eq!(error.step(), Step::RepositoryRegistrar);
        assert_eq!(runner.invocations().len(), 1);
    }
}
