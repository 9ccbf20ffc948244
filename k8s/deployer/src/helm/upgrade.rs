use crate::{
    common::{
        constants::KUBECONFIG_ENV,
        error::{DeploymentExecutionFailed, Result},
    },
    config::DeployerConfig,
    helm::process::{Invocation, ProcessRunner},
    request::DeploymentRequest,
    staging::StagingScope,
    vec_to_strings,
};
use snafu::ensure;
use std::path::Path;
use tracing::{debug, info};

/// Builds `helm upgrade <release> <chart> --install --force --namespace <ns> [--version <v>]
/// [--values <file>]...`. Files are referenced relative to the staging scope, which is also the
/// working directory of the invocation.
pub fn upgrade_invocation(
    tool: &Path,
    request: &DeploymentRequest,
    scope: &StagingScope,
) -> Invocation {
    let mut args: Vec<String> = vec_to_strings![
        "upgrade",
        request.release_name(),
        request.chart_name(),
        "--install",
        "--force",
        "--namespace",
        request.namespace()
    ];

    if let Some(version) = request.chart_version() {
        args.extend(vec_to_strings!["--version", version]);
    }

    for value_file in scope.value_files() {
        args.extend(vec_to_strings!["--values", value_file]);
    }

    Invocation::new(tool, args)
        .with_env(KUBECONFIG_ENV, scope.kubeconfig_file())
        .with_current_dir(scope.path())
}

/// Runs the upgrade-or-install command against a staged scope.
pub async fn execute<R>(
    runner: &R,
    tool: &Path,
    request: &DeploymentRequest,
    scope: &StagingScope,
    config: &DeployerConfig,
) -> Result<()>
where
    R: ProcessRunner + ?Sized,
{
    let invocation = upgrade_invocation(tool, request, scope);
    debug!(command = %invocation.command(), args = ?invocation.args(), "Helm upgrade command");

    let output = runner.run(&invocation, config.timeout()).await?;

    let std_out = String::from_utf8_lossy(output.stdout.as_slice()).to_string();
    debug!(stdout = %std_out, "Helm upgrade command standard output");
    ensure!(
        output.status.success(),
        DeploymentExecutionFailed {
            command: invocation.command(),
            args: invocation.args().to_vec(),
            exit_code: output.status.code(),
            std_out,
            std_err: String::from_utf8_lossy(output.stderr.as_slice()).to_string(),
        }
    );

    info!(
        release = request.release_name(),
        chart = request.chart_name(),
        namespace = request.namespace(),
        "Deployed Helm release"
    );
    Ok(())
}
