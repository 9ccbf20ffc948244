use crate::common::error::{CommandTimeout, HelmCommand, Result};
use async_trait::async_trait;
use snafu::ResultExt;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Output, Stdio},
    time::Duration,
};
use tokio::process::Command;
use tracing::debug;

/// A fully specified external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, OsString)>,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new<P>(program: P, args: Vec<String>) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            program: program.as_ref().to_path_buf(),
            args,
            envs: Vec::new(),
            current_dir: None,
        }
    }

    /// Set an environment variable for the child, in addition to the inherited ones.
    #[must_use]
    pub fn with_env<K, V>(mut self, key: K, value: V) -> Self
    where
        K: ToString,
        V: Into<OsString>,
    {
        self.envs.push((key.to_string(), value.into()));
        self
    }

    /// Run the child from inside this directory.
    #[must_use]
    pub fn with_current_dir<P>(mut self, dir: P) -> Self
    where
        P: AsRef<Path>,
    {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn program(&self) -> &Path {
        self.program.as_path()
    }

    pub fn args(&self) -> &[String] {
        self.args.as_slice()
    }

    pub fn envs(&self) -> &[(String, OsString)] {
        self.envs.as_slice()
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// The program path, for log and error messages.
    pub(crate) fn command(&self) -> String {
        self.program.to_string_lossy().to_string()
    }
}

/// Runs an invocation to completion and returns its exit status and captured output. Spawn
/// failures and timeouts are errors, a non-zero exit status is not.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<Output>;
}

/// Runs invocations as tokio child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<Output> {
        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in invocation.envs() {
            command.env(key, value);
        }
        if let Some(dir) = invocation.current_dir() {
            command.current_dir(dir);
        }

        debug!(command = %invocation.command(), args = ?invocation.args(), "Running command");

        // Dropping the pending output future kills the child.
        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| {
                CommandTimeout {
                    command: invocation.command(),
                    args: invocation.args().to_vec(),
                    timeout,
                }
                .build()
            })?
            .context(HelmCommand {
                command: invocation.command(),
                args: invocation.args().to_vec(),
            })?;

        debug!(
            command = %invocation.command(),
            status = %output.status,
            stdout = %String::from_utf8_lossy(output.stdout.as_slice()),
            "Command exited"
        );

        Ok(output)
    }
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::{Invocation, ProcessRunner, TokioProcessRunner};
    use crate::{common::error::Result, vec_to_strings};
    use async_trait::async_trait;
    use std::{os::unix::process::ExitStatusExt, process::Output, sync::Mutex, time::Duration};

    /// A ProcessRunner which records invocations and answers with canned exit codes.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        invocations: Mutex<Vec<Invocation>>,
        failing_subcommand: Option<(String, i32)>,
        /// Every invocation's working directory, listed while the invocation ran.
        seen_dir_entries: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingRunner {
        /// Fail invocations whose first argument is `subcommand` with `code`.
        pub(crate) fn failing(subcommand: &str, code: i32) -> Self {
            Self {
                failing_subcommand: Some((subcommand.to_string(), code)),
                ..Default::default()
            }
        }

        pub(crate) fn invocations(&self) -> Vec<Invocation> {
            self.invocations.lock().unwrap().clone()
        }

        pub(crate) fn seen_dir_entries(&self) -> Vec<Vec<String>> {
            self.seen_dir_entries.lock().unwrap().clone()
        }
    }

    pub(crate) fn exit_output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn run(&self, invocation: &Invocation, _timeout: Duration) -> Result<Output> {
            self.invocations.lock().unwrap().push(invocation.clone());
            if let Some(dir) = invocation.current_dir() {
                let mut entries: Vec<String> = std::fs::read_dir(dir)
                    .map(|rd| {
                        rd.map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                entries.sort();
                self.seen_dir_entries.lock().unwrap().push(entries);
            }

            match &self.failing_subcommand {
                Some((subcommand, code))
                    if invocation.args().first() == Some(subcommand) =>
                {
                    Ok(exit_output(*code, "", "Error: boom"))
                }
                _ => Ok(exit_output(0, "ok", "")),
            }
        }
    }

    #[tokio::test]
    async fn test_tokio_runner_captures_output_env_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = Invocation::new(
            "/bin/sh",
            vec_to_strings!["-c", "echo \"$KUBECONFIG\"; pwd; echo oops >&2; exit 3"],
        )
        .with_env("KUBECONFIG", "kubecfg")
        .with_current_dir(dir.path());

        let output = TokioProcessRunner
            .run(&invocation, Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(output.status.code(), Some(3));
        let stdout = String::from_utf8(output.stdout).unwrap();
        let mut lines = stdout.lines();
        assert_eq!(lines.next(), Some("kubecfg"));
        let cwd = std::path::PathBuf::from(lines.next().unwrap());
        assert_eq!(
            cwd.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
        assert_eq!(String::from_utf8(output.stderr).unwrap(), "oops\n");
    }

    #[tokio::test]
    async fn test_tokio_runner_times_out() {
        let invocation = Invocation::new("/bin/sh", vec_to_strings!["-c", "sleep 30"]);
        let result = TokioProcessRunner
            .run(&invocation, Duration::from_millis(200))
            .await;
        assert!(matches!(
            result,
            Err(crate::common::error::Error::CommandTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_tokio_runner_spawn_failure() {
        let invocation = Invocation::new("/nonexistent/helm3", vec_to_strings!["version"]);
        let result = TokioProcessRunner
            .run(&invocation, Duration::from_secs(5))
            .await;
        assert!(matches!(
            result,
            Err(crate::common::error::Error::HelmCommand { .. })
        ));
    }
}
