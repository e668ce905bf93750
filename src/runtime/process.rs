use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use uuid::Uuid;

use super::harness::{self, Reply};
use super::provision::{ProvisionState, RuntimeProvisioner};
use super::{Invocation, RuntimeAdapter, RuntimeStatus};
use crate::config::Dialect;
use crate::error::GradingError;

/// Where the interpreter command comes from
pub enum Launcher {
    /// Runnable straight away
    Direct(Vec<String>),
    /// Taken from the provisioner's handle once it is ready
    Hosted(Arc<RuntimeProvisioner>),
}

/// Runs each invocation in a fresh child interpreter
///
/// The child is killed if it does not answer within the time limit.
pub struct ProcessAdapter {
    language: String,
    dialect: Dialect,
    launcher: Launcher,
    time_limit: Duration,
}

impl ProcessAdapter {
    pub fn new(
        language: impl Into<String>,
        dialect: Dialect,
        launcher: Launcher,
        time_limit: Duration,
    ) -> Self {
        Self {
            language: language.into(),
            dialect,
            launcher,
            time_limit,
        }
    }

    fn command(&self) -> Result<Vec<String>, GradingError> {
        match &self.launcher {
            Launcher::Direct(command) => Ok(command.clone()),
            Launcher::Hosted(provisioner) => Ok(provisioner.handle()?.command().to_vec()),
        }
    }

    /// Spawns the harness, feeds it the payload and collects stdout
    async fn execute(&self, command: &[String], payload: &str, nonce: &str) -> Result<Reply> {
        let Some((program, args)) = command.split_first() else {
            bail!("Empty interpreter command");
        };

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .arg(harness::inline_flag(self.dialect))
            .arg(harness::script(self.dialect))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow!("Failed to start {program}: {e}"))?;

        // Closing stdin marks the end of the payload
        if let Some(stdin) = child.stdin.take() {
            let mut stdin = tokio::io::BufWriter::new(stdin);
            let written = match stdin.write_all(payload.as_bytes()).await {
                Ok(()) => stdin.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                // The child exited early; its stderr explains why
                log::debug!("Failed to write payload to {program}: {e}");
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match harness::parse_reply(&stdout, nonce) {
            Some(reply) => Ok(reply),
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty());
                match last_line {
                    Some(line) => bail!("{}", line.trim()),
                    None => bail!("{program} exited with {} without a result", output.status),
                }
            }
        }
    }
}

#[async_trait]
impl RuntimeAdapter for ProcessAdapter {
    fn language(&self) -> &str {
        &self.language
    }

    fn ensure_ready(&self) -> Result<(), GradingError> {
        self.command().map(|_| ())
    }

    fn status(&self) -> RuntimeStatus {
        match &self.launcher {
            Launcher::Direct(_) => RuntimeStatus::ready(&self.language),
            Launcher::Hosted(provisioner) => {
                let state = provisioner.state();
                let diagnostic = match &state {
                    ProvisionState::Failed(diagnostic) => Some(diagnostic.clone()),
                    _ => None,
                };
                RuntimeStatus {
                    language: self.language.clone(),
                    state: state.label(),
                    diagnostic,
                }
            }
        }
    }

    async fn invoke(
        &self,
        source: &str,
        entry_point: &str,
        args: &[Value],
    ) -> Result<Invocation, GradingError> {
        let command = self.command()?;
        let nonce = Uuid::new_v4().simple().to_string();
        let payload = harness::payload(source, entry_point, args, &nonce)
            .map_err(|e| GradingError::ExecutionError(format!("Unserializable arguments: {e}")))?;

        let execution = self.execute(&command, &payload, &nonce);
        let reply = match timeout(self.time_limit, execution).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(GradingError::ExecutionError(e.to_string())),
            Err(_) => {
                log::debug!(
                    "{} invocation of {entry_point} killed after {:?}",
                    self.language,
                    self.time_limit
                );
                return Err(GradingError::ExecutionError(format!(
                    "Time limit exceeded ({} ms)",
                    self.time_limit.as_millis()
                )));
            }
        };

        match reply {
            Reply::Returned { value, elapsed } => Ok(Invocation { value, elapsed }),
            Reply::Raised(message) | Reply::Malformed(message) => {
                Err(GradingError::ExecutionError(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_interpreter_is_execution_error() {
        let adapter = ProcessAdapter::new(
            "javascript",
            Dialect::Javascript,
            Launcher::Direct(vec!["definitely-not-node".into()]),
            Duration::from_secs(5),
        );
        let err = adapter
            .invoke("var f = () => 1;", "f", &[json!(1)])
            .await
            .unwrap_err();
        match err {
            GradingError::ExecutionError(message) => {
                assert!(message.contains("Failed to start"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_command_is_execution_error() {
        let adapter = ProcessAdapter::new(
            "python",
            Dialect::Python,
            Launcher::Direct(Vec::new()),
            Duration::from_secs(5),
        );
        assert!(matches!(
            adapter.invoke("", "f", &[]).await,
            Err(GradingError::ExecutionError(_))
        ));
    }

    #[test]
    fn test_direct_status_is_ready() {
        let adapter = ProcessAdapter::new(
            "javascript",
            Dialect::Javascript,
            Launcher::Direct(vec!["node".into()]),
            Duration::from_secs(5),
        );
        assert_eq!(adapter.status().state, "ready");
        assert!(adapter.ensure_ready().is_ok());
    }
}
