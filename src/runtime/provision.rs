use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::timeout;

use super::harness;
use crate::config::Dialect;
use crate::error::GradingError;

const BOOTSTRAP_TIME_LIMIT: Duration = Duration::from_secs(30);

/// Shared handle to a provisioned interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeHandle(Arc<HandleInner>);

#[derive(Debug, PartialEq, Eq)]
struct HandleInner {
    command: Vec<String>,
    version: String,
}

impl RuntimeHandle {
    pub fn new(command: Vec<String>, version: impl Into<String>) -> Self {
        Self(Arc::new(HandleInner {
            command,
            version: version.into(),
        }))
    }

    /// Interpreter argv
    pub fn command(&self) -> &[String] {
        &self.0.command
    }

    pub fn version(&self) -> &str {
        &self.0.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionState {
    Uninitialized,
    Loading,
    Ready(RuntimeHandle),
    /// Terminal; holds the user-facing diagnostic
    Failed(String),
}

impl ProvisionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }
}

/// The external "load interpreter by version" capability
#[async_trait]
pub trait InterpreterBootstrap: Send + Sync {
    async fn load(&self, version: &str) -> Result<RuntimeHandle>;
}

/// Launches the configured interpreter and checks its reported version
pub struct ProcessBootstrap {
    command: Vec<String>,
    dialect: Dialect,
}

impl ProcessBootstrap {
    pub fn new(command: Vec<String>, dialect: Dialect) -> Self {
        Self { command, dialect }
    }
}

#[async_trait]
impl InterpreterBootstrap for ProcessBootstrap {
    async fn load(&self, version: &str) -> Result<RuntimeHandle> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("Empty interpreter command");
        };

        let output = timeout(
            BOOTSTRAP_TIME_LIMIT,
            tokio::process::Command::new(program)
                .args(args)
                .arg(harness::inline_flag(self.dialect))
                .arg(harness::version_probe(self.dialect))
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| anyhow!("{program} did not start within {BOOTSTRAP_TIME_LIMIT:?}"))?
        .map_err(|e| anyhow!("Failed to spawn {program}: {e}"))?;

        if !output.status.success() {
            bail!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let detected = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !detected.starts_with(version) {
            bail!("{program} reports version {detected:?}, expected {version}");
        }

        Ok(RuntimeHandle::new(self.command.clone(), detected))
    }
}

/// Owns the lifecycle of one hosted interpreter
///
/// Provisioning starts at most once; the outcome is final for the lifetime
/// of this value. A failed interpreter is never retried.
pub struct RuntimeProvisioner {
    language: String,
    version: String,
    bootstrap: Arc<dyn InterpreterBootstrap>,
    state: watch::Sender<ProvisionState>,
}

impl RuntimeProvisioner {
    pub fn new(
        language: impl Into<String>,
        version: impl Into<String>,
        bootstrap: Arc<dyn InterpreterBootstrap>,
    ) -> Self {
        let (state, _) = watch::channel(ProvisionState::Uninitialized);
        Self {
            language: language.into(),
            version: version.into(),
            bootstrap,
            state,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Moves `Uninitialized -> Loading` and loads in the background
    ///
    /// Must be called from within a tokio runtime. Calls after the first are
    /// no-ops.
    pub fn start(self: &Arc<Self>) {
        let started = self.state.send_if_modified(|state| {
            if *state == ProvisionState::Uninitialized {
                *state = ProvisionState::Loading;
                true
            } else {
                false
            }
        });
        if !started {
            log::debug!("Runtime {} already provisioned or loading", self.language);
            return;
        }

        log::info!(
            "Provisioning runtime {} (version {})",
            self.language,
            self.version
        );
        let this = Arc::clone(self);
        tokio::spawn(async move { this.provision().await });
    }

    async fn provision(&self) {
        let outcome = match self.bootstrap.load(&self.version).await {
            Ok(handle) => {
                log::info!(
                    "Runtime {} ready (version {})",
                    self.language,
                    handle.version()
                );
                ProvisionState::Ready(handle)
            }
            Err(e) => {
                let diagnostic = format!(
                    "The {} environment failed to load: {e:#}. {} code execution will not be available.",
                    self.language, self.language
                );
                log::error!("{diagnostic}");
                ProvisionState::Failed(diagnostic)
            }
        };
        self.state.send_replace(outcome);
    }

    pub fn state(&self) -> ProvisionState {
        self.state.borrow().clone()
    }

    /// The ready handle, or `RuntimeUnavailable` without waiting
    pub fn handle(&self) -> Result<RuntimeHandle, GradingError> {
        match &*self.state.borrow() {
            ProvisionState::Ready(handle) => Ok(handle.clone()),
            ProvisionState::Failed(diagnostic) => {
                Err(GradingError::RuntimeUnavailable(diagnostic.clone()))
            }
            ProvisionState::Loading => Err(GradingError::RuntimeUnavailable(format!(
                "The {} environment is still loading.",
                self.language
            ))),
            ProvisionState::Uninitialized => Err(GradingError::RuntimeUnavailable(format!(
                "The {} environment has not been started.",
                self.language
            ))),
        }
    }

    /// Waits until provisioning reaches a terminal state
    ///
    /// Returns immediately if provisioning was never started.
    pub async fn wait_ready(&self) -> Result<RuntimeHandle, GradingError> {
        let mut rx = self.state.subscribe();
        if *rx.borrow() != ProvisionState::Uninitialized {
            // The sender lives in `self`, so the channel cannot close here
            let _ = rx.wait_for(ProvisionState::is_terminal).await;
        }
        self.handle()
    }
}
