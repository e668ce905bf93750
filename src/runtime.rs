mod harness;
mod process;
mod provision;

pub use process::{Launcher, ProcessAdapter};
pub use provision::{
    InterpreterBootstrap, ProcessBootstrap, ProvisionState, RuntimeHandle, RuntimeProvisioner,
};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::{LanguageConfig, RuntimeKind};
use crate::error::GradingError;

/// Value returned by a successful entry point call
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub value: Value,
    /// Duration of the call as measured inside the interpreter, if reported
    pub elapsed: Option<Duration>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    pub language: String,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl RuntimeStatus {
    pub fn ready(language: &str) -> Self {
        Self {
            language: language.to_string(),
            state: "ready",
            diagnostic: None,
        }
    }
}

/// Executes user code for one language
///
/// Implementations never let a host-level failure escape: anything that goes
/// wrong while invoking the entry point comes back as
/// [`GradingError::ExecutionError`].
#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    fn language(&self) -> &str;

    /// Fails with [`GradingError::RuntimeUnavailable`] while the runtime
    /// cannot take calls
    fn ensure_ready(&self) -> Result<(), GradingError> {
        Ok(())
    }

    fn status(&self) -> RuntimeStatus {
        RuntimeStatus::ready(self.language())
    }

    async fn invoke(
        &self,
        source: &str,
        entry_point: &str,
        args: &[Value],
    ) -> Result<Invocation, GradingError>;
}

/// Adapters by language name, plus the provisioners behind hosted ones
#[derive(Default)]
pub struct RuntimeRegistry {
    adapters: Vec<Arc<dyn RuntimeAdapter>>,
    provisioners: Vec<Arc<RuntimeProvisioner>>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one out-of-process adapter per configured language
    ///
    /// Hosted runtimes are created unprovisioned; call
    /// [`RuntimeRegistry::start_provisioning`] once a tokio runtime is running.
    pub fn from_config(languages: &[LanguageConfig]) -> Self {
        let mut registry = Self::new();
        for language in languages {
            let launcher = match &language.runtime {
                RuntimeKind::Direct => Launcher::Direct(language.command.clone()),
                RuntimeKind::Hosted { version } => {
                    let bootstrap =
                        ProcessBootstrap::new(language.command.clone(), language.dialect);
                    let provisioner = Arc::new(RuntimeProvisioner::new(
                        &language.name,
                        version,
                        Arc::new(bootstrap),
                    ));
                    registry.provisioners.push(provisioner.clone());
                    Launcher::Hosted(provisioner)
                }
            };
            registry.register(Arc::new(ProcessAdapter::new(
                &language.name,
                language.dialect,
                launcher,
                language.time_limit.into(),
            )));
        }
        registry
    }

    /// Adds an adapter, replacing any earlier one for the same language
    pub fn register(&mut self, adapter: Arc<dyn RuntimeAdapter>) {
        self.adapters.retain(|a| a.language() != adapter.language());
        self.adapters.push(adapter);
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn RuntimeAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.language() == language)
            .cloned()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.language())
    }

    pub fn statuses(&self) -> Vec<RuntimeStatus> {
        self.adapters.iter().map(|a| a.status()).collect()
    }

    pub fn start_provisioning(&self) {
        for provisioner in &self.provisioners {
            provisioner.start();
        }
    }

    /// Waits for every hosted runtime to reach a terminal state
    pub async fn wait_provisioned(&self) {
        for provisioner in &self.provisioners {
            if let Err(e) = provisioner.wait_ready().await {
                log::warn!("Runtime {} unavailable: {e}", provisioner.language());
            }
        }
    }
}
