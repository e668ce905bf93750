use thiserror::Error;

/// Conditions raised by the grading core.
///
/// A failed comparison is not an error: it is an `ExecutionResult` with
/// `passed == false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GradingError {
    /// The language runtime never finished provisioning, or failed to.
    #[error("runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// User code raised while its entry point was being invoked.
    #[error("{0}")]
    ExecutionError(String),

    /// No adapter or no code variant exists for the requested language.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Adapted arguments do not match the entry point's declared arity.
    #[error("expected {expected} arguments after adaptation, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
}

