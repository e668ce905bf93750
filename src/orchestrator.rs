use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::adapt;
use crate::comparator;
use crate::error::GradingError;
use crate::problem::{Problem, TestCase};
use crate::runtime::RuntimeRegistry;

/// Prefix of the `actual` value recorded when user code raised
pub const ERROR_PREFIX: &str = "Error: ";
/// Runtime shown for a case whose invocation failed
pub const RUNTIME_NOT_MEASURED: &str = "N/A";

/// Outcome of one test case in one run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub input: Vec<Value>,
    pub expected: Value,
    pub actual: Value,
    pub passed: bool,
    pub runtime: String,
}

impl ExecutionResult {
    /// Whether `actual` carries the error sentinel
    pub fn is_error(&self) -> bool {
        self.actual
            .as_str()
            .is_some_and(|s| s.starts_with(ERROR_PREFIX))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    Error,
}

/// Aggregate verdict of a run
///
/// `Error` if any case carries the error sentinel, `Accepted` if there is at
/// least one case and all of them passed, `Wrong Answer` otherwise.
pub fn aggregate_verdict(results: &[ExecutionResult]) -> SubmissionStatus {
    if results.iter().any(ExecutionResult::is_error) {
        SubmissionStatus::Error
    } else if !results.is_empty() && results.iter().all(|r| r.passed) {
        SubmissionStatus::Accepted
    } else {
        SubmissionStatus::WrongAnswer
    }
}

fn format_runtime(elapsed: Duration) -> String {
    format!("{:.2}ms", elapsed.as_secs_f64() * 1000.0)
}

/// Drives user code through a list of test cases, one at a time
pub struct Orchestrator {
    runtimes: Arc<RuntimeRegistry>,
    continue_on_error: bool,
}

impl Orchestrator {
    pub fn new(runtimes: Arc<RuntimeRegistry>) -> Self {
        Self {
            runtimes,
            continue_on_error: false,
        }
    }

    /// Keep running the remaining cases after user code raised
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub fn runtimes(&self) -> &RuntimeRegistry {
        &self.runtimes
    }

    /// Runs `source` against `test_cases` in order
    ///
    /// Returns one result per executed case. Unless `continue_on_error` is
    /// set, the run stops after the first case whose invocation raised; that
    /// case is the last element of the list. Fails without any result if the
    /// language is not usable for this problem or its runtime is not ready.
    pub async fn run(
        &self,
        source: &str,
        language: &str,
        problem: &Problem,
        test_cases: &[TestCase],
    ) -> Result<Vec<ExecutionResult>, GradingError> {
        let runtime = self
            .runtimes
            .get(language)
            .ok_or_else(|| GradingError::UnsupportedLanguage(language.to_string()))?;
        let variant = problem
            .variant(language)
            .ok_or_else(|| GradingError::UnsupportedLanguage(language.to_string()))?;
        runtime.ensure_ready()?;

        let mut results = Vec::with_capacity(test_cases.len());

        for (idx, case) in test_cases.iter().enumerate() {
            let args = adapt(&problem.signature, &case.input)?;

            let start = Instant::now();
            let outcome = runtime.invoke(source, &variant.entry_point, &args).await;
            let measured = start.elapsed();

            match outcome {
                Ok(invocation) => {
                    let passed =
                        comparator::equal(&invocation.value, &case.expected, problem.comparison);
                    log::debug!(
                        "{} case {} on {language}: {}",
                        problem.id,
                        idx + 1,
                        if passed { "passed" } else { "failed" }
                    );
                    results.push(ExecutionResult {
                        input: args,
                        expected: case.expected.clone(),
                        actual: invocation.value,
                        passed,
                        runtime: format_runtime(invocation.elapsed.unwrap_or(measured)),
                    });
                }
                Err(GradingError::ExecutionError(message)) => {
                    log::debug!(
                        "{} case {} on {language} raised: {message}",
                        problem.id,
                        idx + 1
                    );
                    results.push(ExecutionResult {
                        input: args,
                        expected: case.expected.clone(),
                        actual: Value::String(format!("{ERROR_PREFIX}{message}")),
                        passed: false,
                        runtime: RUNTIME_NOT_MEASURED.to_string(),
                    });
                    if !self.continue_on_error {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "Ran {}/{} cases of {} on {language}: {:?}",
            results.len(),
            test_cases.len(),
            problem.id,
            aggregate_verdict(&results)
        );
        Ok(results)
    }
}
