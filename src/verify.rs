use std::fmt;

use crate::catalog::ProblemCatalog;
use crate::formatters::format_output;
use crate::orchestrator::{Orchestrator, SubmissionStatus, aggregate_verdict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub problem_id: String,
    pub language: String,
    pub reason: String,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.problem_id, self.language, self.reason)
    }
}

/// Grades every canonical solution against its full test case list
///
/// Only languages with a registered runtime are checked. Returns the
/// solutions that were not accepted.
pub async fn verify_solutions(
    catalog: &ProblemCatalog,
    orchestrator: &Orchestrator,
) -> Vec<VerificationFailure> {
    let languages: Vec<String> = orchestrator
        .runtimes()
        .languages()
        .map(str::to_string)
        .collect();
    let mut failures = Vec::new();

    for problem in catalog.problems() {
        for language in &languages {
            let Some(variant) = problem.variant(language) else {
                continue;
            };
            let Some(solution) = &variant.solution else {
                log::warn!("{} has no {language} solution to verify", problem.id);
                continue;
            };

            let failure = |reason: String| VerificationFailure {
                problem_id: problem.id.clone(),
                language: language.clone(),
                reason,
            };

            match orchestrator
                .run(solution, language, problem, &problem.test_cases)
                .await
            {
                Ok(results) => match aggregate_verdict(&results) {
                    SubmissionStatus::Accepted => {
                        log::info!("{} ({language}): accepted", problem.id)
                    }
                    status => {
                        let detail = results
                            .iter()
                            .position(|r| !r.passed)
                            .map(|idx| {
                                format!(
                                    " at case {}, got {}",
                                    idx + 1,
                                    format_output(&results[idx].actual)
                                )
                            })
                            .unwrap_or_default();
                        failures.push(failure(format!("{status:?}{detail}")));
                    }
                },
                Err(e) => failures.push(failure(e.to_string())),
            }
        }
    }

    failures
}
