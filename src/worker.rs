use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalog::ProblemCatalog;
use crate::error::GradingError;
use crate::ledger::Ledger;
use crate::orchestrator::Orchestrator;
use crate::queue::{RunKind, RunOutcome, RunQueue, RunRequest};

/// The single grading worker
///
/// Requests are taken off the queue one at a time, so no two orchestration
/// runs ever interleave.
pub async fn worker(
    catalog: Arc<ProblemCatalog>,
    orchestrator: Arc<Orchestrator>,
    ledger: Arc<Ledger>,
    preview_cases: usize,
    queue: Arc<RunQueue>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    log::info!("Worker initialized");

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                log::info!("Worker received shutdown signal, stopping");
                break;
            }

            request = queue.pop() => {
                let RunRequest { kind, problem_id, source_code, language, responder } = request;

                let Some(problem) = catalog.get_problem(&problem_id) else {
                    log::error!("Unknown problem {problem_id}, run discarded");
                    continue; // Dropping the responder tells the caller
                };
                log::info!("Worker got {kind:?} run of {problem_id} in {language}");

                let cases = match kind {
                    RunKind::Preview => problem.preview_cases(preview_cases),
                    RunKind::Submit => problem.test_cases.as_slice(),
                };

                let outcome: Result<RunOutcome, GradingError> = orchestrator
                    .run(&source_code, &language, problem, cases)
                    .await
                    .map(|results| match kind {
                        RunKind::Preview => RunOutcome::Preview(results),
                        RunKind::Submit => RunOutcome::Submitted(
                            ledger.append(&problem_id, &source_code, &language, results),
                        ),
                    });

                if let Err(e) = &outcome {
                    log::warn!("{kind:?} run of {problem_id} in {language} rejected: {e}");
                }
                if responder.send(outcome).is_err() {
                    log::warn!("Caller of {kind:?} run of {problem_id} went away before the result");
                }
            }
        };
    }

    log::info!("Worker has shut down gracefully");
    Ok(())
}
