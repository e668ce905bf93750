use actix_web::{HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};

use super::{PreviewCases, grading_error_response, internal_error, not_found};
use crate::adapter::adapt;
use crate::catalog::ProblemCatalog;
use crate::formatters::{format_input, format_output};
use crate::ledger::Ledger;
use crate::orchestrator::ExecutionResult;
use crate::problem::{Difficulty, Example, Problem, Signature, SolutionInfo};
use crate::queue::{RunKind, RunOutcome, RunQueue, RunRequest};

#[derive(Serialize, Deserialize, Debug)]
pub struct RunSubmission {
    pub source_code: String,
    pub language: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RunResponse {
    pub results: Vec<ExecutionResult>,
}

#[derive(Serialize)]
struct ProblemSummary<'a> {
    id: &'a str,
    title: &'a str,
    difficulty: Difficulty,
}

#[derive(Serialize)]
struct CodeVariantView<'a> {
    language: &'a str,
    starter_code: &'a str,
    entry_point: &'a str,
}

/// A preview case rendered for display
#[derive(Serialize)]
struct SampleCase {
    input: String,
    expected: String,
}

/// Everything a client may see of a problem; canonical solutions stay hidden
#[derive(Serialize)]
struct ProblemView<'a> {
    id: &'a str,
    title: &'a str,
    difficulty: Difficulty,
    description: &'a str,
    examples: &'a [Example],
    constraints: &'a [String],
    default_language: &'a str,
    code_variants: Vec<CodeVariantView<'a>>,
    sample_cases: Vec<SampleCase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    solution_info: Option<&'a SolutionInfo>,
    signature: &'a Signature,
}

impl<'a> ProblemView<'a> {
    fn new(problem: &'a Problem, preview_cases: usize) -> Self {
        let sample_cases = problem
            .preview_cases(preview_cases)
            .iter()
            .map(|case| {
                let args = adapt(&problem.signature, &case.input)
                    .unwrap_or_else(|_| case.input.clone());
                SampleCase {
                    input: format_input(&problem.signature, &args),
                    expected: format_output(&case.expected),
                }
            })
            .collect();

        Self {
            id: &problem.id,
            title: &problem.title,
            difficulty: problem.difficulty,
            description: &problem.description,
            examples: &problem.examples,
            constraints: &problem.constraints,
            default_language: &problem.default_language,
            code_variants: problem
                .code_variants
                .iter()
                .map(|v| CodeVariantView {
                    language: &v.language,
                    starter_code: &v.starter_code,
                    entry_point: &v.entry_point,
                })
                .collect(),
            sample_cases,
            solution_info: problem.solution_info.as_ref(),
            signature: &problem.signature,
        }
    }
}

#[get("/problems")]
pub async fn get_problems_handler(catalog: web::Data<ProblemCatalog>) -> impl Responder {
    let summaries: Vec<ProblemSummary> = catalog
        .problems()
        .iter()
        .map(|p| ProblemSummary {
            id: &p.id,
            title: &p.title,
            difficulty: p.difficulty,
        })
        .collect();
    HttpResponse::Ok().json(summaries)
}

#[get("/problems/{id}")]
pub async fn get_problem_by_id_handler(
    catalog: web::Data<ProblemCatalog>,
    preview: web::Data<PreviewCases>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let problem_id = path.into_inner().0;

    match catalog.get_problem(&problem_id) {
        Some(problem) => HttpResponse::Ok().json(ProblemView::new(problem, preview.0)),
        None => not_found(format!("Problem {problem_id} not found.")),
    }
}

#[post("/problems/{id}/run")]
pub async fn post_run_handler(
    catalog: web::Data<ProblemCatalog>,
    queue: web::Data<RunQueue>,
    path: web::Path<(String,)>,
    body: web::Json<RunSubmission>,
) -> impl Responder {
    let problem_id = path.into_inner().0;
    if catalog.get_problem(&problem_id).is_none() {
        return not_found(format!("Problem {problem_id} not found."));
    }

    match enqueue(&queue, RunKind::Preview, problem_id, body.into_inner()).await {
        Ok(RunOutcome::Preview(results)) => HttpResponse::Ok().json(RunResponse { results }),
        Ok(RunOutcome::Submitted(submission)) => {
            log::error!("Preview run was recorded as submission {}", submission.id);
            internal_error()
        }
        Err(response) => response,
    }
}

#[post("/problems/{id}/submit")]
pub async fn post_submit_handler(
    catalog: web::Data<ProblemCatalog>,
    queue: web::Data<RunQueue>,
    path: web::Path<(String,)>,
    body: web::Json<RunSubmission>,
) -> impl Responder {
    let problem_id = path.into_inner().0;
    if catalog.get_problem(&problem_id).is_none() {
        return not_found(format!("Problem {problem_id} not found."));
    }

    match enqueue(&queue, RunKind::Submit, problem_id, body.into_inner()).await {
        Ok(RunOutcome::Submitted(submission)) => HttpResponse::Ok().json(submission),
        Ok(RunOutcome::Preview(_)) => {
            log::error!("Submission came back as a preview run");
            internal_error()
        }
        Err(response) => response,
    }
}

#[get("/problems/{id}/submissions")]
pub async fn get_submissions_handler(
    catalog: web::Data<ProblemCatalog>,
    ledger: web::Data<Ledger>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let problem_id = path.into_inner().0;
    if catalog.get_problem(&problem_id).is_none() {
        return not_found(format!("Problem {problem_id} not found."));
    }

    let submissions = ledger.for_problem(&problem_id);
    log::info!("Got {} submissions of {problem_id}", submissions.len());
    HttpResponse::Ok().json(submissions)
}

/// Hands a run to the worker and waits for its outcome
async fn enqueue(
    queue: &RunQueue,
    kind: RunKind,
    problem_id: String,
    body: RunSubmission,
) -> Result<RunOutcome, HttpResponse> {
    let (request, rx) = RunRequest::new(kind, problem_id, body.source_code, body.language);
    queue.push(request).await;
    log::debug!("Sent {kind:?} run to queue");

    match rx.await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(grading_error_response(e)),
        Err(e) => {
            log::error!("Failed to receive run result: {e}");
            Err(internal_error())
        }
    }
}
