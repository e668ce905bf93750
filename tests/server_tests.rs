use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, test, web};
use assert_json_diff::{assert_json_eq, assert_json_include};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use grader::catalog::ProblemCatalog;
use grader::config::Dialect;
use grader::error::GradingError;
use grader::ledger::Ledger;
use grader::orchestrator::Orchestrator;
use grader::queue::RunQueue;
use grader::routes::{PreviewCases, configure, json_error_handler};
use grader::runtime::{
    Invocation, Launcher, ProcessAdapter, ProcessBootstrap, RuntimeAdapter, RuntimeProvisioner,
    RuntimeRegistry,
};
use grader::worker::worker;

const SOLVE: &str = "solve";
const STUB: &str = "stub";

/// Stands in for the JavaScript runtime, behaving according to the source:
/// `solve` answers two-sum, `stub` returns null, anything else fails to parse
struct MockJavascript;

#[async_trait]
impl RuntimeAdapter for MockJavascript {
    fn language(&self) -> &str {
        "javascript"
    }

    async fn invoke(
        &self,
        source: &str,
        _entry_point: &str,
        args: &[Value],
    ) -> Result<Invocation, GradingError> {
        let value = match source {
            SOLVE => {
                let nums: Vec<i64> = serde_json::from_value(args[0].clone()).unwrap();
                let target = args[1].as_i64().unwrap();
                let mut pair = Value::Null;
                'outer: for i in 0..nums.len() {
                    for j in i + 1..nums.len() {
                        if nums[i] + nums[j] == target {
                            pair = json!([j, i]);
                            break 'outer;
                        }
                    }
                }
                pair
            }
            STUB => Value::Null,
            _ => {
                return Err(GradingError::ExecutionError(
                    "Unexpected identifier".to_string(),
                ));
            }
        };
        Ok(Invocation {
            value,
            elapsed: Some(Duration::from_micros(420)),
        })
    }
}

struct Fixture {
    catalog: web::Data<ProblemCatalog>,
    ledger: web::Data<Ledger>,
    runtimes: web::Data<RuntimeRegistry>,
    queue: web::Data<RunQueue>,
    token: CancellationToken,
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Mock JavaScript runtime plus a hosted Python runtime that is never provisioned
fn create_fixture() -> Fixture {
    let mut registry = RuntimeRegistry::new();
    registry.register(Arc::new(MockJavascript));

    let python = Arc::new(RuntimeProvisioner::new(
        "python",
        "3",
        Arc::new(ProcessBootstrap::new(vec!["python3".into()], Dialect::Python)),
    ));
    registry.register(Arc::new(ProcessAdapter::new(
        "python",
        Dialect::Python,
        Launcher::Hosted(python),
        Duration::from_secs(5),
    )));

    let catalog = Arc::new(ProblemCatalog::load_dir("data/problems").unwrap());
    let runtimes = Arc::new(registry);
    let ledger = Arc::new(Ledger::new());
    let queue = Arc::new(RunQueue::new());
    let token = CancellationToken::new();

    tokio::spawn(worker(
        catalog.clone(),
        Arc::new(Orchestrator::new(runtimes.clone())),
        ledger.clone(),
        3,
        queue.clone(),
        token.clone(),
    ));

    Fixture {
        catalog: web::Data::from(catalog),
        ledger: web::Data::from(ledger),
        runtimes: web::Data::from(runtimes),
        queue: web::Data::from(queue),
        token,
    }
}

macro_rules! test_app {
    ($fixture:expr) => {
        test::init_service(
            App::new()
                .app_data($fixture.catalog.clone())
                .app_data($fixture.ledger.clone())
                .app_data($fixture.runtimes.clone())
                .app_data($fixture.queue.clone())
                .app_data(web::Data::new(PreviewCases(3)))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .configure(configure),
        )
        .await
    };
}

fn post(uri: &str, source_code: &str, language: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .set_json(json!({ "source_code": source_code, "language": language }))
}

#[actix_web::test]
async fn test_list_problems() {
    let fixture = create_fixture();
    let app = test_app!(fixture);

    let req = test::TestRequest::get().uri("/problems").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            "generate-parentheses",
            "nba-team-trade",
            "nvidia-stock-highs",
            "two-sum"
        ]
    );
    assert_json_include!(
        actual: body[3].clone(),
        expected: json!({ "id": "two-sum", "title": "Two Sum", "difficulty": "Easy" })
    );
}

#[actix_web::test]
async fn test_get_problem_hides_solutions() {
    let fixture = create_fixture();
    let app = test_app!(fixture);

    let req = test::TestRequest::get().uri("/problems/two-sum").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["default_language"], "javascript");
    for variant in body["code_variants"].as_array().unwrap() {
        assert!(variant.get("solution").is_none());
        assert_eq!(variant["entry_point"], "twoSum");
    }
    assert_eq!(body["sample_cases"].as_array().unwrap().len(), 3);
    assert_json_eq!(
        body["sample_cases"][0].clone(),
        json!({ "input": "nums = [2, 7, 11, 15], target = 9", "expected": "[0,1]" })
    );
}

#[actix_web::test]
async fn test_unknown_problem() {
    let fixture = create_fixture();
    let app = test_app!(fixture);

    let req = test::TestRequest::get().uri("/problems/three-sum").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_json_include!(
        actual: body,
        expected: json!({ "reason": "ERR_NOT_FOUND", "code": 3 })
    );

    let req = post("/problems/three-sum/submit", SOLVE, "javascript").to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    assert!(fixture.ledger.is_empty());
}

#[actix_web::test]
async fn test_run_uses_preview_cases_and_is_not_recorded() {
    let fixture = create_fixture();
    let app = test_app!(fixture);

    let req = post("/problems/two-sum/run", SOLVE, "javascript").to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_json_eq!(
        results[0].clone(),
        json!({
            "input": [[2, 7, 11, 15], 9],
            "expected": [0, 1],
            "actual": [1, 0],
            "passed": true,
            "runtime": "0.42ms"
        })
    );
    assert!(results.iter().all(|r| r["passed"] == true));
    assert!(fixture.ledger.is_empty());
}

#[actix_web::test]
async fn test_submissions_are_listed_newest_first() {
    let fixture = create_fixture();
    let app = test_app!(fixture);

    let req = post("/problems/two-sum/submit", STUB, "javascript").to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let first: Value = test::read_body_json(resp).await;
    assert_json_include!(
        actual: first.clone(),
        expected: json!({
            "id": 1,
            "problem_id": "two-sum",
            "language": "javascript",
            "source_code": STUB,
            "status": "Wrong Answer"
        })
    );
    assert_eq!(first["results"].as_array().unwrap().len(), 4);
    assert!(first["timestamp"].is_string());

    let req = post("/problems/two-sum/submit", SOLVE, "javascript").to_request();

    let resp = test::call_service(&app, req).await;
    let second: Value = test::read_body_json(resp).await;
    assert_eq!(second["id"], 2);
    assert_eq!(second["status"], "Accepted");

    let req = test::TestRequest::get()
        .uri("/problems/two-sum/submissions")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let history: Value = test::read_body_json(resp).await;
    assert_json_eq!(history, json!([second, first]));

    let req = test::TestRequest::get()
        .uri("/problems/nba-team-trade/submissions")
        .to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    assert_json_eq!(history, json!([]));
}

#[actix_web::test]
async fn test_syntax_error_submission() {
    let fixture = create_fixture();
    let app = test_app!(fixture);

    let req = post("/problems/two-sum/submit", "var twoSum = ;", "javascript").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "Error");
    assert_json_eq!(
        body["results"].clone(),
        json!([{
            "input": [[2, 7, 11, 15], 9],
            "expected": [0, 1],
            "actual": "Error: Unexpected identifier",
            "passed": false,
            "runtime": "N/A"
        }])
    );
}

#[actix_web::test]
async fn test_unavailable_runtime_is_reported() {
    let fixture = create_fixture();
    let app = test_app!(fixture);

    let req = post("/problems/two-sum/submit", SOLVE, "python").to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);
    let body: Value = test::read_body_json(resp).await;
    assert_json_include!(
        actual: body.clone(),
        expected: json!({ "reason": "ERR_RUNTIME_UNAVAILABLE", "code": 4 })
    );
    assert!(body["message"].as_str().unwrap().contains("python"));
    assert!(fixture.ledger.is_empty());

    let req = test::TestRequest::get().uri("/runtimes").to_request();
    let statuses: Value = test::call_and_read_body_json(&app, req).await;
    assert_json_eq!(
        statuses,
        json!([
            { "language": "javascript", "state": "ready" },
            { "language": "python", "state": "uninitialized" }
        ])
    );
}

#[actix_web::test]
async fn test_invalid_requests() {
    let fixture = create_fixture();
    let app = test_app!(fixture);

    let req = post("/problems/two-sum/run", SOLVE, "ruby").to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_json_eq!(
        body,
        json!({
            "reason": "ERR_INVALID_ARGUMENT",
            "code": 1,
            "message": "unsupported language: ruby"
        })
    );

    let req = test::TestRequest::post()
        .uri("/problems/two-sum/run")
        .set_json(json!({ "language": "javascript" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_json_include!(
        actual: body,
        expected: json!({ "reason": "ERR_INVALID_ARGUMENT", "code": 1 })
    );
}
