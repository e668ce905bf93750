mod problems;
mod runtimes;

pub use problems::*;
pub use runtimes::*;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;

use crate::error::GradingError;

#[derive(Serialize)]
struct ErrorResponse {
    reason: &'static str,
    code: u32,
}

#[derive(Serialize)]
struct ErrorResponseWithMessage {
    reason: &'static str,
    code: u32,
    message: String,
}

/// Number of leading test cases used by preview runs
#[derive(Debug, Clone, Copy)]
pub struct PreviewCases(pub usize);

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponseWithMessage {
        reason: "ERR_INVALID_ARGUMENT",
        code: 1,
        message: err.to_string(),
    });
    InternalError::from_response(err, response).into()
}

fn not_found(message: String) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponseWithMessage {
        reason: "ERR_NOT_FOUND",
        code: 3,
        message,
    })
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        reason: "ERR_INTERNAL",
        code: 6,
    })
}

fn grading_error_response(err: GradingError) -> HttpResponse {
    match err {
        GradingError::RuntimeUnavailable(message) => HttpResponse::ServiceUnavailable().json(
            ErrorResponseWithMessage {
                reason: "ERR_RUNTIME_UNAVAILABLE",
                code: 4,
                message,
            },
        ),
        GradingError::UnsupportedLanguage(_) => {
            HttpResponse::BadRequest().json(ErrorResponseWithMessage {
                reason: "ERR_INVALID_ARGUMENT",
                code: 1,
                message: err.to_string(),
            })
        }
        other => {
            log::error!("Unexpected grading failure: {other}");
            internal_error()
        }
    }
}

/// Registers every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_problems_handler)
        .service(get_problem_by_id_handler)
        .service(post_run_handler)
        .service(post_submit_handler)
        .service(get_submissions_handler)
        .service(get_runtimes_handler);
}
