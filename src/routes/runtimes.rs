use actix_web::{HttpResponse, Responder, get, web};

use crate::runtime::RuntimeRegistry;

#[get("/runtimes")]
pub async fn get_runtimes_handler(runtimes: web::Data<RuntimeRegistry>) -> impl Responder {
    HttpResponse::Ok().json(runtimes.statuses())
}
