use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware, web};

use crate::catalog::ProblemCatalog;
use crate::config::ServerConfig;
use crate::ledger::Ledger;
use crate::queue::RunQueue;
use crate::routes::{PreviewCases, configure, json_error_handler};
use crate::runtime::RuntimeRegistry;

pub fn build_server(
    server_config: ServerConfig,
    catalog: Arc<ProblemCatalog>,
    ledger: Arc<Ledger>,
    runtimes: Arc<RuntimeRegistry>,
    queue: Arc<RunQueue>,
    preview_cases: usize,
) -> std::io::Result<Server> {
    let catalog = web::Data::from(catalog);
    let ledger = web::Data::from(ledger);
    let runtimes = web::Data::from(runtimes);
    let queue = web::Data::from(queue);
    let preview_cases = web::Data::new(PreviewCases(preview_cases));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(catalog.clone())
            .app_data(ledger.clone())
            .app_data(runtimes.clone())
            .app_data(queue.clone())
            .app_data(preview_cases.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((
        server_config
            .bind_address
            .unwrap_or("127.0.0.1".to_string()),
        server_config.bind_port.unwrap_or(12345),
    ))?
    .run();

    Ok(server)
}
