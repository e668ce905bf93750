use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use grader::catalog::ProblemCatalog;
use grader::config::{CliArgs, Config};
use grader::ledger::Ledger;
use grader::orchestrator::Orchestrator;
use grader::queue::RunQueue;
use grader::runtime::RuntimeRegistry;
use grader::verify::verify_solutions;
use grader::web_server::build_server;
use grader::worker::worker;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let config = cli.to_config().expect("Failed to load configuration");
    let preview_cases = config.preview_cases();
    let continue_on_error = config.continue_on_error();

    let Config {
        server: server_config,
        problems_dir,
        languages,
        ..
    } = config;

    let catalog = Arc::new(
        ProblemCatalog::load_dir(&problems_dir).expect("Failed to load problem catalog"),
    );

    let runtimes = Arc::new(RuntimeRegistry::from_config(&languages));
    runtimes.start_provisioning();

    let orchestrator = Arc::new(
        Orchestrator::new(runtimes.clone()).continue_on_error(continue_on_error),
    );

    if cli.verify_solutions {
        runtimes.wait_provisioned().await;
        let failures = verify_solutions(&catalog, &orchestrator).await;
        if failures.is_empty() {
            log::info!("All canonical solutions accepted");
            return Ok(());
        }
        for failure in &failures {
            log::error!("Canonical solution rejected: {failure}");
        }
        std::process::exit(1);
    }

    let ledger = Arc::new(Ledger::new());
    let run_queue = Arc::new(RunQueue::new());
    let shutdown_token = CancellationToken::new();

    // ======= PREPARATION END, EXECUTION START =======

    let mut worker_task = tokio::spawn(worker(
        catalog.clone(),
        orchestrator,
        ledger.clone(),
        preview_cases,
        run_queue.clone(),
        shutdown_token.clone(),
    ));

    let server = build_server(
        server_config,
        catalog,
        ledger,
        runtimes,
        run_queue,
        preview_cases,
    )
    .expect("Failed to build server");

    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    // ===== EXECUTION END, WAITING FOR SHUTDOWN ======

    let worker_finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-c received, shutting down...");
            false
        }
        res_server = server_task => {
            log::error!("Server terminated unexpectedly: {:?}", res_server);
            false
        }
        res_worker = &mut worker_task => {
            log::error!("Worker terminated unexpectedly: {:?}", res_worker);
            true
        }
    };

    // 1. Shutdown actix-web server gracefully
    server_handle.stop(true).await;

    // 2. Signal the worker and wait for it
    if !worker_finished {
        shutdown_token.cancel();
        log::info!("Shutdown signal sent to worker, waiting for it to finish...");
        match worker_task.await {
            Ok(Err(e)) => log::error!("Worker finished with error: {e:?}"),
            Err(e) if e.is_panic() => log::error!("Worker handle panicked: {e:?}"),
            Err(e) => log::error!("Worker handle finished with error: {e:?}"),
            Ok(Ok(())) => {}
        }
    }

    log::info!("Shutdown complete");
    Ok(())
}
