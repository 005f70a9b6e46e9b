use std::sync::Arc;

use masstock_store::PostgresStore;

use crate::cmd::engine::{build_generator, event_sink, join_all, load_catalog, worker_config, Engine};
use crate::exit_codes;
use crate::output::print_error;
use crate::utils::{database_url, redact_url_password, shutdown_token};
use crate::{CatalogArgs, GeneratorArgs, OutputArgs, StoreArgs, WorkerArgs};

pub async fn worker_cmd(
    catalog: CatalogArgs,
    store: StoreArgs,
    worker: WorkerArgs,
    generator: GeneratorArgs,
    output: OutputArgs,
) -> i32 {
    let fail = |message: String| {
        print_error(output.format, output.quiet, &message);
        exit_codes::RUNTIME_ERROR
    };

    let catalog = match load_catalog(&catalog) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let generator = match build_generator(&generator) {
        Ok(g) => g,
        Err(e) => return fail(e),
    };
    let database_url = match database_url(&store) {
        Ok(u) => u,
        Err(e) => return fail(e),
    };
    let pg = match PostgresStore::connect(&database_url, store.max_connections).await {
        Ok(pg) => Arc::new(pg),
        Err(e) => {
            return fail(format!(
                "database connection failed to {}: {e}",
                redact_url_password(&database_url)
            ))
        }
    };

    let engine = Engine {
        store: pg.clone(),
        queue: pg.clone(),
        catalog,
        event_sink: event_sink(pg),
    };
    let shutdown = shutdown_token();
    let tasks = engine.spawn_workers(generator, worker_config(&worker), &shutdown);
    tracing::info!(concurrency = worker.concurrency, "worker running; Ctrl-C to stop");

    join_all(tasks).await;
    exit_codes::SUCCESS
}
