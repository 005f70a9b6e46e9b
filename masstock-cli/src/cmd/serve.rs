use std::sync::Arc;

use masstock_api::{build_router, serve, AppState, ServerConfig};
use masstock_exec::Dispatcher;
use masstock_store::{ExecutionStore, JobQueue, MemoryQueue, MemoryStore, PostgresStore};
use tokio::net::TcpListener;

use crate::cmd::engine::{build_generator, event_sink, join_all, load_catalog, worker_config, Engine};
use crate::exit_codes;
use crate::output::print_error;
use crate::utils::{database_url, redact_url_password, shutdown_token};
use crate::{CatalogArgs, GeneratorArgs, OutputArgs, StoreArgs, WorkerArgs};

#[allow(clippy::too_many_arguments)]
pub async fn serve_cmd(
    host: String,
    port: u16,
    in_memory: bool,
    with_workers: bool,
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

    let mut config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => return fail(e.to_string()),
    };
    config.host = host;
    config.port = port;
    let addr = match config.socket_addr() {
        Ok(a) => a,
        Err(e) => return fail(e.to_string()),
    };

    let catalog = match load_catalog(&catalog) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let (exec_store, queue): (Arc<dyn ExecutionStore>, Arc<dyn JobQueue>) = if in_memory {
        tracing::warn!("in-memory store: executions are lost on exit");
        (
            Arc::new(MemoryStore::new()) as Arc<dyn ExecutionStore>,
            Arc::new(MemoryQueue::new()) as Arc<dyn JobQueue>,
        )
    } else {
        let database_url = match database_url(&store) {
            Ok(u) => u,
            Err(e) => return fail(e),
        };
        match PostgresStore::connect(&database_url, store.max_connections).await {
            Ok(pg) => {
                let pg = Arc::new(pg);
                (
                    pg.clone() as Arc<dyn ExecutionStore>,
                    pg as Arc<dyn JobQueue>,
                )
            }
            Err(e) => {
                return fail(format!(
                    "database connection failed to {}: {e}",
                    redact_url_password(&database_url)
                ))
            }
        }
    };

    let engine = Engine {
        event_sink: event_sink(exec_store.clone()),
        store: exec_store,
        queue,
        catalog,
    };
    let shutdown = shutdown_token();

    // The in-memory queue is only reachable from this process.
    let mut tasks = Vec::new();
    if in_memory || with_workers {
        let generator = match build_generator(&generator) {
            Ok(g) => g,
            Err(e) => return fail(e),
        };
        tasks = engine.spawn_workers(generator, worker_config(&worker), &shutdown);
    }

    let dispatcher = Dispatcher::new(
        engine.store.clone(),
        engine.queue.clone(),
        engine.catalog.clone(),
        engine.event_sink.clone(),
    );
    let app = build_router(AppState::new(Arc::new(dispatcher)), &config);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            shutdown.cancel();
            join_all(tasks).await;
            return fail(format!("failed to bind {addr}: {e}"));
        }
    };

    let served = serve(listener, app, shutdown.clone()).await;
    shutdown.cancel();
    join_all(tasks).await;

    match served {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => fail(format!("server error: {e}")),
    }
}
