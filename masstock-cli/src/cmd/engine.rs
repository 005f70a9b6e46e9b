//! Wiring shared by `serve` and `worker`.

use std::sync::Arc;
use std::time::Duration;

use masstock_exec::executor::{CompositeEventSink, StoreEventSink, TracingEventSink};
use masstock_exec::retry::RetryConfig;
use masstock_exec::{
    EventSink, HttpGenerator, HttpGeneratorConfig, Reaper, ReaperConfig, StaticCatalog, Worker,
    WorkerConfig, WorkerPool,
};
use masstock_store::{ExecutionStore, JobQueue};
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::utils::catalog_path;
use crate::{CatalogArgs, GeneratorArgs, WorkerArgs};

pub fn load_catalog(args: &CatalogArgs) -> Result<Arc<StaticCatalog>, String> {
    let path = catalog_path(args)?;
    let catalog = StaticCatalog::from_path(&path).map_err(|e| e.to_string())?;
    tracing::info!(path = %path.display(), workflows = catalog.len(), "workflow catalog loaded");
    Ok(Arc::new(catalog))
}

pub fn build_generator(args: &GeneratorArgs) -> Result<Arc<HttpGenerator>, String> {
    let base_url = args
        .generator_url
        .clone()
        .or_else(|| std::env::var("MASSTOCK_GENERATOR_URL").ok())
        .map(|raw| Url::parse(&raw).map_err(|e| format!("invalid generator url {raw}: {e}")))
        .transpose()?;
    let api_token = args
        .generator_token
        .clone()
        .or_else(|| std::env::var("MASSTOCK_GENERATOR_TOKEN").ok())
        .map(SecretString::from);

    let generator = HttpGenerator::new(HttpGeneratorConfig {
        base_url,
        api_token,
        ..HttpGeneratorConfig::default()
    })
    .map_err(|e| format!("failed to build generator client: {e}"))?;
    Ok(Arc::new(generator))
}

pub fn worker_config(args: &WorkerArgs) -> WorkerConfig {
    WorkerConfig {
        concurrency: args.concurrency.max(1),
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        lease: Duration::from_secs(args.lease_secs),
        retry: RetryConfig {
            base_delay: Duration::from_millis(args.retry_base_delay_ms),
            max_delay: Duration::from_millis(args.retry_max_delay_ms),
            ..RetryConfig::default()
        },
        reaper: ReaperConfig {
            interval: Duration::from_secs(args.reaper_interval_secs.max(1)),
            grace: Duration::from_secs(args.reaper_grace_secs),
            ..ReaperConfig::default()
        },
    }
}

/// Structured logs plus the persisted event trail.
pub fn event_sink(store: Arc<dyn ExecutionStore>) -> Arc<dyn EventSink> {
    Arc::new(
        CompositeEventSink::new()
            .with(Arc::new(TracingEventSink))
            .with(Arc::new(StoreEventSink::new(store))),
    )
}

pub struct Engine {
    pub store: Arc<dyn ExecutionStore>,
    pub queue: Arc<dyn JobQueue>,
    pub catalog: Arc<StaticCatalog>,
    pub event_sink: Arc<dyn EventSink>,
}

impl Engine {
    /// Starts the worker pool and the reaper; both stop at `shutdown`.
    pub fn spawn_workers(
        &self,
        generator: Arc<HttpGenerator>,
        config: WorkerConfig,
        shutdown: &CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let worker = Arc::new(Worker::new(
            self.store.clone(),
            self.queue.clone(),
            self.catalog.clone(),
            generator,
            self.event_sink.clone(),
            config.retry.clone(),
        ));
        let reaper = Reaper::new(
            self.store.clone(),
            self.queue.clone(),
            self.event_sink.clone(),
            config.reaper.clone(),
        );
        let pool = WorkerPool::new(worker, self.queue.clone(), config);

        vec![
            tokio::spawn(pool.run(shutdown.clone())),
            tokio::spawn(reaper.run(shutdown.clone())),
        ]
    }
}

pub async fn join_all(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "background task ended abnormally");
        }
    }
}
