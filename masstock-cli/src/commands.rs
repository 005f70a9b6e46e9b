use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Keep executions in process memory and run workers in-process.
        #[arg(long)]
        in_memory: bool,
        /// Also run workers against the database queue.
        #[arg(long)]
        with_workers: bool,
        #[command(flatten)]
        catalog: CatalogArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        worker: WorkerArgs,
        #[command(flatten)]
        generator: GeneratorArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Consume queued executions until interrupted.
    Worker {
        #[command(flatten)]
        catalog: CatalogArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        worker: WorkerArgs,
        #[command(flatten)]
        generator: GeneratorArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    Migrate {
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Trigger a workflow; with --wait, follow it to the end.
    Execute {
        workflow_id: String,
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        idempotency_key: Option<String>,
        #[arg(long)]
        wait: bool,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        api: ApiArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    Status {
        execution_id: String,
        #[command(flatten)]
        api: ApiArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Poll an execution until it completes or fails.
    Wait {
        execution_id: String,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        api: ApiArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    Cancel {
        execution_id: String,
        #[command(flatten)]
        api: ApiArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    List {
        workflow_id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[command(flatten)]
        api: ApiArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the lifecycle events of an execution from the database.
    Events {
        execution_id: String,
        #[arg(long, short)]
        follow: bool,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Check a workflow catalog, and optionally an input against one of
    /// its workflows.
    Validate {
        path: PathBuf,
        #[arg(long, requires = "input")]
        workflow: Option<String>,
        #[arg(long, requires = "workflow")]
        input: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
}
