use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;
mod utils;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "masstock", version, about = "MasStock workflow execution service and client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn init_tracing() {
    // Logs go to stderr so command output on stdout stays parseable.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "warn,masstock_api=info,masstock_exec=info,masstock_store=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Serve {
            host,
            port,
            in_memory,
            with_workers,
            catalog,
            store,
            worker,
            generator,
            output,
        } => {
            cmd::serve::serve_cmd(
                host,
                port,
                in_memory,
                with_workers,
                catalog,
                store,
                worker,
                generator,
                output,
            )
            .await
        }
        Command::Worker {
            catalog,
            store,
            worker,
            generator,
            output,
        } => cmd::worker::worker_cmd(catalog, store, worker, generator, output).await,
        Command::Migrate { store, output } => cmd::migrate::migrate_cmd(store, output).await,
        Command::Execute {
            workflow_id,
            input,
            idempotency_key,
            wait,
            poll,
            api,
            output,
        } => {
            cmd::execute::execute_cmd(&workflow_id, input, idempotency_key, wait, poll, api, output)
                .await
        }
        Command::Status {
            execution_id,
            api,
            output,
        } => cmd::status::status_cmd(&execution_id, api, output).await,
        Command::Wait {
            execution_id,
            poll,
            api,
            output,
        } => cmd::wait::wait_cmd(&execution_id, poll, api, output).await,
        Command::Cancel {
            execution_id,
            api,
            output,
        } => cmd::cancel::cancel_cmd(&execution_id, api, output).await,
        Command::List {
            workflow_id,
            status,
            page,
            limit,
            api,
            output,
        } => cmd::list::list_cmd(&workflow_id, status, page, limit, api, output).await,
        Command::Events {
            execution_id,
            follow,
            store,
            output,
        } => cmd::events::events_cmd(&execution_id, follow, store, output).await,
        Command::Validate {
            path,
            workflow,
            input,
            output,
        } => {
            cmd::validate::validate_cmd(&path, workflow.as_deref(), input.as_deref(), output).await
        }
    }
}
