use std::time::Duration;

use masstock_store::{ExecutionEvent, ExecutionStore, PostgresStore};
use uuid::Uuid;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::{database_url, parse_execution_id, redact_url_password};
use crate::{OutputArgs, StoreArgs};

const PAGE: i64 = 100;
const FOLLOW_INTERVAL: Duration = Duration::from_millis(500);

fn print_event(output: &OutputArgs, event: &ExecutionEvent) {
    if output.format == OutputFormat::Text && !output.quiet {
        println!("{} {}", event.ts.to_rfc3339(), event.event_type);
        if !event.payload.is_null() && event.payload != serde_json::json!({}) {
            if let Ok(s) = serde_json::to_string(&event.payload) {
                println!("  {s}");
            }
        }
    } else {
        print_result(output.format, output.quiet, event);
    }
}

async fn print_after(
    store: &PostgresStore,
    execution_id: Uuid,
    after: &mut i64,
    output: &OutputArgs,
) -> Result<usize, String> {
    let mut printed = 0;
    loop {
        let events = store
            .get_events_after(execution_id, *after, PAGE)
            .await
            .map_err(|e| format!("failed to get events: {e}"))?;
        for event in &events {
            *after = event.id;
            print_event(output, event);
        }
        printed += events.len();
        if (events.len() as i64) < PAGE {
            return Ok(printed);
        }
    }
}

pub async fn events_cmd(
    execution_id: &str,
    follow: bool,
    store: StoreArgs,
    output: OutputArgs,
) -> i32 {
    let fail = |message: String| {
        print_error(output.format, output.quiet, &message);
        exit_codes::RUNTIME_ERROR
    };

    let execution_id = match parse_execution_id(execution_id) {
        Ok(id) => id,
        Err(e) => return fail(e),
    };
    let database_url = match database_url(&store) {
        Ok(u) => u,
        Err(e) => return fail(e),
    };
    let pg = match PostgresStore::connect(&database_url, store.max_connections).await {
        Ok(s) => s,
        Err(e) => {
            return fail(format!(
                "database connection failed to {}: {e}",
                redact_url_password(&database_url)
            ))
        }
    };

    match pg.get_execution(execution_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return fail(format!("execution {execution_id} not found")),
        Err(e) => return fail(format!("failed to load execution: {e}")),
    }

    let mut after = 0;
    loop {
        if let Err(e) = print_after(&pg, execution_id, &mut after, &output).await {
            return fail(e);
        }
        if !follow {
            return exit_codes::SUCCESS;
        }

        let terminal = match pg.get_execution(execution_id).await {
            Ok(record) => record.map_or(true, |r| r.is_terminal()),
            Err(e) => return fail(format!("failed to load execution: {e}")),
        };
        if terminal {
            // Events written with the terminal transition.
            return match print_after(&pg, execution_id, &mut after, &output).await {
                Ok(_) => exit_codes::SUCCESS,
                Err(e) => fail(e),
            };
        }
        tokio::time::sleep(FOLLOW_INTERVAL).await;
    }
}
