use serde::Serialize;

use masstock_store::{run_migrations, PostgresStore};

use crate::exit_codes;
use crate::output::{print_error, print_result};
use crate::utils::{database_url, redact_url_password};
use crate::{OutputArgs, StoreArgs};

#[derive(Serialize)]
struct MigrateResult {
    success: bool,
    message: String,
}

pub async fn migrate_cmd(store: StoreArgs, output: OutputArgs) -> i32 {
    let database_url = match database_url(&store) {
        Ok(v) => v,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let pg = match PostgresStore::connect(&database_url, store.max_connections).await {
        Ok(s) => s,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!(
                    "failed to connect to {}: {e}",
                    redact_url_password(&database_url)
                ),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    match run_migrations(pg.pool()).await {
        Ok(()) => {
            if output.format.is_text() && !output.quiet {
                println!("ok: migrations applied");
            } else {
                print_result(
                    output.format,
                    output.quiet,
                    &MigrateResult {
                        success: true,
                        message: "migrations applied".to_string(),
                    },
                );
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &format!("migration failed: {e}"));
            exit_codes::RUNTIME_ERROR
        }
    }
}
