use masstock_client::ListQuery;
use masstock_core::ExecutionStatus;

use crate::exit_codes;
use crate::output::{print_error, print_result, report_client_error};
use crate::utils::api_client;
use crate::{ApiArgs, OutputArgs};

pub async fn list_cmd(
    workflow_id: &str,
    status: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
    api: ApiArgs,
    output: OutputArgs,
) -> i32 {
    let status = match status.as_deref().map(str::parse::<ExecutionStatus>).transpose() {
        Ok(s) => s,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let client = match api_client(&api) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let list = match client
        .list_executions(workflow_id, &ListQuery { status, page, limit })
        .await
    {
        Ok(l) => l,
        Err(e) => return report_client_error(output.format, output.quiet, &e),
    };

    if output.format.is_text() && !output.quiet {
        for view in &list.executions {
            let duration = view
                .duration_seconds
                .map(|d| format!("{d:.1}s"))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{}  {:<10}  retries={}  {}  {}",
                view.execution_id,
                view.status.as_str(),
                view.retry_count,
                view.created_at.to_rfc3339(),
                duration
            );
        }
        let p = list.pagination;
        println!("page {} (limit {}), {} total", p.page, p.limit, p.total);
    } else {
        print_result(output.format, output.quiet, &list);
    }
    exit_codes::SUCCESS
}
