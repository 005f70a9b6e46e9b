use crate::exit_codes;
use crate::output::{print_error, print_view, report_client_error};
use crate::utils::{api_client, parse_execution_id};
use crate::{ApiArgs, OutputArgs};

/// Server-side cancellation: the execution ends `failed` with detail
/// `cancelled`.
pub async fn cancel_cmd(execution_id: &str, api: ApiArgs, output: OutputArgs) -> i32 {
    let (client, execution_id) = match api_client(&api)
        .and_then(|c| parse_execution_id(execution_id).map(|id| (c, id)))
    {
        Ok(v) => v,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    match client.cancel_execution(execution_id).await {
        Ok(view) => {
            print_view(output.format, output.quiet, &view);
            exit_codes::SUCCESS
        }
        Err(e) => report_client_error(output.format, output.quiet, &e),
    }
}
