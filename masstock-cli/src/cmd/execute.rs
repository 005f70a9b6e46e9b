use masstock_core::wire::ExecuteRequest;

use crate::cmd::wait::wait_for;
use crate::exit_codes;
use crate::output::{print_error, print_result, report_client_error};
use crate::utils::{api_client, collect_input};
use crate::{ApiArgs, InputArgs, OutputArgs, PollArgs};

pub async fn execute_cmd(
    workflow_id: &str,
    input: InputArgs,
    idempotency_key: Option<String>,
    wait: bool,
    poll: PollArgs,
    api: ApiArgs,
    output: OutputArgs,
) -> i32 {
    let input_data = match collect_input(&input) {
        Ok(v) => v,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::VALIDATION_FAILED;
        }
    };
    let client = match api_client(&api) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let accepted = match client
        .execute(
            workflow_id,
            &ExecuteRequest {
                input_data,
                idempotency_key,
            },
        )
        .await
    {
        Ok(a) => a,
        Err(e) => return report_client_error(output.format, output.quiet, &e),
    };

    if output.format.is_text() && !output.quiet {
        println!("{} {}", accepted.execution_id, accepted.status);
    } else {
        print_result(output.format, output.quiet, &accepted);
    }

    if !wait {
        return exit_codes::SUCCESS;
    }
    wait_for(client, accepted.execution_id, &poll, &output).await
}
