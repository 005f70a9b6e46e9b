use std::path::Path;

use masstock_core::{
    parse_catalog_str, validate_catalog, validate_workflow_input, DocumentFormat, ParseError,
    ValidationError,
};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    format: String,
    workflows: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

fn report_invalid(output: &OutputArgs, format: DocumentFormat, workflows: usize, err: &ValidationError) -> i32 {
    let errors: Vec<String> = err
        .violations
        .iter()
        .map(|v| format!("{}: {}", v.path, v.message))
        .collect();
    if output.format == OutputFormat::Text && !output.quiet {
        eprintln!("error: validation failed");
        for e in &errors {
            eprintln!("- {e}");
        }
    } else {
        print_result(
            output.format,
            output.quiet,
            &ValidateResult {
                valid: false,
                format: format!("{format:?}"),
                workflows,
                errors,
            },
        );
    }
    exit_codes::VALIDATION_FAILED
}

pub async fn validate_cmd(
    path: &Path,
    workflow: Option<&str>,
    input: Option<&str>,
    output: OutputArgs,
) -> i32 {
    let content = match std::fs::read_to_string(path) {
        Ok(v) => v,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let parsed = match parse_catalog_str(&content, DocumentFormat::Auto) {
        Ok(p) => p,
        Err(ParseError::Json(e)) => {
            print_error(output.format, output.quiet, &format!("JSON parse failed: {e}"));
            return exit_codes::VALIDATION_FAILED;
        }
        Err(ParseError::Yaml(e)) => {
            print_error(output.format, output.quiet, &format!("YAML parse failed: {e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };
    let workflows = parsed.catalog.workflows.len();

    if let Err(err) = validate_catalog(&parsed.catalog) {
        return report_invalid(&output, parsed.format, workflows, &err);
    }

    if let (Some(workflow_id), Some(raw)) = (workflow, input) {
        let Some(wf) = parsed.catalog.workflows.iter().find(|w| w.id == workflow_id) else {
            print_error(
                output.format,
                output.quiet,
                &format!("workflow {workflow_id} is not in the catalog"),
            );
            return exit_codes::VALIDATION_FAILED;
        };
        let input_data = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                print_error(output.format, output.quiet, &format!("--input is not valid JSON: {e}"));
                return exit_codes::VALIDATION_FAILED;
            }
        };
        if let Err(err) = validate_workflow_input(wf, &input_data) {
            return report_invalid(&output, parsed.format, workflows, &err);
        }
    }

    if output.format == OutputFormat::Text && !output.quiet {
        println!("ok: valid catalog with {workflows} workflow(s) ({:?})", parsed.format);
    } else {
        print_result(
            output.format,
            output.quiet,
            &ValidateResult {
                valid: true,
                format: format!("{:?}", parsed.format),
                workflows,
                errors: vec![],
            },
        );
    }
    exit_codes::SUCCESS
}
