use masstock_client::ClientError;
use masstock_core::wire::ExecutionView;
use serde::Serialize;

use crate::exit_codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_text(&self) -> bool {
        *self == OutputFormat::Text
    }
}

pub fn print_result<T: Serialize>(format: OutputFormat, quiet: bool, result: &T) {
    if quiet {
        return;
    }
    let rendered = match format {
        OutputFormat::Text => serde_json::to_string_pretty(result),
        OutputFormat::Json => serde_json::to_string(result),
    };
    if let Ok(json) = rendered {
        println!("{json}");
    }
}

pub fn print_error(format: OutputFormat, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Text => eprintln!("error: {message}"),
        OutputFormat::Json => {
            let err = serde_json::json!({"error": message});
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
        }
    }
}

/// One execution, as a short block in text mode.
pub fn print_view(format: OutputFormat, quiet: bool, view: &ExecutionView) {
    if quiet {
        return;
    }
    if !format.is_text() {
        print_result(format, quiet, view);
        return;
    }
    println!("execution {}", view.execution_id);
    println!("  workflow:  {}", view.workflow_id);
    println!("  status:    {}", view.status);
    println!("  retries:   {}", view.retry_count);
    println!("  created:   {}", view.created_at.to_rfc3339());
    if let Some(d) = view.duration_seconds {
        println!("  duration:  {d:.1}s");
    }
    if let Some(err) = &view.error {
        match &err.detail {
            Some(detail) => println!("  error:     {} ({detail})", err.message),
            None => println!("  error:     {}", err.message),
        }
    }
    if let Some(out) = &view.output_data {
        if let Ok(s) = serde_json::to_string_pretty(out) {
            println!("  output:    {}", s.replace('\n', "\n             "));
        }
    }
}

/// Reports an API failure and picks the exit code: input problems are
/// validation failures, everything else a runtime error.
pub fn report_client_error(format: OutputFormat, quiet: bool, err: &ClientError) -> i32 {
    print_error(format, quiet, &err.to_string());
    let ClientError::Api {
        code, violations, ..
    } = err
    else {
        return exit_codes::RUNTIME_ERROR;
    };
    if !quiet && format.is_text() {
        for v in violations {
            eprintln!("- {}: {}", v.path, v.message);
        }
    } else if !quiet {
        print_result(format, quiet, violations);
    }
    if code == "VALIDATION_ERROR" {
        exit_codes::VALIDATION_FAILED
    } else {
        exit_codes::RUNTIME_ERROR
    }
}
