use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;
use crate::metadata::Metadata;

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    meta: &'a Metadata,
    data: &'a Value,
}

/// Writes the command result to stdout. Logs go to stderr, so stdout
/// carries nothing else.
pub fn render(result: &CommandResult, meta: &Metadata, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => print!("{}", with_trailing_newline(&result.text)),
        OutputFormat::Json => println!("{}", to_json(result, meta)?),
    }
    Ok(())
}

fn to_json(result: &CommandResult, meta: &Metadata) -> Result<String, CliError> {
    let payload = JsonOutput {
        meta,
        data: &result.data,
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}

fn with_trailing_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_owned()
    } else {
        format!("{text}\n")
    }
}
