use std::io::{self, Write};

use optimus_core::{CacheSnapshot, ServiceStatus};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

/// Diagnostics appended by `--show-cache`.
#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub cache: CacheSnapshot,
    pub status: ServiceStatus,
}

#[derive(Debug, Serialize)]
struct WithDiagnostics<'a> {
    data: &'a Value,
    #[serde(flatten)]
    diagnostics: &'a Diagnostics,
}

/// Writes one JSON document to stdout.
pub fn render(data: &Value, diagnostics: Option<&Diagnostics>, pretty: bool) -> Result<(), CliError> {
    let payload = match diagnostics {
        Some(diagnostics) => to_json(&WithDiagnostics { data, diagnostics }, pretty)?,
        None => to_json(data, pretty)?,
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{payload}")?;
    stdout.flush()?;
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(payload)
}
