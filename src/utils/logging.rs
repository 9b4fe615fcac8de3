//! Tracing setup for the binary.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "warn";

/// Filter directive for a `-v` count, falling back to the configured level.
pub fn filter_directive(verbosity: u8, configured: Option<&str>) -> String {
    match verbosity {
        0 => configured
            .map(str::trim)
            .filter(|level| !level.is_empty())
            .unwrap_or(DEFAULT_DIRECTIVE)
            .to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over everything else.
///
/// Events go to stderr, or to `log_file` (appended, no ANSI colours).
pub fn init_tracing(
    verbosity: u8,
    configured: Option<&str>,
    log_file: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive)?,
        _ => EnvFilter::try_new(filter_directive(verbosity, configured))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init().map_err(|e| e as Box<dyn Error>)?;
        }
        None => builder.with_writer(std::io::stderr).try_init().map_err(|e| e as Box<dyn Error>)?,
    }

    Ok(())
}
