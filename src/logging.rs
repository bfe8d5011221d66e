//! Diagnostic logging setup for the binary.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "OLLACHAT_LOG";
pub const DEFAULT_DIRECTIVES: &str = "warn";

/// Parse filter directives, falling back to [`DEFAULT_DIRECTIVES`] when
/// they are missing or invalid.
pub fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber. Output goes to stderr, or is appended to
/// `log_file` without ANSI colors.
pub fn init(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let directives = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_from(directives.as_deref()))
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| err as Box<dyn Error>)?;
        }
        None => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| err as Box<dyn Error>)?,
    }
    Ok(())
}
