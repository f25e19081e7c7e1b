//! CLI module for cloudstore
//!
//! The host side of the crate: loads configuration, installs logging,
//! builds one backend and hands it to the requested command.
//!
//! - upload: copy a local file into a bucket
//! - download: fetch an object into a local file
//! - metadata: print what the backend knows about an object

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{download, execute, metadata, run_command, upload};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::StorageConfig;

/// Filter used when nothing else is configured
pub const DEFAULT_LOG_FILTER: &str = "cloudstore=info";

/// Pick the log filter: `--log-filter`, then `RUST_LOG`, then the config's
/// `log_filter`, then [`DEFAULT_LOG_FILTER`]
pub fn log_filter<'a>(
    flag: Option<&'a str>,
    rust_log: Option<&'a str>,
    configured: Option<&'a str>,
) -> &'a str {
    [flag, rust_log, configured]
        .into_iter()
        .flatten()
        .find(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER)
}

/// Install the stderr log subscriber
pub fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Parse arguments, run the command and print the JSON result.
///
/// Storage failures are reported as a JSON error object and also returned
/// so the process exits non-zero.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = StorageConfig::load(&cli.config);

    let rust_log = std::env::var("RUST_LOG").ok();
    let configured = config.as_ref().ok().and_then(|c| c.log_filter.as_deref());
    init_logging(log_filter(cli.log_filter.as_deref(), rust_log.as_deref(), configured));

    let result = config
        .map_err(CliError::from)
        .and_then(|config| run_command(&config, cli.command));

    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_precedence() {
        assert_eq!(log_filter(Some("trace"), Some("debug"), Some("warn")), "trace");
        assert_eq!(log_filter(None, Some("debug"), Some("warn")), "debug");
        assert_eq!(log_filter(None, None, Some("warn")), "warn");
        assert_eq!(log_filter(None, Some(""), None), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(None, None, None), DEFAULT_LOG_FILTER);
    }
}
