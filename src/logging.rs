//! Logging configuration using tracing
//!
//! Structured logging to stderr, filtered by the RUST_LOG environment variable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Sets up structured logging with:
/// - Filtering via RUST_LOG (defaults to "warn" so plan output stays readable)
/// - Compact formatted output to stderr
///
/// # Example RUST_LOG values
/// - `RUST_LOG=info` - One line per lifecycle call
/// - `RUST_LOG=jira_rest=debug` - Every HTTP request and response status
/// - `RUST_LOG=jiraform=debug,jira_rest=info` - Different levels per crate
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .compact(),
        )
        .try_init()
        .map_err(|e| crate::JiraformError::Config(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init();
}
