//! Structured logging built on **tracing**.
//!
//! Performance characteristics:
//! - Non-blocking: tracing macros push events to a queue, not directly to I/O
//! - Works efficiently alongside Rayon's parallel workers
//! - Rich context: automatically captures level, timestamp, target, and thread ID
//!
//! The JSON subscriber provides machine-readable output for observability platforms.

/// Initializes the global tracing collector (subscriber).
///
/// This should be called *once* at the beginning of the application's runtime.
/// It configures structured JSON output to stderr.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=deadasm=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json() // Output logs in JSON format
        .with_ansi(false) // Disable ANSI codes in JSON output
        .with_level(true) // Include the log level field
        .with_target(true) // Include the module path (target)
        .with_current_span(true) // Include tracing span context
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG env var
        .with_writer(std::io::stderr) // Write to stderr (keeps stdout clean for tool output)
        .init();
}

/// Initializes logging with a fallback filter for when `RUST_LOG` is unset.
///
/// The CLI maps its `-v` flags to a default filter this way; an explicit
/// `RUST_LOG` always wins.
pub fn init_with_default_filter(default: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
