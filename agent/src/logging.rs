//! Development-time tracing for debugging the loop.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output
//!   to stderr. Not part of product output.
//!
//! - **Operator output**: The final response, `COMMAND:` echo lines, and
//!   `[HITL]` decision lines go to stdout from the binary, driven by
//!   loop events. Always printed, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset. Output: stderr,
/// compact format.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
