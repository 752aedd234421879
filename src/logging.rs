//! Logging setup for the provider process.
//!
//! Output goes to **stderr**; stdout belongs to the host that launched the
//! provider. Filtering follows `RUST_LOG` and falls back to a default level.
//!
//! ```bash
//! # Trace every GraphQL round trip
//! RUST_LOG=warehouse_provider::client=debug ./terraform-provider-montecarlo
//!
//! # Lifecycle events only
//! RUST_LOG=warehouse_provider=info ./terraform-provider-montecarlo
//! ```
//!
//! Secrets never reach the log: credentials, tokens and temporary keys are either
//! skipped from spans or redacted by their `Debug` impls.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global subscriber, defaulting to [`DEFAULT_LOG_LEVEL`].
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LOG_LEVEL);
}

/// Install the global subscriber with a custom fallback level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Install the global subscriber unless one is already set.
///
/// Returns `false` when another subscriber won, which is the common case when
/// several tests share one process.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_LOG_LEVEL))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}
