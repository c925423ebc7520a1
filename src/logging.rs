//! Tracing subscriber setup for the binaries.
//!
//! The library only emits events through `tracing`; installing a subscriber
//! is left to whoever embeds it.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a formatted stderr subscriber. `RUST_LOG` wins when set; otherwise
/// `info`, or `debug` when `verbose`. Calling this twice is harmless.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}
