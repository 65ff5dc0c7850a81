//! Shared utilities for ovrwrap: configuration, logging, error types.
//!
//! Every other crate in the workspace depends on this one for its error
//! vocabulary and for the process-wide [`ShimSettings`].

#![forbid(unsafe_code)]

pub mod config;
pub mod error;

pub use config::{ChainLengthPolicy, ShimSettings};
pub use error::{Error, Result};

/// Initialize tracing for a host process that loaded the shim.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used. Output goes
/// to stderr so it never interleaves with anything the host writes to
/// stdout. Calling this more than once is harmless: the first subscriber
/// stays installed.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize tracing from loaded settings.
pub fn init_tracing_from(settings: &ShimSettings) {
    init_tracing(&settings.log_filter);
}
