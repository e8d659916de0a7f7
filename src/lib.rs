pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::error::{SyncError, SyncResult};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` turns on progress logging.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,mc_mod_getter=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}
