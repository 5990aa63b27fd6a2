//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Safe to call more than once; later calls leave the installed logger alone.
pub fn init() {
    let _ = env_logger::try_init();
}
