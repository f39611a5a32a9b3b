//! Logging setup
//!
//! The engine logs through the `log` facade; applications pick the backend. These helpers
//! install `env_logger`, which reads `RUST_LOG`.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize logging with a default filter used when `RUST_LOG` is unset
///
/// `filter` uses env_logger syntax, e.g. `"info"` or `"lens_engine=debug"`.
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}
