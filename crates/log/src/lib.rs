#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Switchboard Log
//!
//! Installs the global `tracing` subscriber for Switchboard binaries.
//! Libraries in the workspace only emit through `tracing` macros and never
//! touch the subscriber.
//!
//! ```rust,ignore
//! let _guard = switchboard_log::auto_init()?;
//! tracing::info!(pages = 6, "console ready");
//! ```
//!
//! `SWITCHBOARD_LOG` (falling back to `RUST_LOG`) holds filter directives;
//! `SWITCHBOARD_LOG_FORMAT` picks `pretty`, `compact` or `json`.

mod builder;
mod config;
mod error;

pub use builder::{LoggerBuilder, LoggerGuard, ReloadHandle};
pub use config::{Config, DisplayConfig, Format, LOG_ENV, LOG_FORMAT_ENV, Writer};
pub use error::{LogError, LogResult};

/// Pick a configuration from the environment and build type, then install it.
///
/// An explicit `SWITCHBOARD_LOG` or `RUST_LOG` wins. Otherwise debug builds get
/// [`Config::development`] and release builds [`Config::production`].
pub fn auto_init() -> LogResult<LoggerGuard> {
    if std::env::var_os(LOG_ENV).is_some() || std::env::var_os("RUST_LOG").is_some() {
        init_with(Config::from_env())
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::production())
    }
}

/// Install the default configuration.
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Install `config`.
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Install `config` unless a subscriber is already set.
///
/// For tests and embedders that may share a process with another logger.
pub fn try_init_with(config: Config) -> LogResult<LoggerGuard> {
    if tracing::dispatcher::has_been_set() {
        return Ok(LoggerGuard::noop());
    }
    init_with(config)
}
