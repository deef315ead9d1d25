//! Startup errors
//!
//! Anything that stops the server from coming up. Request-level
//! failures never use this type; they become responses.

use std::net::AddrParseError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
