//! Error types for the fill cleaner.

use crate::config::ConfigError;

/// Main error type for the fill cleaner.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Fills(#[from] ctf_fills::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
