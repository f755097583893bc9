use alloy::primitives::hex;

/// Error returned by trade canonicalization and its data sources.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no usable token ID source: {0}")]
    NoTokenSource(String),

    #[error("invalid market: {0}")]
    InvalidMarket(String),

    #[error("no token/settlement fills found")]
    NoEligibleFills,

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("graphql error: {0}")]
    GraphQl(String),

    #[error("market not found for condition {0}")]
    MarketNotFound(String),

    #[error("expected 2 market tokens, got {0:?}")]
    UnexpectedTokens(Vec<String>),
}

impl Error {
    /// Whether the failed request is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
