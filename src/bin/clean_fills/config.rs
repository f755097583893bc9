//! Configuration for the fill cleaner.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): default market tokens
//! - CLI arguments: input/output files, token sources, trade metadata

use std::path::PathBuf;

use clap::Parser;
use ctf_fills::{
    fill::TradeMetadata,
    resolve::{ConditionSource, ResolverInput},
    types::{AssetId, Market, Perspective},
};

/// Environment configuration.
#[derive(Debug, Default, serde::Deserialize)]
pub struct EnvConfig {
    /// `Yes` token of the market used when no other token source resolves
    pub default_yes_token: Option<String>,

    /// `No` token of the market used when no other token source resolves
    pub default_no_token: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Fallback market, if both default tokens are configured.
    pub fn default_market(&self) -> Result<Option<Market>, ConfigError> {
        match (&self.default_yes_token, &self.default_no_token) {
            (Some(yes), Some(no)) => Market::new(AssetId::from(yes.as_str()), AssetId::from(no.as_str()))
                .map(Some)
                .map_err(|e| ConfigError::InvalidDefaultMarket(e.to_string())),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidDefaultMarket(
                "both DEFAULT_YES_TOKEN and DEFAULT_NO_TOKEN must be set".to_string(),
            )),
        }
    }
}

/// CLI arguments of the fill cleaner.
#[derive(Debug, Parser)]
#[command(name = "clean-fills")]
#[command(about = "Turns raw order fills into one trade per transaction and outcome")]
pub struct CliConfig {
    /// Raw fills CSV
    #[arg(long = "in", value_name = "PATH")]
    pub input: PathBuf,

    /// Output trades CSV
    #[arg(long = "out", value_name = "PATH")]
    pub output: PathBuf,

    /// Explicit `Yes` token ID
    #[arg(long)]
    pub yes_token: Option<String>,

    /// Explicit `No` token ID
    #[arg(long)]
    pub no_token: Option<String>,

    /// Condition ID (0x...) to derive token IDs from, requires --collateral
    #[arg(long)]
    pub condition: Option<String>,

    /// Collateral token address
    #[arg(long)]
    pub collateral: Option<String>,

    /// `Yes` outcome index
    #[arg(long, default_value_t = 0)]
    pub yes_index: u32,

    /// `No` outcome index
    #[arg(long, default_value_t = 1)]
    pub no_index: u32,

    /// Infer token IDs from the fills if no other source is given
    #[arg(long)]
    pub infer: bool,

    /// Title column text
    #[arg(long, default_value = "")]
    pub title: String,

    /// Slug column text
    #[arg(long, default_value = "")]
    pub slug: String,

    /// Event slug column text
    #[arg(long, default_value = "")]
    pub event_slug: String,

    /// Participant the trades are reported for: taker or maker
    #[arg(long, default_value = "taker")]
    pub perspective: String,
}

impl CliConfig {
    /// Token sources for the market resolver.
    pub fn to_resolver_input(&self, default_market: Option<Market>) -> Result<ResolverInput, ConfigError> {
        if self.yes_token.is_some() != self.no_token.is_some() {
            return Err(ConfigError::IncompleteTokenPair);
        }

        let condition = match (&self.condition, &self.collateral) {
            (Some(condition), Some(collateral)) => Some(
                ConditionSource::new(condition.as_str(), collateral.as_str())
                    .with_indices(self.yes_index, self.no_index),
            ),
            (None, _) => None,
            (Some(_), None) => return Err(ConfigError::MissingCollateral),
        };

        Ok(ResolverInput {
            yes_token: self.yes_token.clone(),
            no_token: self.no_token.clone(),
            condition,
            infer: self.infer,
            default_market,
        })
    }

    pub fn perspective(&self) -> Result<Perspective, ConfigError> {
        match self.perspective.to_ascii_lowercase().as_str() {
            "taker" => Ok(Perspective::Taker),
            "maker" => Ok(Perspective::Maker),
            other => Err(ConfigError::InvalidPerspective(other.to_string())),
        }
    }

    pub fn metadata(&self) -> TradeMetadata {
        TradeMetadata {
            title: self.title.clone(),
            slug: self.slug.clone(),
            event_slug: self.event_slug.clone(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("--yes-token and --no-token must be given together")]
    IncompleteTokenPair,

    #[error("--condition requires --collateral")]
    MissingCollateral,

    #[error("Invalid perspective '{0}', expected taker or maker")]
    InvalidPerspective(String),

    #[error("Invalid default market: {0}")]
    InvalidDefaultMarket(String),
}
