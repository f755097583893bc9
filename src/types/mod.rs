mod fill;
mod market;

pub use fill::{Fill, RawFill};
pub use market::Market;

use serde::{Deserialize, Serialize};

/// Asset ID of the market collateral (settlement) currency.
pub const SETTLEMENT_ASSET: &str = "0";

/// ID of an exchange asset, as it appears in fill records.
///
/// Outcome token IDs are 256-bit integers rendered in decimal, the
/// settlement currency is the [`SETTLEMENT_ASSET`] sentinel.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn settlement() -> Self {
        Self(SETTLEMENT_ASSET.to_string())
    }

    pub fn is_settlement(&self) -> bool {
        self.0 == SETTLEMENT_ASSET
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Participant whose inventory change classifies the trade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Perspective {
    /// Liquidity taker, the party that submitted the matching order.
    #[default]
    Taker,
    /// Liquidity maker, the party whose resting order got filled.
    Maker,
}

/// Direction of the canonical trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Side {
    #[display("BUY")]
    Buy,
    #[display("SELL")]
    Sell,
}

/// Outcome of a binary market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum Outcome {
    Yes,
    No,
}

impl Perspective {
    /// Whether the perspective actor is the receiving party of the
    /// maker-side asset of a fill.
    pub(crate) fn receives_maker_asset(&self) -> bool {
        matches!(self, Perspective::Taker)
    }
}
