use fastnum::UD256;
use serde::{Deserialize, Serialize};

use super::AssetId;
use crate::num;

/// Order-filled event as it is exported by the exchange indexer.
///
/// All values are kept textual; this is the shape of both the fills CSV and
/// the subgraph `orderFilledEvents` entities. Missing columns read as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawFill {
    pub id: String,
    pub timestamp: String,
    pub transaction_hash: String,
    pub maker: String,
    pub taker: String,
    pub maker_asset_id: String,
    pub maker_amount_filled: String,
    pub taker_asset_id: String,
    pub taker_amount_filled: String,
    pub fee: String,
}

/// Single (partial) order fill.
///
/// Maker gives `maker_amount` of `maker_asset_id` to the taker and receives
/// `taker_amount` of `taker_asset_id` in exchange.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct Fill {
    pub tx_hash: String,
    pub timestamp: i64,
    pub maker: String,
    pub taker: String,
    pub maker_asset_id: AssetId,
    #[debug("{maker_amount}")]
    pub maker_amount: UD256,
    pub taker_asset_id: AssetId,
    #[debug("{taker_amount}")]
    pub taker_amount: UD256,
}

impl Fill {
    /// Normalizes raw fill, converting fixed-point amounts with the given
    /// converter. Unparseable numeric fields become zero.
    pub fn from_raw(raw: &RawFill, converter: num::Converter) -> Self {
        Self {
            tx_hash: raw.transaction_hash.trim().to_string(),
            timestamp: num::parse_timestamp(&raw.timestamp),
            maker: raw.maker.trim().to_string(),
            taker: raw.taker.trim().to_string(),
            maker_asset_id: AssetId::new(raw.maker_asset_id.trim()),
            maker_amount: converter.parse_unsigned(&raw.maker_amount_filled),
            taker_asset_id: AssetId::new(raw.taker_asset_id.trim()),
            taker_amount: converter.parse_unsigned(&raw.taker_amount_filled),
        }
    }

    /// Both assets exchanged in this fill, maker side first.
    pub fn assets(&self) -> [&AssetId; 2] {
        [&self.maker_asset_id, &self.taker_asset_id]
    }
}
