//! Canonical trade data structures.

use chrono::{DateTime, Utc};
use fastnum::{D256, UD256};

use crate::types::{AssetId, Outcome, Side};

/// Net effect of all fills of a single outcome token within a single
/// transaction, from the perspective actor's point of view.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct NetFlow {
    /// Signed change of the actor's token position.
    #[debug("{net_tokens}")]
    pub net_tokens: D256,

    /// Settlement currency exchanged for the token, regardless of direction.
    #[debug("{volume}")]
    pub volume: UD256,

    /// Latest timestamp among contributing fills.
    pub timestamp: i64,
}

/// Trade resolved from the fills of a single outcome token within a single
/// transaction.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct NetTrade {
    pub tx_hash: String,
    pub timestamp: i64,
    pub side: Side,
    pub outcome: Outcome,

    /// Volume-weighted average price, `None` for zero size.
    #[debug("{price:?}")]
    pub price: Option<UD256>,

    /// Absolute net token amount.
    #[debug("{size}")]
    pub size: UD256,

    /// Settlement currency volume.
    #[debug("{volume}")]
    pub volume: UD256,

    pub asset: AssetId,

    /// Address of the perspective actor.
    pub wallet: String,
}

/// Display metadata attached to every output trade.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TradeMetadata {
    pub title: String,
    pub slug: String,
    pub event_slug: String,
}

/// Final, materialized trade row.
#[derive(Clone, Debug, PartialEq)]
pub struct Trade {
    pub timestamp: i64,
    pub datetime: Option<DateTime<Utc>>,
    pub side: Side,
    pub outcome: Outcome,
    pub price: Option<UD256>,
    pub size: UD256,
    pub volume: UD256,
    pub tx_hash: String,
    pub asset: AssetId,
    pub proxy_wallet: String,
    pub title: String,
    pub slug: String,
    pub event_slug: String,
}
