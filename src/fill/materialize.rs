use std::cmp::Reverse;

use chrono::DateTime;
use itertools::Itertools;

use super::types::{NetTrade, Trade, TradeMetadata};

/// Attaches metadata and UTC datetime to resolved trades and orders them
/// newest first. Equal timestamps keep their relative order.
pub fn materialize(trades: Vec<NetTrade>, metadata: &TradeMetadata) -> Vec<Trade> {
    trades
        .into_iter()
        .map(|t| Trade {
            timestamp: t.timestamp,
            datetime: DateTime::from_timestamp(t.timestamp, 0),
            side: t.side,
            outcome: t.outcome,
            price: t.price,
            size: t.size,
            volume: t.volume,
            tx_hash: t.tx_hash,
            asset: t.asset,
            proxy_wallet: t.wallet,
            title: metadata.title.clone(),
            slug: metadata.slug.clone(),
            event_slug: metadata.event_slug.clone(),
        })
        .sorted_by_key(|t| Reverse(t.timestamp))
        .collect()
}
