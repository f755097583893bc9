//! Per-transaction, per-token fill aggregation.

use std::collections::BTreeMap;

use fastnum::{D256, UD256};
use tracing::debug;

use super::types::{NetFlow, NetTrade};
use crate::types::{AssetId, Fill, Market, Outcome, Perspective, Side};

impl NetFlow {
    /// Contribution of a single fill to the position in `token`, `None` if
    /// the token is not exchanged in the fill.
    pub fn of_fill(fill: &Fill, token: &AssetId, perspective: Perspective) -> Option<Self> {
        let (amount, settlement, receives) = if fill.maker_asset_id == *token {
            (
                fill.maker_amount,
                fill.taker_amount,
                perspective.receives_maker_asset(),
            )
        } else if fill.taker_asset_id == *token {
            (
                fill.taker_amount,
                fill.maker_amount,
                !perspective.receives_maker_asset(),
            )
        } else {
            return None;
        };

        let amount = amount.to_signed();
        Some(Self {
            net_tokens: if receives { amount } else { -amount },
            volume: settlement,
            timestamp: fill.timestamp,
        })
    }

    fn merge(self, other: Self) -> Self {
        Self {
            net_tokens: self.net_tokens + other.net_tokens,
            volume: self.volume + other.volume,
            timestamp: self.timestamp.max(other.timestamp),
        }
    }
}

/// Folds the fills of a single transaction into the net flow of `token`.
pub fn net_flow<'f>(
    fills: impl IntoIterator<Item = &'f Fill>,
    token: &AssetId,
    perspective: Perspective,
) -> Option<NetFlow> {
    fills
        .into_iter()
        .filter_map(|fill| NetFlow::of_fill(fill, token, perspective))
        .reduce(NetFlow::merge)
}

/// Turns a net flow into a trade; flat flows produce no trade.
pub fn resolve_trade(
    tx_hash: &str,
    outcome: Outcome,
    asset: &AssetId,
    wallet: &str,
    flow: NetFlow,
) -> Option<NetTrade> {
    let side = if flow.net_tokens > D256::ZERO {
        Side::Buy
    } else if flow.net_tokens < D256::ZERO {
        Side::Sell
    } else {
        debug!(tx_hash, %asset, volume = %flow.volume, "fills net to zero, no trade");
        return None;
    };

    let size = flow.net_tokens.unsigned_abs();
    let price = (size > UD256::ZERO).then(|| flow.volume / size);

    Some(NetTrade {
        tx_hash: tx_hash.to_string(),
        timestamp: flow.timestamp,
        side,
        outcome,
        price,
        size,
        volume: flow.volume,
        asset: asset.clone(),
        wallet: wallet.to_string(),
    })
}

/// Aggregates fills of a single transaction, at most one trade per outcome
/// token, `Yes` first.
///
/// The acting wallet is taken from the earliest fill of the transaction.
pub fn aggregate_transaction(
    tx_hash: &str,
    fills: &[&Fill],
    market: &Market,
    perspective: Perspective,
) -> Vec<NetTrade> {
    let Some(first) = fills.iter().min_by_key(|f| f.timestamp) else {
        return Vec::new();
    };
    let wallet = match perspective {
        Perspective::Taker => &first.taker,
        Perspective::Maker => &first.maker,
    };

    market
        .tokens()
        .into_iter()
        .filter_map(|(outcome, token)| {
            let flow = net_flow(fills.iter().copied(), token, perspective)?;
            resolve_trade(tx_hash, outcome, token, wallet, flow)
        })
        .collect()
}

/// Groups fills by transaction and aggregates every group.
///
/// Transactions are processed in hash order, so the result is independent
/// of the input fill order.
pub fn aggregate(fills: &[Fill], market: &Market, perspective: Perspective) -> Vec<NetTrade> {
    let groups = fills
        .iter()
        .fold(BTreeMap::<&str, Vec<&Fill>>::new(), |mut groups, fill| {
            groups.entry(fill.tx_hash.as_str()).or_default().push(fill);
            groups
        });
    debug!(transactions = groups.len(), "grouped fills");

    groups
        .into_iter()
        .flat_map(|(tx_hash, group)| aggregate_transaction(tx_hash, &group, market, perspective))
        .collect()
}
