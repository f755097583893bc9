use tracing::info;

use crate::{
    error::{Error, Result},
    types::{Fill, Market},
};

/// Whether the fill exchanges one of the market outcome tokens directly
/// against the settlement currency.
pub fn is_eligible(fill: &Fill, market: &Market) -> bool {
    let is_outcome = |asset| market.outcome_of(asset).is_some();
    (is_outcome(&fill.maker_asset_id) && fill.taker_asset_id.is_settlement())
        || (is_outcome(&fill.taker_asset_id) && fill.maker_asset_id.is_settlement())
}

/// Drops token/token, settlement/settlement and foreign token fills.
///
/// Returns [`Error::NoEligibleFills`] if nothing is left.
pub fn filter_fills(fills: Vec<Fill>, market: &Market) -> Result<Vec<Fill>> {
    let total = fills.len();
    let eligible: Vec<_> = fills
        .into_iter()
        .filter(|fill| is_eligible(fill, market))
        .collect();
    info!(total, eligible = eligible.len(), "filtered token/settlement fills");
    if eligible.is_empty() {
        return Err(Error::NoEligibleFills);
    }
    Ok(eligible)
}
