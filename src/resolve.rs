//! Outcome token resolution.
//!
//! Market outcome tokens are resolved by an ordered chain of strategies,
//! the first one producing a market wins:
//!
//! 1. Explicit token pair.
//! 2. On-chain derivation from the condition ID and collateral token
//!    (Conditional Tokens Framework position IDs), see [`derive_position_id`].
//! 3. Inference from the fill set itself, see [`infer_market`].
//! 4. Caller-provided default market.
//!
//! Malformed derivation input falls through to the next strategy, while an
//! explicitly provided but invalid token pair is an error.

use std::cmp::Reverse;

use alloy::primitives::{Address, B256, U256, hex, keccak256};
use itertools::Itertools;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    types::{AssetId, Fill, Market},
};

/// Inferred token IDs starting with this prefix are classified as `No`.
///
/// This is a heuristic observed on a particular dataset and does not
/// generalize to arbitrary markets.
pub const NO_TOKEN_PREFIX: &str = "1025";

/// Condition to derive outcome token IDs from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionSource {
    /// Hex condition ID, `0x`-prefixed or bare, up to 32 bytes.
    pub condition_id: String,
    /// Hex collateral token address, `0x`-prefixed or bare.
    pub collateral: String,
    pub yes_index: u32,
    pub no_index: u32,
}

impl ConditionSource {
    pub fn new(condition_id: impl Into<String>, collateral: impl Into<String>) -> Self {
        Self {
            condition_id: condition_id.into(),
            collateral: collateral.into(),
            yes_index: 0,
            no_index: 1,
        }
    }

    pub fn with_indices(mut self, yes_index: u32, no_index: u32) -> Self {
        self.yes_index = yes_index;
        self.no_index = no_index;
        self
    }
}

/// All token sources available to the resolver.
#[derive(Clone, Debug, Default)]
pub struct ResolverInput {
    pub yes_token: Option<String>,
    pub no_token: Option<String>,
    pub condition: Option<ConditionSource>,
    pub infer: bool,
    pub default_market: Option<Market>,
}

/// Strategy the market was resolved with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum TokenSource {
    #[display("explicit")]
    Explicit,
    #[display("derived")]
    Derived,
    #[display("inferred")]
    Inferred,
    #[display("default")]
    Default,
}

type Strategy = fn(&ResolverInput, &[Fill]) -> Result<Option<Market>>;

const STRATEGIES: [(TokenSource, Strategy); 4] = [
    (TokenSource::Explicit, explicit),
    (TokenSource::Derived, derived),
    (TokenSource::Inferred, inferred),
    (TokenSource::Default, default_market),
];

/// Resolves market outcome tokens, see module docs for the order.
pub fn resolve_market(input: &ResolverInput, fills: &[Fill]) -> Result<(Market, TokenSource)> {
    for (source, strategy) in STRATEGIES {
        if let Some(market) = strategy(input, fills)? {
            info!(
                %source,
                yes = %market.yes_token(),
                no = %market.no_token(),
                "resolved market tokens"
            );
            return Ok((market, source));
        }
    }
    Err(Error::NoTokenSource(
        "provide both token IDs, a condition with collateral, or enable inference".to_string(),
    ))
}

fn explicit(input: &ResolverInput, _: &[Fill]) -> Result<Option<Market>> {
    match (input.yes_token.as_deref(), input.no_token.as_deref()) {
        (Some(yes), Some(no)) if !yes.is_empty() && !no.is_empty() => {
            Market::new(AssetId::from(yes), AssetId::from(no)).map(Some)
        }
        _ => Ok(None),
    }
}

fn derived(input: &ResolverInput, _: &[Fill]) -> Result<Option<Market>> {
    let Some(condition) = &input.condition else {
        return Ok(None);
    };
    let derive = |index| {
        derive_position_id(&condition.condition_id, index, &condition.collateral)
            .map(|id| AssetId::new(id.to_string()))
    };
    match derive(condition.yes_index)
        .and_then(|yes| derive(condition.no_index).and_then(|no| Market::new(yes, no)))
    {
        Ok(market) => Ok(Some(market)),
        Err(e) => {
            warn!(%e, "failed to derive token IDs from condition, falling back");
            Ok(None)
        }
    }
}

fn inferred(input: &ResolverInput, fills: &[Fill]) -> Result<Option<Market>> {
    if !input.infer {
        return Ok(None);
    }
    Ok(infer_market(fills))
}

fn default_market(input: &ResolverInput, _: &[Fill]) -> Result<Option<Market>> {
    Ok(input.default_market.clone())
}

/// Derives Conditional Tokens Framework position (outcome token) ID.
///
/// ```text
/// collection = keccak256(bytes32(0) ++ conditionId ++ uint256(1 << index))
/// position   = keccak256(collateral ++ collection)
/// ```
pub fn derive_position_id(condition_id: &str, outcome_index: u32, collateral: &str) -> Result<U256> {
    let condition = parse_condition_id(condition_id)?;
    let collateral = parse_address(collateral)?;
    if outcome_index >= 256 {
        return Err(Error::InvalidIdentifier(format!(
            "outcome index out of range: {outcome_index}"
        )));
    }
    let index_set = U256::from(1u8) << (outcome_index as usize);

    let mut buf = Vec::with_capacity(96);
    buf.extend_from_slice(B256::ZERO.as_slice());
    buf.extend_from_slice(condition.as_slice());
    buf.extend_from_slice(&index_set.to_be_bytes::<32>());
    let collection = keccak256(&buf);

    buf.clear();
    buf.extend_from_slice(collateral.as_slice());
    buf.extend_from_slice(collection.as_slice());
    Ok(U256::from_be_bytes(keccak256(&buf).0))
}

/// Parses condition ID, left-padding shorter values to 32 bytes.
fn parse_condition_id(value: &str) -> Result<B256> {
    let bytes = hex::decode(value.trim())?;
    if bytes.len() > 32 {
        return Err(Error::InvalidIdentifier(format!(
            "condition ID longer than 32 bytes: {value}"
        )));
    }
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(B256::from(padded))
}

fn parse_address(value: &str) -> Result<Address> {
    let bytes = hex::decode(value.trim())?;
    if bytes.len() != 20 {
        return Err(Error::InvalidIdentifier(format!(
            "bad address length for {value}"
        )));
    }
    Ok(Address::from_slice(&bytes))
}

/// Infers market tokens from the fill set.
///
/// Picks the two most frequent non-settlement asset IDs (ties ranked by
/// first appearance), then classifies the one prefixed with
/// [`NO_TOKEN_PREFIX`] as `No`. If the prefix does not split the pair, the
/// more frequent one is taken as `Yes`.
pub fn infer_market(fills: &[Fill]) -> Option<Market> {
    let assets = fills
        .iter()
        .flat_map(Fill::assets)
        .filter(|a| !a.is_settlement() && !a.as_str().is_empty());
    let counts = assets.clone().counts();
    let mut ranked = assets.unique().collect_vec();
    ranked.sort_by_key(|a| Reverse(counts[a]));

    let [first, second, ..] = ranked.as_slice() else {
        return None;
    };
    let (mut yes, mut no) = (None, None);
    for candidate in [*first, *second] {
        if candidate.as_str().starts_with(NO_TOKEN_PREFIX) {
            no = Some(candidate);
        } else {
            yes = Some(candidate);
        }
    }
    let (yes, no) = match (yes, no) {
        (Some(yes), Some(no)) => (yes, no),
        _ => (*first, *second),
    };
    Market::new(yes.clone(), no.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FillBuilder;

    const CONDITION: &str = "0x6220c4164a293367cd40eba018dd6e67c78e4d48e74158845cc9361230bcb34d";
    const USDC: &str = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174";
    const YES: &str = "73817598408230683831072353847770809458837920203753987347670649717002095543451";
    const NO: &str = "102505737677514435038431832532030540090751572260157019042399710777845176913904";

    #[test]
    fn test_derive_position_id() {
        assert_eq!(
            derive_position_id(CONDITION, 0, USDC).unwrap().to_string(),
            "2722615849211243136625834175054300471013059855529861991273106456860591338202"
        );
        assert_eq!(
            derive_position_id(CONDITION, 1, USDC).unwrap().to_string(),
            "106622758803168654614267234504855485892384817505162080804835781654284445124682"
        );
    }

    #[test]
    fn test_derive_position_id_pads_short_condition() {
        let collateral = format!("0x{}", "11".repeat(20));
        assert_eq!(
            derive_position_id("0x01", 0, &collateral).unwrap().to_string(),
            "69483331073790424460400195897682400461262528074680830367058493718958411327737"
        );
        // Bare hex is accepted as well
        assert_eq!(
            derive_position_id("01", 0, &"11".repeat(20)).unwrap(),
            derive_position_id("0x01", 0, &collateral).unwrap()
        );
    }

    #[test]
    fn test_derive_position_id_deterministic() {
        let a = derive_position_id(CONDITION, 0, USDC).unwrap();
        let b = derive_position_id(CONDITION, 0, USDC).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, derive_position_id(CONDITION, 1, USDC).unwrap());
    }

    #[test]
    fn test_derive_position_id_malformed() {
        assert!(derive_position_id("0xzz", 0, USDC).is_err());
        assert!(derive_position_id(CONDITION, 0, "0x1234").is_err());
        assert!(derive_position_id(&format!("{CONDITION}00"), 0, USDC).is_err());
        assert!(derive_position_id(CONDITION, 300, USDC).is_err());
    }

    #[test]
    fn test_infer_market_prefix_heuristic() {
        // More frequent token is the "No" one, but prefix heuristic wins
        let fills = vec![
            FillBuilder::new().maker_asset(NO).build(),
            FillBuilder::new().taker_asset(NO).build(),
            FillBuilder::new().maker_asset(YES).build(),
        ];
        let market = infer_market(&fills).unwrap();
        assert_eq!(market.yes_token().as_str(), YES);
        assert_eq!(market.no_token().as_str(), NO);
    }

    #[test]
    fn test_infer_market_without_prefix_uses_frequency() {
        let fills = vec![
            FillBuilder::new().maker_asset("222").build(),
            FillBuilder::new().maker_asset("111").build(),
            FillBuilder::new().taker_asset("111").build(),
            FillBuilder::new().maker_asset("333").build(),
        ];
        let market = infer_market(&fills).unwrap();
        assert_eq!(market.yes_token().as_str(), "111");
        assert_eq!(market.no_token().as_str(), "222");
    }

    #[test]
    fn test_infer_market_both_prefixed() {
        let fills = vec![
            FillBuilder::new().maker_asset("10251").build(),
            FillBuilder::new().maker_asset("10251").build(),
            FillBuilder::new().maker_asset("10252").build(),
        ];
        let market = infer_market(&fills).unwrap();
        assert_eq!(market.yes_token().as_str(), "10251");
        assert_eq!(market.no_token().as_str(), "10252");
    }

    #[test]
    fn test_infer_market_needs_two_tokens() {
        let fills = vec![FillBuilder::new().maker_asset(YES).build()];
        assert_eq!(infer_market(&fills), None);
        assert_eq!(infer_market(&[]), None);
    }

    #[test]
    fn test_resolve_order() {
        let fills = vec![
            FillBuilder::new().maker_asset("111").build(),
            FillBuilder::new().maker_asset("222").build(),
        ];
        let mut input = ResolverInput {
            yes_token: Some(YES.to_string()),
            no_token: Some(NO.to_string()),
            condition: Some(ConditionSource::new(CONDITION, USDC)),
            infer: true,
            default_market: None,
        };

        let (market, source) = resolve_market(&input, &fills).unwrap();
        assert_eq!(source, TokenSource::Explicit);
        assert_eq!(market.yes_token().as_str(), YES);

        input.no_token = None;
        let (market, source) = resolve_market(&input, &fills).unwrap();
        assert_eq!(source, TokenSource::Derived);
        assert_eq!(
            market.no_token().as_str(),
            "106622758803168654614267234504855485892384817505162080804835781654284445124682"
        );

        input.condition = Some(ConditionSource::new("0xnothex", USDC));
        let (market, source) = resolve_market(&input, &fills).unwrap();
        assert_eq!(source, TokenSource::Inferred);
        assert_eq!(market.yes_token().as_str(), "111");

        input.infer = false;
        input.default_market =
            Some(Market::new(AssetId::from(YES), AssetId::from(NO)).unwrap());
        let (_, source) = resolve_market(&input, &fills).unwrap();
        assert_eq!(source, TokenSource::Default);

        input.default_market = None;
        assert!(matches!(
            resolve_market(&input, &fills),
            Err(Error::NoTokenSource(_))
        ));
    }

    #[test]
    fn test_resolve_invalid_explicit_pair() {
        let input = ResolverInput {
            yes_token: Some(YES.to_string()),
            no_token: Some(YES.to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_market(&input, &[]),
            Err(Error::InvalidMarket(_))
        ));
    }
}
