//! Test utilities.
//!
//! [`FillBuilder`] provides a convenient way to create [`Fill`] instances
//! with controlled values for unit testing the canonicalization pipeline.
//! By default both sides of the fill carry the settlement asset with zero
//! amounts, so a test only sets what it is about.

use alloy::primitives::U256;

use crate::{
    num,
    types::{AssetId, Fill},
};

#[derive(Clone, Debug)]
pub struct FillBuilder {
    tx_hash: String,
    timestamp: i64,
    maker: String,
    taker: String,
    maker_asset_id: AssetId,
    maker_amount: u64,
    taker_asset_id: AssetId,
    taker_amount: u64,
}

impl Default for FillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FillBuilder {
    pub fn new() -> Self {
        Self {
            tx_hash: "0xtx".to_string(),
            timestamp: 0,
            maker: "0xmaker".to_string(),
            taker: "0xtaker".to_string(),
            maker_asset_id: AssetId::settlement(),
            maker_amount: 0,
            taker_asset_id: AssetId::settlement(),
            taker_amount: 0,
        }
    }

    pub fn tx(mut self, tx_hash: &str) -> Self {
        self.tx_hash = tx_hash.to_string();
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn maker(mut self, maker: &str) -> Self {
        self.maker = maker.to_string();
        self
    }

    pub fn taker(mut self, taker: &str) -> Self {
        self.taker = taker.to_string();
        self
    }

    pub fn maker_asset(mut self, asset: &str) -> Self {
        self.maker_asset_id = AssetId::from(asset);
        self
    }

    pub fn taker_asset(mut self, asset: &str) -> Self {
        self.taker_asset_id = AssetId::from(asset);
        self
    }

    /// Whole-unit amounts given by the maker and the taker respectively.
    pub fn amounts(self, maker_units: u64, taker_units: u64) -> Self {
        let scale = 10u64.pow(num::EXCHANGE_DECIMALS as u32);
        self.maker_amount_raw(maker_units * scale)
            .taker_amount_raw(taker_units * scale)
    }

    pub fn maker_amount_raw(mut self, amount: u64) -> Self {
        self.maker_amount = amount;
        self
    }

    pub fn taker_amount_raw(mut self, amount: u64) -> Self {
        self.taker_amount = amount;
        self
    }

    pub fn build(self) -> Fill {
        let converter = num::Converter::default();
        Fill {
            tx_hash: self.tx_hash,
            timestamp: self.timestamp,
            maker: self.maker,
            taker: self.taker,
            maker_asset_id: self.maker_asset_id,
            maker_amount: converter.from_unsigned(U256::from(self.maker_amount)),
            taker_asset_id: self.taker_asset_id,
            taker_amount: converter.from_unsigned(U256::from(self.taker_amount)),
        }
    }
}
