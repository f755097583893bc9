//! Fill canonicalization.
//!
//! Turns raw partial order fills into one canonical trade per transaction and
//! outcome token, as seen by the chosen participant (taker or maker).
//!
//! # Pipeline
//!
//! - [`filter_fills`] - keeps only outcome token vs settlement currency fills
//! - [`aggregate`] - folds fills of every transaction into per-token net
//!   position changes and resolves them into BUY/SELL trades
//! - [`materialize`] - attaches display metadata and orders trades newest first
//!
//! [`TradeProcessor`] runs the whole pipeline. Everything here is pure and
//! synchronous.
//!
//! # Example
//!
//! ```ignore
//! use ctf_fills::{fill, types::{Market, Perspective}};
//!
//! let processor = fill::TradeProcessor::new(market, Perspective::Taker, metadata);
//! for trade in processor.process(fills)? {
//!     println!("{} {} {} @ {:?}", trade.side, trade.size, trade.outcome, trade.price);
//! }
//! ```

mod aggregate;
mod filter;
mod materialize;
mod types;


pub use aggregate::{aggregate, aggregate_transaction, net_flow, resolve_trade};
pub use filter::{filter_fills, is_eligible};
pub use materialize::materialize;
pub use types::{NetFlow, NetTrade, Trade, TradeMetadata};

use tracing::info;

use crate::{
    error::Result,
    types::{Fill, Market, Perspective},
};

/// Fill canonicalization pipeline for a single market.
#[derive(Clone, Debug)]
pub struct TradeProcessor {
    market: Market,
    perspective: Perspective,
    metadata: TradeMetadata,
}

impl TradeProcessor {
    pub fn new(market: Market, perspective: Perspective, metadata: TradeMetadata) -> Self {
        Self {
            market,
            perspective,
            metadata,
        }
    }

    /// Filters, aggregates and materializes the fills.
    ///
    /// Fails only if none of the fills is eligible.
    pub fn process(&self, fills: Vec<Fill>) -> Result<Vec<Trade>> {
        let eligible = filter_fills(fills, &self.market)?;
        let net = aggregate(&eligible, &self.market, self.perspective);
        info!(
            fills = eligible.len(),
            trades = net.len(),
            perspective = ?self.perspective,
            "aggregated fills into trades"
        );
        Ok(materialize(net, &self.metadata))
    }
}
