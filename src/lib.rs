//! Prediction market fill canonicalization.
//!
//! # Overview
//!
//! A single trade on a binary outcome exchange settles as several partial
//! order fills, often within one transaction and sometimes on both outcome
//! tokens. This crate turns such raw fills into one canonical trade per
//! transaction and outcome token, as seen by one participant.
//!
//! Use [`resolve::resolve_market`] to determine the `Yes`/`No` outcome
//! tokens of the market, then [`fill::TradeProcessor`] to filter, aggregate
//! and materialize the fills into [`fill::Trade`]s.
//!
//! [`csv_io`] reads fills and writes trades, [`source`] fetches market tokens
//! and fills from the exchange APIs (and Kalshi trade history for the same
//! event), [`reconcile`] compares the produced trades against a reference
//! dataset.
//!
//! See `./src/bin` for complete command-line tools.
//!
//! # Limitations/follow-ups
//!
//! * Only binary markets settled in a single collateral currency are supported.
//!
//! * Fills of the two outcome tokens are never netted against each other, so
//!   a transaction may produce a `Yes` and a `No` trade.
//!
//! * Token inference from fills relies on an ID prefix observed on a
//!   particular dataset, explicit or derived tokens should be preferred.
//!
//! # Testing
//!
//! [`testing`] module provides a builder of fills with controlled values.

pub mod csv_io;
pub mod error;
pub mod fill;
pub mod num;
pub mod reconcile;
pub mod resolve;
pub mod source;
pub mod testing;
pub mod types;
