//! CSV input/output of fills and trades.

use std::{fs::File, io, path::Path};

use fastnum::UD256;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    fill::Trade,
    num,
    types::{Fill, RawFill},
};

/// Trade row as read back for reconciliation.
///
/// Only the columns compared by the reconciliation are kept, so both
/// canonical and externally produced trade datasets can be read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TradeRecord {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    pub side: String,
    pub outcome: String,
    pub price: String,
}

#[derive(Serialize)]
struct TradeRow<'a> {
    timestamp: i64,
    datetime_utc: String,
    side: String,
    outcome: String,
    price: String,
    size: String,
    volume_usdc: String,
    #[serde(rename = "transactionHash")]
    transaction_hash: &'a str,
    asset: &'a str,
    #[serde(rename = "proxyWallet")]
    proxy_wallet: &'a str,
    title: &'a str,
    slug: &'a str,
    #[serde(rename = "eventSlug")]
    event_slug: &'a str,
}

impl<'a> From<&'a Trade> for TradeRow<'a> {
    fn from(t: &'a Trade) -> Self {
        Self {
            timestamp: t.timestamp,
            datetime_utc: t
                .datetime
                .map(|d| d.format("%Y-%m-%d %H:%M:%S%:z").to_string())
                .unwrap_or_default(),
            side: t.side.to_string(),
            outcome: t.outcome.to_string(),
            price: t.price.map(format_decimal).unwrap_or_default(),
            size: format_decimal(t.size),
            volume_usdc: format_decimal(t.volume),
            transaction_hash: &t.tx_hash,
            asset: t.asset.as_str(),
            proxy_wallet: &t.proxy_wallet,
            title: &t.title,
            slug: &t.slug,
            event_slug: &t.event_slug,
        }
    }
}

/// Renders decimal without insignificant trailing zeros.
pub fn format_decimal(value: UD256) -> String {
    let s = value.to_string();
    if s.contains('.') && !s.contains(['e', 'E']) {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

fn reader<R: io::Read>(r: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(r)
}

pub fn read_raw_fills<R: io::Read>(r: R) -> Result<Vec<RawFill>> {
    Ok(reader(r).deserialize().collect::<std::result::Result<_, _>>()?)
}

/// Reads fills CSV, normalizing amounts with the given converter.
pub fn read_fills<R: io::Read>(r: R, converter: num::Converter) -> Result<Vec<Fill>> {
    Ok(read_raw_fills(r)?
        .iter()
        .map(|raw| Fill::from_raw(raw, converter))
        .collect())
}

pub fn read_fills_file(path: impl AsRef<Path>, converter: num::Converter) -> Result<Vec<Fill>> {
    read_fills(File::open(path)?, converter)
}

/// Columns of the fills CSV, in [`RawFill`] field order.
pub const FILL_COLUMNS: [&str; 10] = [
    "id",
    "timestamp",
    "transactionHash",
    "maker",
    "taker",
    "makerAssetId",
    "makerAmountFilled",
    "takerAssetId",
    "takerAmountFilled",
    "fee",
];

/// Columns of the trades CSV, in `TradeRow` field order.
pub const TRADE_COLUMNS: [&str; 13] = [
    "timestamp",
    "datetime_utc",
    "side",
    "outcome",
    "price",
    "size",
    "volume_usdc",
    "transactionHash",
    "asset",
    "proxyWallet",
    "title",
    "slug",
    "eventSlug",
];

/// Writer emitting the header even when no row follows.
fn headed_writer<W: io::Write>(w: W, columns: &[&str]) -> Result<csv::Writer<W>> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    writer.write_record(columns)?;
    Ok(writer)
}

pub fn write_raw_fills<W: io::Write>(w: W, fills: &[RawFill]) -> Result<()> {
    let mut writer = headed_writer(w, &FILL_COLUMNS)?;
    for fill in fills {
        writer.serialize(fill)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_trades<W: io::Write>(w: W, trades: &[Trade]) -> Result<()> {
    let mut writer = headed_writer(w, &TRADE_COLUMNS)?;
    for trade in trades {
        writer.serialize(TradeRow::from(trade))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_trades_file(path: impl AsRef<Path>, trades: &[Trade]) -> Result<()> {
    write_trades(File::create(path)?, trades)
}

pub fn read_trade_records<R: io::Read>(r: R) -> Result<Vec<TradeRecord>> {
    Ok(reader(r).deserialize().collect::<std::result::Result<_, _>>()?)
}

pub fn read_trade_records_file(path: impl AsRef<Path>) -> Result<Vec<TradeRecord>> {
    read_trade_records(File::open(path)?)
}
