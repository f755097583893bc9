//! Kalshi market trade history.
//!
//! Trades of a single market ticker are listed newest first in cursor
//! paginated pages. The listing ends on a page with an empty or missing
//! cursor.

use std::{io, pin::pin, time::Duration};

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{Page, RetryPolicy, paginate, with_retry};
use crate::error::{Error, Result};

pub const DEFAULT_TRADES_URL: &str = "https://api.elections.kalshi.com/trade-api/v2/markets/trades";

/// Largest page size accepted by the trades listing.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Executed trade as listed by the exchange.
///
/// Prices are in cents. Fields not modelled here are kept in `extra` so
/// the trade is written back out unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalshiTrade {
    pub trade_id: String,
    pub ticker: String,
    pub count: u64,
    pub yes_price: u32,
    pub no_price: u32,
    pub taker_side: String,
    pub created_time: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TradesPage {
    trades: Vec<KalshiTrade>,
    cursor: Option<String>,
}

impl From<TradesPage> for Page<KalshiTrade, String> {
    fn from(page: TradesPage) -> Self {
        Self {
            items: page.trades,
            next: page.cursor.filter(|c| !c.is_empty()),
        }
    }
}

/// Trade listing filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TradeQuery {
    pub ticker: String,
    /// Earliest trade time, unix seconds.
    pub min_ts: Option<i64>,
    /// Latest trade time, unix seconds.
    pub max_ts: Option<i64>,
    pub limit: u32,
}

impl TradeQuery {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            min_ts: None,
            max_ts: None,
            limit: MAX_PAGE_SIZE,
        }
    }
}

/// Client of the public Kalshi trades listing.
#[derive(Clone, Debug)]
pub struct KalshiClient {
    http: reqwest::Client,
    trades_url: Url,
    retry: RetryPolicy,
}

impl KalshiClient {
    pub fn new(trades_url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            trades_url,
            retry: RetryPolicy::default(),
        })
    }

    fn page_url(&self, query: &TradeQuery, cursor: &str) -> Url {
        let mut url = self.trades_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ticker", &query.ticker);
            if let Some(min_ts) = query.min_ts {
                pairs.append_pair("min_ts", &min_ts.to_string());
            }
            if let Some(max_ts) = query.max_ts {
                pairs.append_pair("max_ts", &max_ts.to_string());
            }
            pairs.append_pair("limit", &query.limit.min(MAX_PAGE_SIZE).to_string());
            if !cursor.is_empty() {
                pairs.append_pair("cursor", cursor);
            }
        }
        url
    }

    async fn trades_page(
        &self,
        query: &TradeQuery,
        cursor: String,
    ) -> Result<Page<KalshiTrade, String>> {
        let url = self.page_url(query, &cursor);
        debug!(%url, "fetching trades page");
        let page = with_retry(&self.retry, "kalshi trades", tokio::time::sleep, || async {
            let page: TradesPage = self
                .http
                .get(url.clone())
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok::<_, Error>(page)
        })
        .await?;
        Ok(page.into())
    }

    /// Fetches all trades matching the query.
    pub async fn trades(&self, query: &TradeQuery) -> Result<Vec<KalshiTrade>> {
        collect_trades(&query.ticker, |cursor| self.trades_page(query, cursor)).await
    }
}

/// Collects trades of all pages, starting from the first one.
pub async fn collect_trades<F, Fut>(ticker: &str, fetch: F) -> Result<Vec<KalshiTrade>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Page<KalshiTrade, String>>>,
{
    let mut pages = pin!(paginate(String::new(), fetch));
    let mut trades = Vec::new();
    while let Some(page) = pages.try_next().await? {
        let received = page.len();
        trades.extend(page);
        debug!(ticker, received, total = trades.len(), "fetched trades page");
    }
    info!(ticker, trades = trades.len(), "trade history completed");
    Ok(trades)
}

/// Writes trades as an indented JSON array.
pub fn write_trades_json<W: io::Write>(mut w: W, trades: &[KalshiTrade]) -> Result<()> {
    serde_json::to_writer_pretty(&mut w, trades)?;
    w.flush()?;
    Ok(())
}
