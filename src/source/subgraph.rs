//! Order-filled event subgraph.
//!
//! Events are fetched newest first, in windows bounded by a timestamp cursor
//! which moves backwards after every page. Two passes are made, one
//! filtering on the maker asset and one on the taker asset, sharing the set
//! of already seen event IDs.
//!
//! More than a page worth of events sharing a single timestamp cannot be
//! paged through: the cursor moves strictly below the earliest timestamp of
//! the page and the remaining events of that second are skipped.

use std::{collections::HashSet, time::Duration};

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use super::{RetryPolicy, with_retry};
use crate::{
    error::{Error, Result},
    types::RawFill,
};

/// Upper bound of event timestamps the backfill starts below.
pub const INITIAL_CURSOR: i64 = 2_000_000_000;

/// Step back applied to the cursor after a page with no new events.
pub const EMPTY_WINDOW_STEP: i64 = 60;

pub const DEFAULT_PAGE_SIZE: usize = 1000;

pub const DEFAULT_PAGE_PAUSE: Duration = Duration::from_millis(70);

const EVENT_FIELDS: &str = "
    id
    timestamp
    transactionHash
    maker
    taker
    makerAssetId
    makerAmountFilled
    takerAssetId
    takerAmountFilled
    fee
";

/// Asset of the event the ID filter applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum AssetSide {
    #[display("makerAssetId")]
    Maker,
    #[display("takerAssetId")]
    Taker,
}

impl AssetSide {
    pub fn query(self) -> String {
        format!(
            "query Page($ids: [BigInt!], $cursor: BigInt, $first: Int!) {{
  orderFilledEvents(
    first: $first
    orderBy: timestamp
    orderDirection: desc
    where: {{ {self}_in: $ids, timestamp_lt: $cursor }}
  ) {{{EVENT_FIELDS}}}
}}"
        )
    }
}

/// Source of order-filled event pages.
pub trait FillSource {
    /// Returns up to `first` events with the given asset in `ids` and
    /// timestamp strictly below `cursor`, newest first.
    fn fetch_page(
        &self,
        side: AssetSide,
        ids: &[String],
        cursor: i64,
        first: usize,
    ) -> impl Future<Output = Result<Vec<RawFill>>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackfillConfig {
    pub page_size: usize,
    /// Pause between consecutive pages.
    pub pause: Duration,
    pub start_cursor: i64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            pause: DEFAULT_PAGE_PAUSE,
            start_cursor: INITIAL_CURSOR,
        }
    }
}

/// Collects all events with either asset in `ids`, skipping the ones in
/// `seen` and recording the collected ones there.
pub async fn backfill<F, S, SFut>(
    source: &F,
    side: AssetSide,
    ids: &[String],
    config: &BackfillConfig,
    seen: &mut HashSet<String>,
    sleep: S,
) -> Result<Vec<RawFill>>
where
    F: FillSource,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut fills = Vec::new();
    let mut cursor = config.start_cursor;
    loop {
        let page = source
            .fetch_page(side, ids, cursor, config.page_size)
            .await?;
        if page.is_empty() {
            break;
        }

        let received = page.len();
        let mut earliest: Option<i64> = None;
        for fill in page {
            if !seen.insert(fill.id.clone()) {
                continue;
            }
            if let Ok(ts) = fill.timestamp.parse::<i64>() {
                earliest = Some(earliest.map_or(ts, |e| e.min(ts)));
            }
            fills.push(fill);
        }
        debug!(%side, cursor, received, total = fills.len(), "fetched fills page");

        cursor = match earliest {
            Some(ts) => ts - 1,
            None => cursor - EMPTY_WINDOW_STEP,
        };
        if cursor <= 0 {
            break;
        }
        sleep(config.pause).await;
    }
    info!(%side, fills = fills.len(), "backfill pass completed");
    Ok(fills)
}

/// Runs the maker-side and then the taker-side pass, without duplicates.
pub async fn backfill_market<F, S, SFut>(
    source: &F,
    ids: &[String],
    config: &BackfillConfig,
    sleep: S,
) -> Result<Vec<RawFill>>
where
    F: FillSource,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let mut seen = HashSet::new();
    let mut fills = backfill(source, AssetSide::Maker, ids, config, &mut seen, sleep).await?;
    fills.extend(backfill(source, AssetSide::Taker, ids, config, &mut seen, sleep).await?);
    Ok(fills)
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FilledEvents {
    order_filled_events: Vec<RawFill>,
}

fn parse_response(response: GraphQlResponse<FilledEvents>) -> Result<Vec<RawFill>> {
    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        return Err(Error::GraphQl(serde_json::Value::from(errors).to_string()));
    }
    response
        .data
        .map(|d| d.order_filled_events)
        .ok_or_else(|| Error::GraphQl("response carries no data".to_string()))
}

/// GraphQL client of the orderbook subgraph.
#[derive(Clone, Debug)]
pub struct SubgraphClient {
    http: reqwest::Client,
    endpoint: Url,
    retry: RetryPolicy,
}

impl SubgraphClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            endpoint,
            retry: RetryPolicy::default(),
        })
    }
}

impl FillSource for SubgraphClient {
    async fn fetch_page(
        &self,
        side: AssetSide,
        ids: &[String],
        cursor: i64,
        first: usize,
    ) -> Result<Vec<RawFill>> {
        let body = json!({
            "query": side.query(),
            "variables": { "ids": ids, "cursor": cursor, "first": first },
        });
        let response = with_retry(&self.retry, "subgraph page", tokio::time::sleep, || async {
            let response: GraphQlResponse<FilledEvents> = self
                .http
                .post(self.endpoint.clone())
                .json(&body)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok::<_, Error>(response)
        })
        .await?;
        parse_response(response)
    }
}
