//! CLOB market lookup.

use std::{pin::pin, time::Duration};

use futures::TryStreamExt;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{Page, RetryPolicy, paginate, with_retry};
use crate::{
    error::{Error, Result},
    types::{AssetId, Market},
};

/// Cursor returned with the last page of markets.
pub const END_CURSOR: &str = "LTE=";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClobToken {
    pub token_id: String,
    pub outcome: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClobMarket {
    pub condition_id: String,
    pub tokens: Vec<ClobToken>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MarketsPage {
    data: Vec<ClobMarket>,
    next_cursor: Option<String>,
}

impl From<MarketsPage> for Page<ClobMarket, String> {
    fn from(page: MarketsPage) -> Self {
        Self {
            items: page.data,
            next: page
                .next_cursor
                .filter(|c| !c.is_empty() && c != END_CURSOR),
        }
    }
}

/// Client of the public CLOB markets listing.
#[derive(Clone, Debug)]
pub struct ClobClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl ClobClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    fn markets_url(&self, cursor: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("markets")
            .map_err(|e| Error::InvalidIdentifier(format!("CLOB URL: {e}")))?;
        url.query_pairs_mut().append_pair("next_cursor", cursor);
        Ok(url)
    }

    async fn markets_page(&self, cursor: String) -> Result<Page<ClobMarket, String>> {
        let url = self.markets_url(&cursor)?;
        debug!(%url, "fetching markets page");
        let page = with_retry(&self.retry, "clob markets", tokio::time::sleep, || async {
            let page: MarketsPage = self
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

    /// Looks up outcome tokens of the market with the given condition ID.
    pub async fn market_tokens(&self, condition_id: &str) -> Result<Market> {
        lookup_market(condition_id, |cursor| self.markets_page(cursor)).await
    }
}

/// Scans market pages until the condition is found.
///
/// Tokens are returned in the listed order, the first one being `Yes`.
pub async fn lookup_market<F, Fut>(condition_id: &str, fetch: F) -> Result<Market>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Page<ClobMarket, String>>>,
{
    let mut pages = pin!(paginate(String::new(), fetch));
    let mut scanned = 0;
    while let Some(markets) = pages.try_next().await? {
        scanned += markets.len();
        if let Some(market) = find_market(&markets, condition_id)? {
            info!(condition_id, scanned, "found market");
            return Ok(market);
        }
    }
    Err(Error::MarketNotFound(condition_id.to_string()))
}

fn find_market(markets: &[ClobMarket], condition_id: &str) -> Result<Option<Market>> {
    let Some(market) = markets
        .iter()
        .find(|m| m.condition_id.eq_ignore_ascii_case(condition_id))
    else {
        return Ok(None);
    };
    match market.tokens.as_slice() {
        [yes, no] => Market::new(
            AssetId::from(yes.token_id.as_str()),
            AssetId::from(no.token_id.as_str()),
        )
        .map(Some),
        tokens => Err(Error::UnexpectedTokens(
            tokens.iter().map(|t| t.token_id.clone()).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tokio_test::assert_ok;

    use super::*;

    const CONDITION: &str = "0x6220c4164a293367cd40eba018dd6e67c78e4d48e74158845cc9361230bcb34d";

    fn market(condition_id: &str, tokens: &[&str]) -> ClobMarket {
        ClobMarket {
            condition_id: condition_id.to_string(),
            tokens: tokens
                .iter()
                .map(|t| ClobToken {
                    token_id: t.to_string(),
                    outcome: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_markets_page_json() {
        let page: MarketsPage = serde_json::from_str(
            r#"{
                "data": [{
                    "condition_id": "0xabc",
                    "question": "ignored",
                    "tokens": [
                        {"token_id": "1", "outcome": "Yes", "price": 0.5},
                        {"token_id": "2", "outcome": "No"}
                    ]
                }],
                "next_cursor": "MTAw"
            }"#,
        )
        .unwrap();
        let page = Page::from(page);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].tokens[1].outcome, "No");
        assert_eq!(page.next.as_deref(), Some("MTAw"));

        for last in [r#"{"data": [], "next_cursor": "LTE="}"#, r#"{"data": []}"#, r#"{"next_cursor": ""}"#] {
            let page: MarketsPage = serde_json::from_str(last).unwrap();
            assert_eq!(Page::from(page).next, None);
        }
    }

    #[test]
    fn test_markets_url() {
        let client =
            ClobClient::new(Url::parse("https://clob.example.com").unwrap(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.markets_url("").unwrap().as_str(),
            "https://clob.example.com/markets?next_cursor="
        );
        assert_eq!(
            client.markets_url("LTE=").unwrap().as_str(),
            "https://clob.example.com/markets?next_cursor=LTE%3D"
        );
    }

    #[tokio::test]
    async fn test_lookup_scans_pages() {
        let cursors = RefCell::new(Vec::new());
        let result = lookup_market(&CONDITION.to_uppercase().replace("0X", "0x"), |cursor| {
            cursors.borrow_mut().push(cursor.clone());
            async move {
                Ok(match cursor.as_str() {
                    "" => Page {
                        items: vec![market("0x01", &["1", "2"])],
                        next: Some("p2".to_string()),
                    },
                    _ => Page {
                        items: vec![market(CONDITION, &["11", "22"])],
                        next: None,
                    },
                })
            }
        })
        .await;

        let market = assert_ok!(result);
        assert_eq!(market.yes_token().as_str(), "11");
        assert_eq!(market.no_token().as_str(), "22");
        assert_eq!(*cursors.borrow(), vec!["".to_string(), "p2".to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let result = lookup_market(CONDITION, |_| async {
            Ok(Page {
                items: vec![market("0x01", &["1", "2"])],
                next: None,
            })
        })
        .await;
        assert!(matches!(result, Err(Error::MarketNotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_unexpected_tokens() {
        let result = lookup_market(CONDITION, |_| async {
            Ok(Page {
                items: vec![market(CONDITION, &["1", "2", "3"])],
                next: None,
            })
        })
        .await;
        assert!(matches!(result, Err(Error::UnexpectedTokens(ids)) if ids.len() == 3));
    }
}
