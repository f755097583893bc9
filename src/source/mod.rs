//! Remote data sources.
//!
//! - [`clob`] - market lookup resolving a condition into its outcome tokens
//! - [`subgraph`] - backward backfill of order-filled events
//! - [`kalshi`] - trade history of a Kalshi market, for cross-venue checks
//!
//! All are thin HTTP collaborators around the canonicalization core and
//! share the retry and pagination helpers below. Delays are injected as a
//! `sleep` function (normally [`tokio::time::sleep`]) so tests run instantly.

pub mod clob;
pub mod kalshi;
pub mod subgraph;

use std::time::Duration;

use futures::{Stream, stream};
use tracing::warn;

use crate::error::Result;

/// Exponential backoff for transient request failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs the operation, retrying transient failures according to the policy.
///
/// Non-transient errors and the error of the last attempt are returned as is.
pub async fn with_retry<T, F, Fut, S, SFut>(
    policy: &RetryPolicy,
    operation: &str,
    sleep: S,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay(attempt);
                warn!(operation, attempt, ?delay, error = %e, "request failed, retrying");
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Single page of a cursor-paginated listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    /// Cursor of the following page, `None` on the last one.
    pub next: Option<C>,
}

/// Returns stream of pages, fetched one after another starting from the
/// given cursor.
///
/// The stream ends after the last page or right after the first error.
pub fn paginate<T, C, F, Fut>(start: C, fetch: F) -> impl Stream<Item = Result<Vec<T>>>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<Page<T, C>>>,
{
    stream::unfold(Some((fetch, start)), |state| async move {
        let (mut fetch, cursor) = state?;
        match fetch(cursor).await {
            Ok(page) => {
                let next = page.next.map(|cursor| (fetch, cursor));
                Some((Ok(page.items), next))
            }
            Err(e) => Some((Err(e), None)),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, pin::pin};

    use futures::StreamExt;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::error::Error;

    async fn no_sleep(_: Duration) {}

    /// Connection refused on loopback is a transient failure.
    async fn transient_error() -> Error {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        Error::from(err)
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
        assert_eq!(policy.delay(5), Duration::from_secs(1));
        assert_eq!(policy.delay(100), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_errors() {
        let calls = Cell::new(0);
        let result = with_retry(&RetryPolicy::default(), "test", no_sleep, || async {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(transient_error().await)
            } else {
                Ok(calls.get())
            }
        })
        .await;
        assert_eq!(assert_ok!(result), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: 2,
            ..Default::default()
        };
        let result: Result<()> = with_retry(&policy, "test", no_sleep, || async {
            calls.set(calls.get() + 1);
            Err(transient_error().await)
        })
        .await;
        assert_err!(result);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_retry_skips_permanent_errors() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&RetryPolicy::default(), "test", no_sleep, || async {
            calls.set(calls.get() + 1);
            Err(Error::GraphQl("bad query".to_string()))
        })
        .await;
        assert!(matches!(result, Err(Error::GraphQl(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_paginate_follows_cursor() {
        let pages = paginate(0u32, |cursor| async move {
            Ok(Page {
                items: vec![cursor * 10, cursor * 10 + 1],
                next: (cursor < 2).then_some(cursor + 1),
            })
        });
        let items: Vec<_> = pages.map(|page| page.unwrap()).concat().await;
        assert_eq!(items, vec![0, 1, 10, 11, 20, 21]);
    }

    #[tokio::test]
    async fn test_paginate_stops_on_error() {
        let pages = paginate(0u32, |cursor| async move {
            if cursor == 1 {
                return Err(Error::GraphQl("boom".to_string()));
            }
            Ok(Page {
                items: vec![cursor],
                next: Some(cursor + 1),
            })
        });
        let mut pages = pin!(pages);
        assert_eq!(assert_ok!(pages.next().await.unwrap()), vec![0]);
        assert_err!(pages.next().await.unwrap());
        assert!(pages.next().await.is_none());
    }
}
