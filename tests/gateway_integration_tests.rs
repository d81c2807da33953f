//! Integration Tests for the Fetch Gateway
//!
//! Cache expiry on a manual clock, concurrent misses, and retry behaviour
//! against scripted upstreams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wa_leg_cache::{
    cache::{CacheConfig, ManualClock},
    error::{FetchError, TransportError},
    upstream::UpstreamRequest,
    CacheStore, FetchGateway, Params, RetryPolicy, Transport,
};

// == Helper Functions ==

/// Counts calls and answers with a payload naming the call number.
#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl Transport for Counting {
    async fn call(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(json!([{
            "bill_number": request.param("billNumber"),
            "fetch": n,
        }]))
    }
}

/// Plays back a fixed sequence of outcomes.
struct Scripted {
    outcomes: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(outcomes: Vec<Result<Value, TransportError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transport for Scripted {
    async fn call(&self, _request: &UpstreamRequest) -> Result<Value, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(TransportError::Connection("script exhausted".into())))
    }
}

fn bill_params(bill_number: Value, biennium: &str) -> Params {
    let mut params = Params::new();
    params.insert("bill_number".into(), bill_number);
    params.insert("biennium".into(), json!(biennium));
    params
}

fn committee_params(biennium: &str) -> Params {
    let mut params = Params::new();
    params.insert("biennium".into(), json!(biennium));
    params
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        max_attempts,
        Duration::from_millis(100),
        Duration::from_secs(2),
        Duration::from_secs(30),
    )
    .unwrap()
}

fn unavailable() -> Result<Value, TransportError> {
    Err(TransportError::Status {
        status: 503,
        body: "Service Unavailable".into(),
    })
}

// == Cache Lifetime ==

#[tokio::test]
async fn test_bill_status_cached_until_ttl() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = Arc::new(CacheStore::with_clock(
        CacheConfig::new(300, 1000).unwrap(),
        clock.clone(),
    ));
    let transport = Arc::new(Counting::default());
    let gateway = FetchGateway::new(cache, transport.clone(), RetryPolicy::default());

    let params = bill_params(json!("HB1234"), "2025-26");

    let first = assert_ok!(gateway.fetch("getBillStatus", &params).await);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::from_secs(299));
    let second = assert_ok!(gateway.fetch("getBillStatus", &params).await);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);

    clock.advance(Duration::from_secs(1));
    let third = assert_ok!(gateway.fetch("getBillStatus", &params).await);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    assert_eq!(third[0]["fetch"], 2);
}

#[tokio::test]
async fn test_equivalent_spellings_share_entry() {
    let cache = Arc::new(CacheStore::new(CacheConfig::default()));
    let transport = Arc::new(Counting::default());
    let gateway = FetchGateway::new(cache, transport.clone(), RetryPolicy::default());

    for spelling in [json!(1234), json!("1234"), json!("HB 1234"), json!(" hb1234 ")] {
        assert_ok!(gateway.fetch("getBillInfo", &bill_params(spelling, "2025-26")).await);
    }
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    assert_ok!(gateway.fetch("getBillInfo", &bill_params(json!(1234), "2023-24")).await);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_all_succeed() {
    const CALLERS: usize = 16;

    let cache = Arc::new(CacheStore::new(CacheConfig::default()));
    let transport = Arc::new(Counting {
        delay: Duration::from_millis(20),
        ..Counting::default()
    });
    let gateway = Arc::new(FetchGateway::new(cache, transport.clone(), RetryPolicy::default()));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .fetch("getBillStatus", &bill_params(json!(5000), "2025-26"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let payload = assert_ok!(handle.await.unwrap());
        assert_eq!(payload[0]["bill_number"], "5000");
    }

    let calls = transport.calls.load(Ordering::SeqCst);
    assert!((1..=CALLERS).contains(&calls), "unexpected upstream calls: {calls}");

    // Whatever won the race is now cached.
    assert_ok!(gateway.fetch("getBillStatus", &bill_params(json!(5000), "2025-26")).await);
    assert_eq!(transport.calls.load(Ordering::SeqCst), calls);
}

// == Retry ==

#[tokio::test(start_paused = true)]
async fn test_recovers_on_last_attempt() {
    let cache = Arc::new(CacheStore::new(CacheConfig::default()));
    let transport = Arc::new(Scripted::new(vec![
        unavailable(),
        Err(TransportError::Timeout),
        Ok(json!([{"bill_number": "1234"}])),
    ]));
    let gateway = FetchGateway::new(cache, transport.clone(), policy(3));

    let payload = assert_ok!(gateway.fetch("getBillInfo", &bill_params(json!(1234), "2025-26")).await);
    assert_eq!(payload[0]["bill_number"], "1234");
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    assert_eq!(gateway.stats().retries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_upstream_is_not_cached() {
    let cache = Arc::new(CacheStore::new(CacheConfig::default()));
    let transport = Arc::new(Scripted::new(vec![unavailable(), unavailable(), unavailable()]));
    let gateway = FetchGateway::new(Arc::clone(&cache), transport.clone(), policy(3));

    let err = assert_err!(gateway.fetch("getCommittees", &committee_params("2025-26")).await);
    assert!(err.is_upstream());
    assert!(matches!(err, FetchError::Upstream { attempts: 3, .. }));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    assert!(cache.is_empty());
    assert_eq!(gateway.stats().failures, 1);
}
