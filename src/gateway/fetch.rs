//! Fetch Gateway
//!
//! Cache-first access to the upstream legislative service.

use std::sync::Arc;

use backoff::backoff::Backoff;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::cache::CacheStore;
use crate::error::{FetchError, TransportError};
use crate::gateway::{GatewayStats, GatewayStatsSnapshot, Operation, RetryPolicy};
use crate::upstream::{Transport, UpstreamRequest};

/// Loosely typed request parameters as they arrive from a tool call.
pub type Params = Map<String, Value>;

/// A cached upstream answer. Shared immutably between the cache and callers.
pub type Payload = Arc<Value>;

// == Fetch Gateway ==
/// Serves operations from the cache, falling back to the upstream.
///
/// Concurrent misses on one key are not coalesced: each caller goes
/// upstream and the last successful write wins.
pub struct FetchGateway {
    cache: Arc<CacheStore<Payload>>,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    stats: GatewayStats,
}

impl FetchGateway {
    pub fn new(
        cache: Arc<CacheStore<Payload>>,
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            cache,
            transport,
            policy,
            stats: GatewayStats::default(),
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore<Payload>> {
        &self.cache
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats.snapshot()
    }

    // == Fetch ==
    /// Returns the answer for `operation_name` with `params`.
    ///
    /// Successful answers are cached, empty ones included. Failures are
    /// never cached. Dropping the returned future abandons any in-flight
    /// attempt or backoff and leaves the cache untouched.
    pub async fn fetch(&self, operation_name: &str, params: &Params) -> Result<Payload, FetchError> {
        let operation: Operation = operation_name.parse()?;
        let request = operation.normalize(params)?;
        self.stats.record_request();

        if let Some(hit) = self.cache.get(request.key.as_str()) {
            debug!(key = %request.key, "cache hit");
            self.stats.record_cache_hit();
            return Ok(hit);
        }
        debug!(key = %request.key, "cache miss");

        let value = match self.call_upstream(operation, &request.upstream).await {
            Ok(value) => value,
            Err(err) => {
                self.stats.record_failure();
                return Err(err);
            }
        };

        let payload = Arc::new(value);
        self.cache.put(request.key.into_string(), Arc::clone(&payload));
        Ok(payload)
    }

    /// Drops the cached answer for `operation_name` with `params`, if any.
    pub fn invalidate(&self, operation_name: &str, params: &Params) -> Result<(), FetchError> {
        let operation: Operation = operation_name.parse()?;
        let request = operation.normalize(params)?;
        self.cache.invalidate(request.key.as_str());
        Ok(())
    }

    // == Upstream Call ==
    async fn call_upstream(
        &self,
        operation: Operation,
        request: &UpstreamRequest,
    ) -> Result<Value, FetchError> {
        let mut backoff = self.policy.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.stats.record_upstream_call();

            let outcome =
                match tokio::time::timeout(self.policy.attempt_timeout, self.transport.call(request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout),
                };

            let cause = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(%operation, attempt, "upstream succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(cause) => cause,
            };

            if !cause.is_transient() {
                error!(%operation, attempt, %cause, "upstream failed permanently");
                return Err(FetchError::Upstream {
                    operation: operation.name().to_string(),
                    attempts: attempt,
                    cause,
                });
            }

            if attempt >= self.policy.max_attempts {
                error!(%operation, attempt, %cause, "upstream retries exhausted");
                return Err(match cause {
                    TransportError::Timeout => FetchError::Timeout {
                        operation: operation.name().to_string(),
                        attempts: attempt,
                    },
                    cause => FetchError::Upstream {
                        operation: operation.name().to_string(),
                        attempts: attempt,
                        cause,
                    },
                });
            }

            let delay = backoff.next_backoff().unwrap_or(self.policy.max_delay);
            warn!(
                %operation,
                attempt,
                %cause,
                delay_ms = delay.as_millis() as u64,
                "transient upstream failure, retrying"
            );
            self.stats.record_retry();
            tokio::time::sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for FetchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchGateway")
            .field("policy", &self.policy)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
