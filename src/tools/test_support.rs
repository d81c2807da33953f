//! Canned upstream for tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::{CacheConfig, CacheStore};
use crate::error::TransportError;
use crate::gateway::{FetchGateway, Params, RetryPolicy};
use crate::upstream::{Endpoint, Transport, UpstreamRequest};

/// Answers each endpoint with a fixed payload and records every request.
/// Endpoints without an answer fail with a 404.
#[derive(Default)]
pub(crate) struct CannedTransport {
    answers: HashMap<Endpoint, Value>,
    conditional: Vec<(Endpoint, (&'static str, &'static str), Value)>,
    pub(crate) requests: Mutex<Vec<UpstreamRequest>>,
}

impl CannedTransport {
    pub(crate) fn answer(mut self, endpoint: Endpoint, value: Value) -> Self {
        self.answers.insert(endpoint, value);
        self
    }

    /// Answers `endpoint` only when the upstream parameter matches.
    /// Checked before the plain answers.
    pub(crate) fn answer_when(
        mut self,
        endpoint: Endpoint,
        param: (&'static str, &'static str),
        value: Value,
    ) -> Self {
        self.conditional.push((endpoint, param, value));
        self
    }

    pub(crate) fn calls(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn call(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let conditional = self
            .conditional
            .iter()
            .find(|(endpoint, (name, value), _)| {
                *endpoint == request.endpoint && request.param(name) == Some(*value)
            })
            .map(|(_, _, answer)| answer);
        conditional
            .or_else(|| self.answers.get(&request.endpoint))
            .cloned()
            .ok_or(TransportError::Status {
                status: 404,
                body: "no canned answer".to_string(),
            })
    }
}

pub(crate) fn gateway(transport: Arc<CannedTransport>) -> Arc<FetchGateway> {
    let cache = Arc::new(CacheStore::new(CacheConfig::default()));
    Arc::new(FetchGateway::new(cache, transport, RetryPolicy::default()))
}

pub(crate) fn args(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}
