//! Batch-oriented REST client.
//!
//! Turns caller-supplied `{key, path, payload}` tuples into lazy, retry-
//! wrapped operations and hands them to the executor, one entry point per
//! verb family. The client never inspects or reorders results; it is an
//! adapter between "many single-item calls" and one executor invocation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::config::FanoutConfig;
use crate::executor::{BatchResult, ExecutorError, ParallelExecutor};
use crate::retry::{classify_response, classify_transport, run_with_retry, ApiError, BackoffPolicy};

/// One logical request in a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Caller-supplied correlation key. Results map back positionally:
    /// `results[i]` corresponds to `items[i]`, and the key is echoed in each
    /// success value.
    pub key: String,
    /// Target path, joined against the client's base URL.
    pub path: String,
    /// JSON body for create/update verbs; ignored by fetch and delete.
    pub payload: Option<Value>,
}

impl BatchItem {
    pub fn new(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Success value of one batch item: the correlation key plus the parsed
/// response body (`Null` when the server sent no body, e.g. 204).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub key: String,
    pub body: Value,
}

/// Client for fanning out many single-item REST calls as one batch.
///
/// Each item gets its own retry accounting: a fresh retry loop wraps every
/// operation, so one item's backoff never affects its siblings beyond
/// normal slot contention.
pub struct BatchClient {
    http: reqwest::Client,
    base_url: Url,
    executor: ParallelExecutor,
    backoff: Arc<dyn BackoffPolicy>,
    rate_limit_default_secs: u64,
}

impl BatchClient {
    /// Builds a client from config. `base_url` should end with a trailing
    /// slash so relative paths join underneath it.
    pub fn new(base_url: Url, cfg: &FanoutConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url,
            executor: ParallelExecutor::new(cfg.executor()),
            backoff: Arc::new(cfg.backoff()),
            rate_limit_default_secs: cfg.rate_limit_default_secs,
        })
    }

    /// Replaces the injected backoff policy.
    pub fn with_backoff(mut self, policy: Arc<dyn BackoffPolicy>) -> Self {
        self.backoff = policy;
        self
    }

    /// Reads many resources (GET).
    pub async fn fetch_many(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<BatchResult<ItemOutcome>, ExecutorError> {
        self.execute_batch(Method::GET, items, "fetch").await
    }

    /// Creates many resources (POST).
    pub async fn create_many(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<BatchResult<ItemOutcome>, ExecutorError> {
        self.execute_batch(Method::POST, items, "create").await
    }

    /// Partially updates many resources (PATCH).
    pub async fn update_many(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<BatchResult<ItemOutcome>, ExecutorError> {
        self.execute_batch(Method::PATCH, items, "update").await
    }

    /// Deletes many resources (DELETE).
    pub async fn delete_many(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<BatchResult<ItemOutcome>, ExecutorError> {
        self.execute_batch(Method::DELETE, items, "delete").await
    }

    async fn execute_batch(
        &self,
        method: Method,
        items: Vec<BatchItem>,
        label: &str,
    ) -> Result<BatchResult<ItemOutcome>, ExecutorError> {
        if items.is_empty() {
            return Ok(BatchResult::empty());
        }
        let operations: Vec<_> = items
            .into_iter()
            .map(|item| self.build_operation(method.clone(), item))
            .collect();
        self.executor.execute_parallel(operations, label).await
    }

    /// Builds one lazy operation: nothing runs until the executor polls it.
    fn build_operation(
        &self,
        method: Method,
        item: BatchItem,
    ) -> impl Future<Output = Result<ItemOutcome, ApiError>> + Send + 'static {
        let http = self.http.clone();
        let base = self.base_url.clone();
        let backoff = Arc::clone(&self.backoff);
        let default_secs = self.rate_limit_default_secs;
        async move {
            run_with_retry(backoff.as_ref(), || {
                single_call(
                    http.clone(),
                    base.clone(),
                    method.clone(),
                    item.clone(),
                    default_secs,
                )
            })
            .await
        }
    }
}

/// One attempt at one item: send the request, classify anything that goes
/// wrong, parse a success body.
async fn single_call(
    http: reqwest::Client,
    base: Url,
    method: Method,
    item: BatchItem,
    default_retry_after_secs: u64,
) -> Result<ItemOutcome, ApiError> {
    let url = base
        .join(&item.path)
        .map_err(|e| ApiError::request(format!("invalid request path {:?}: {}", item.path, e)))?;

    let mut request = http.request(method, url);
    if let Some(payload) = &item.payload {
        request = request.json(payload);
    }

    let response = request.send().await.map_err(|e| classify_transport(&e))?;
    let status = response.status();

    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.unwrap_or_default();
        return Err(classify_response(
            status.as_u16(),
            retry_after.as_deref(),
            &body,
            default_retry_after_secs,
        ));
    }

    let body = response.bytes().await.map_err(|e| classify_transport(&e))?;
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::http(
                status.as_u16(),
                format!("unparseable response body: {}", e),
                None,
            )
        })?
    };

    Ok(ItemOutcome {
        key: item.key,
        body,
    })
}
