//! JSON-RPC transports

use crate::{Error, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, instrument};

pub use ::async_trait::async_trait;

/// Default timeout for a single JSON-RPC request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A channel carrying JSON-RPC requests to a node
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Call `method` with positional `params` and return its `result`
    async fn request(&self, method: &str, params: Value) -> Result<Value>;

    /// Release the channel; later requests fail
    fn close(&self);
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 over HTTP
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Node endpoint
    url: Url,
    /// Request timeout
    timeout: Duration,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl HttpTransport {
    /// Create a transport for the node at `url`
    ///
    /// No request is made; only the URL is validated.
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidConfig(format!("{url:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "unsupported scheme {:?}",
                url.scheme()
            )));
        }

        Ok(Self {
            client: Client::new(),
            url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    #[instrument(skip(self, params))]
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Transport("client closed".into()));
        }

        let req = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&req)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "POST failed with status: {}",
                response.status()
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| Error::Decode(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        debug!(id = req.id, "RPC answered");
        Ok(body.result)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            HttpTransport::new("ws://127.0.0.1:8546"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(HttpTransport::new("http://127.0.0.1:8545").is_ok());
    }

    #[tokio::test]
    async fn test_closed_transport_refuses_requests() {
        let transport = HttpTransport::new("http://127.0.0.1:8545").unwrap();
        transport.close();

        let err = transport
            .request("eth_blockNumber", Value::Array(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, Error::Transport("client closed".into()));
    }

    #[test]
    fn test_error_envelope() {
        let body: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap();
        assert!(body.result.is_null());
        assert_eq!(body.error.unwrap().code, -32601);
    }
}
