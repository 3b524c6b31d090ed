//! In-memory transport for testing

use crate::transport::{async_trait, RpcTransport};
use crate::{Error, Result};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Transport answering from a table of scripted results
///
/// Results are keyed by method and parameters. Unscripted calls fail the
/// way a node fails an unknown method.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    answers: Arc<DashMap<String, Result<Value>>>,
    closed: Arc<AtomicBool>,
}

fn key(method: &str, params: &Value) -> String {
    format!("{method}{params}")
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the answer to `method` called with `params`
    pub fn on(&self, method: &str, params: Value, answer: Result<Value>) -> &Self {
        self.answers.insert(key(method, &params), answer);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl RpcTransport for MemoryTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        if self.is_closed() {
            return Err(Error::Transport("client closed".into()));
        }

        self.answers
            .get(&key(method, &params))
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| {
                Err(Error::Rpc {
                    code: -32601,
                    message: format!("the method {method} does not exist/is not available"),
                })
            })
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
