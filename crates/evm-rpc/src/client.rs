//! Chain clients with their finality strategies

use crate::transport::{async_trait, RpcTransport};
use crate::types::quantity;
use crate::{BlockNumber, Error, Header, Receipt, Result, H256};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// How a client decides a block is irreversible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finality {
    /// A block is final once enough blocks are built on top of it
    Confirmation,
    /// The node's `finalized` checkpoint
    Checkpoint,
}

/// Calls to an EVM JSON-RPC endpoint
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Receipt of the transaction `tx_hash`
    async fn transaction_receipt(&self, tx_hash: H256) -> Result<Receipt>;

    /// Header of the selected block
    async fn header_by_number(&self, number: BlockNumber) -> Result<Header>;

    /// Number of the latest block considered final
    async fn latest_finalized_block_number(&self, confirmations: u64) -> Result<u64>;

    /// Finality strategy in use
    fn finality(&self) -> Finality;

    /// Close the underlying connection
    fn close(&self);
}

/// Confirmation-count based client
pub struct EthereumClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for EthereumClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: RpcTransport> EthereumClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Number of the most recent block
    pub async fn block_number(&self) -> Result<u64> {
        let value = self.transport.request("eth_blockNumber", json!([])).await?;
        let s = value
            .as_str()
            .ok_or_else(|| Error::Decode(format!("block number {value}")))?;
        quantity::decode(s).map_err(Error::Decode)
    }
}

fn not_null(value: Value, what: impl FnOnce() -> String) -> Result<Value> {
    if value.is_null() {
        Err(Error::NotFound(what()))
    } else {
        Ok(value)
    }
}

#[async_trait]
impl<T: RpcTransport> ChainClient for EthereumClient<T> {
    #[instrument(skip(self))]
    async fn transaction_receipt(&self, tx_hash: H256) -> Result<Receipt> {
        let value = self
            .transport
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        let value = not_null(value, || format!("receipt for transaction {tx_hash}"))?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self))]
    async fn header_by_number(&self, number: BlockNumber) -> Result<Header> {
        let value = self
            .transport
            .request("eth_getBlockByNumber", json!([number.to_param(), false]))
            .await?;
        let value = not_null(value, || format!("block {}", number.to_param()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// `latest - confirmations + 1`; a block counts as its own first
    /// confirmation, so zero is treated as one
    async fn latest_finalized_block_number(&self, confirmations: u64) -> Result<u64> {
        let latest = self.block_number().await?;
        let finalized = latest.saturating_sub(confirmations.max(1) - 1);
        debug!(latest, confirmations, finalized, "Confirmation finality");
        Ok(finalized)
    }

    fn finality(&self) -> Finality {
        Finality::Confirmation
    }

    fn close(&self) {
        self.transport.close();
    }
}

/// Checkpoint based client for nodes exposing the `finalized` block tag
pub struct Ethereum2Client<T> {
    inner: EthereumClient<T>,
}

impl<T: RpcTransport> Ethereum2Client<T> {
    /// Wrap `inner`, failing if the node does not serve the `finalized` tag
    pub async fn new(inner: EthereumClient<T>) -> Result<Self> {
        let client = Self { inner };
        client.finalized_block_number().await?;
        Ok(client)
    }

    async fn finalized_block_number(&self) -> Result<u64> {
        let header = self.inner.header_by_number(BlockNumber::Finalized).await?;
        Ok(header.number)
    }
}

#[async_trait]
impl<T: RpcTransport> ChainClient for Ethereum2Client<T> {
    async fn transaction_receipt(&self, tx_hash: H256) -> Result<Receipt> {
        self.inner.transaction_receipt(tx_hash).await
    }

    async fn header_by_number(&self, number: BlockNumber) -> Result<Header> {
        self.inner.header_by_number(number).await
    }

    /// The checkpoint decides; `confirmations` is ignored
    async fn latest_finalized_block_number(&self, _confirmations: u64) -> Result<u64> {
        self.finalized_block_number().await
    }

    fn finality(&self) -> Finality {
        Finality::Checkpoint
    }

    fn close(&self) {
        self.inner.close();
    }
}
