//! # EVM RPC
//!
//! Chain-observation client for EVM-compatible chains.
//!
//! Two finality strategies are available:
//! - confirmation based: a block is final once `confirmations` blocks are on top
//! - checkpoint based: the node's `finalized` block tag
//!
//! [`connect`] picks checkpoint finality when the node supports it and falls
//! back to confirmations otherwise. Callers only see a [`ChainClient`].

pub mod client;
pub mod error;
pub mod memory;
pub mod transport;
pub mod types;

pub use client::{ChainClient, Ethereum2Client, EthereumClient, Finality};
pub use error::{Error, Result};
pub use memory::MemoryTransport;
pub use transport::{HttpTransport, RpcTransport};
pub use types::{Address, BlockNumber, Header, Log, Receipt, H256};

use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Operator override of the finality strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinalityOverride {
    /// Use checkpoints when the node supports them
    #[default]
    NoOverride,
    /// Always count confirmations
    Confirmation,
}

impl FromStr for FinalityOverride {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(FinalityOverride::NoOverride),
            "confirmation" => Ok(FinalityOverride::Confirmation),
            other => Err(Error::InvalidConfig(format!(
                "unknown finality override {other:?}"
            ))),
        }
    }
}

/// Connect to the node at `url`
pub async fn connect(url: &str, finality: FinalityOverride) -> Result<Box<dyn ChainClient>> {
    let transport = HttpTransport::new(url)?;
    with_transport(Arc::new(transport), finality).await
}

/// Build a client over an existing transport
///
/// Probes the node for the `finalized` tag unless confirmations are forced.
pub async fn with_transport<T>(
    transport: Arc<T>,
    finality: FinalityOverride,
) -> Result<Box<dyn ChainClient>>
where
    T: RpcTransport + 'static,
{
    let ethereum = EthereumClient::new(transport);

    if finality == FinalityOverride::Confirmation {
        info!("Using confirmation finality (override)");
        return Ok(Box::new(ethereum));
    }

    match Ethereum2Client::new(ethereum.clone()).await {
        Ok(client) => {
            info!("Using checkpoint finality");
            Ok(Box::new(client))
        }
        Err(e) => {
            debug!(error = %e, "Finalized tag unavailable");
            info!("Using confirmation finality");
            Ok(Box::new(ethereum))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn header(number: u64) -> Value {
        json!({
            "hash": format!("0x{}", "aa".repeat(32)),
            "parentHash": format!("0x{}", "bb".repeat(32)),
            "number": format!("0x{number:x}"),
            "timestamp": "0x64",
            "transactions": [format!("0x{}", "cc".repeat(32))],
        })
    }

    fn node(finalized: Option<u64>, latest: u64) -> Arc<MemoryTransport> {
        let transport = MemoryTransport::new();
        transport.on("eth_blockNumber", json!([]), Ok(json!(format!("0x{latest:x}"))));
        if let Some(number) = finalized {
            transport.on(
                "eth_getBlockByNumber",
                json!(["finalized", false]),
                Ok(header(number)),
            );
        }
        Arc::new(transport)
    }

    #[test]
    fn test_parse_override() {
        assert_eq!("".parse::<FinalityOverride>().unwrap(), FinalityOverride::NoOverride);
        assert_eq!(
            "Confirmation".parse::<FinalityOverride>().unwrap(),
            FinalityOverride::Confirmation
        );
        assert!("checkpoint-ish".parse::<FinalityOverride>().is_err());
    }

    #[tokio::test]
    async fn test_prefers_checkpoint_finality() {
        let client = with_transport(node(Some(90), 100), FinalityOverride::NoOverride)
            .await
            .unwrap();

        assert_eq!(client.finality(), Finality::Checkpoint);
        assert_eq!(client.latest_finalized_block_number(10).await.unwrap(), 90);
    }

    #[tokio::test]
    async fn test_falls_back_to_confirmations() {
        let client = with_transport(node(None, 100), FinalityOverride::NoOverride)
            .await
            .unwrap();

        assert_eq!(client.finality(), Finality::Confirmation);
        assert_eq!(client.latest_finalized_block_number(10).await.unwrap(), 91);
        assert_eq!(client.latest_finalized_block_number(1).await.unwrap(), 100);
        assert_eq!(client.latest_finalized_block_number(0).await.unwrap(), 100);
        assert_eq!(client.latest_finalized_block_number(500).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_confirmations_at_max_block_number() {
        let client = with_transport(node(None, u64::MAX), FinalityOverride::Confirmation)
            .await
            .unwrap();

        assert_eq!(client.latest_finalized_block_number(1).await.unwrap(), u64::MAX);
        assert_eq!(client.latest_finalized_block_number(10).await.unwrap(), u64::MAX - 9);
    }

    #[tokio::test]
    async fn test_override_skips_probe() {
        let client = with_transport(node(Some(90), 100), FinalityOverride::Confirmation)
            .await
            .unwrap();

        assert_eq!(client.finality(), Finality::Confirmation);
        assert_eq!(client.latest_finalized_block_number(5).await.unwrap(), 96);
    }

    #[tokio::test]
    async fn test_header_and_missing_receipt() {
        let transport = node(Some(90), 100);
        transport.on("eth_getBlockByNumber", json!(["0x5a", false]), Ok(header(90)));
        let hash = H256([1; 32]);
        transport.on("eth_getTransactionReceipt", json!([hash]), Ok(Value::Null));

        let client = with_transport(transport, FinalityOverride::NoOverride)
            .await
            .unwrap();

        let header = client.header_by_number(BlockNumber::Number(90)).await.unwrap();
        assert_eq!(header.number, 90);
        assert_eq!(header.timestamp, 100);
        assert_eq!(header.transactions, vec![H256([0xcc; 32])]);

        assert!(matches!(
            client.transaction_receipt(hash).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_close_reaches_transport() {
        let transport = node(None, 100);
        let client = with_transport(transport.clone(), FinalityOverride::NoOverride)
            .await
            .unwrap();

        client.close();

        assert!(transport.is_closed());
        assert!(matches!(
            client.latest_finalized_block_number(1).await,
            Err(Error::Transport(_))
        ));
    }
}
