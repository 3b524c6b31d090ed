//! Chain data types

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! fixed_bytes {
    ($name:ident, $len:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(digits, &mut bytes)
                    .map_err(|e| Error::Decode(format!("{}: {s:?}: {e}", stringify!($name))))?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(H256, 32, "32-byte hash");
fixed_bytes!(Address, 20, "20-byte account address");

/// Block selector for header queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockNumber {
    Latest,
    Safe,
    Finalized,
    Number(u64),
}

impl BlockNumber {
    /// JSON-RPC block parameter
    pub fn to_param(self) -> String {
        match self {
            BlockNumber::Latest => "latest".into(),
            BlockNumber::Safe => "safe".into(),
            BlockNumber::Finalized => "finalized".into(),
            BlockNumber::Number(n) => quantity::encode(n),
        }
    }
}

impl From<u64> for BlockNumber {
    fn from(n: u64) -> Self {
        BlockNumber::Number(n)
    }
}

/// Block header fields the validator reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub hash: H256,
    pub parent_hash: H256,
    #[serde(with = "quantity")]
    pub number: u64,
    #[serde(with = "quantity")]
    pub timestamp: u64,
    /// Hashes of the block's transactions
    #[serde(default)]
    pub transactions: Vec<H256>,
}

/// Event log emitted by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    #[serde(with = "data")]
    pub data: Vec<u8>,
}

/// Transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: H256,
    pub block_hash: H256,
    #[serde(with = "quantity")]
    pub block_number: u64,
    #[serde(with = "quantity")]
    pub status: u64,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Whether the transaction executed successfully
    pub fn succeeded(&self) -> bool {
        self.status == 1
    }
}

/// `0x`-prefixed hex integers
pub mod quantity {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn encode(n: u64) -> String {
        format!("0x{n:x}")
    }

    pub fn decode(s: &str) -> Result<u64, String> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| format!("quantity {s:?} lacks 0x prefix"))?;
        u64::from_str_radix(digits, 16).map_err(|e| format!("quantity {s:?}: {e}"))
    }

    pub fn serialize<S: Serializer>(n: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(*n))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode(&s).map_err(serde::de::Error::custom)
    }
}

/// `0x`-prefixed hex byte strings
mod data {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
