//! Validator Signer CLI
//!
//! Command-line interface for the validator side of threshold signing:
//! - Key generation through the signing backend
//! - Payload signing through the signing backend
//! - Participant checks
//! - Finalized block queries against an EVM node

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evm_rpc::FinalityOverride;
use std::time::Duration;
use tracing::{info, Level};
use tss_client::HttpBackend;
use tss_coordinator::backend::async_trait;
use tss_coordinator::{
    Broadcaster, KeyUid, ParticipantId, PayloadHash, PublicKey, SigningCoordinator, Submission,
    DEFAULT_TIMEOUT_SECS,
};

/// Validator Signer - threshold signing coordinator
#[derive(Parser)]
#[command(name = "validator-signer")]
#[command(about = "Validator-side threshold signing coordinator")]
#[command(version)]
struct Cli {
    /// Signing backend URL
    #[arg(short, long, env = "TSS_BACKEND_URL", default_value = "http://127.0.0.1:50051")]
    backend_url: String,

    /// This validator's participant identity (hex); required for keygen,
    /// sign and is-participant
    #[arg(short, long, env = "PARTICIPANT")]
    participant: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short, long, env = "TSS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key
    Keygen {
        /// Key UID
        #[arg(short, long)]
        key_uid: String,
    },

    /// Sign a payload hash
    Sign {
        /// Key UID
        #[arg(short, long)]
        key_uid: String,

        /// Payload hash to sign (hex encoded, 32 bytes)
        #[arg(short = 'm', long)]
        payload_hash: String,

        /// Public key returned by keygen (hex encoded)
        #[arg(short = 'P', long)]
        public_key: String,
    },

    /// Check whether an address is this validator
    IsParticipant {
        /// Candidate address (hex)
        candidate: String,
    },

    /// Show the latest finalized block of an EVM chain
    FinalizedBlock {
        /// EVM JSON-RPC URL
        #[arg(short, long, env = "EVM_RPC_URL")]
        rpc_url: String,

        /// Confirmations required under confirmation finality
        #[arg(short, long, default_value_t = 1)]
        confirmations: u64,

        /// Finality override ("confirmation" forces confirmation counting)
        #[arg(short, long, default_value = "")]
        finality: String,
    },
}

/// Prints submissions as JSON lines
struct StdoutBroadcaster;

#[async_trait]
impl Broadcaster for StdoutBroadcaster {
    async fn broadcast(&self, submission: Submission) -> tss_coordinator::Result<()> {
        let line = serde_json::to_string(&submission)
            .map_err(|e| tss_coordinator::Error::InvalidInput(e.to_string()))?;
        println!("{line}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let broadcaster = StdoutBroadcaster;

    match cli.command {
        Commands::Keygen { ref key_uid } => {
            run_keygen(&build_coordinator(&cli)?, &broadcaster, key_uid).await?;
        }
        Commands::Sign {
            ref key_uid,
            ref payload_hash,
            ref public_key,
        } => {
            let coordinator = build_coordinator(&cli)?;
            run_sign(&coordinator, &broadcaster, key_uid, payload_hash, public_key).await?;
        }
        Commands::IsParticipant { ref candidate } => {
            let coordinator = build_coordinator(&cli)?;
            let candidate = ParticipantId::from_hex(candidate)?;
            println!("{}", coordinator.is_participant(&candidate));
        }
        Commands::FinalizedBlock {
            ref rpc_url,
            confirmations,
            ref finality,
        } => {
            run_finalized_block(rpc_url, confirmations, finality).await?;
        }
    }

    Ok(())
}

/// Coordinator for the configured participant and backend
fn build_coordinator(cli: &Cli) -> Result<SigningCoordinator<HttpBackend>> {
    let participant = cli
        .participant
        .as_deref()
        .context("--participant (or PARTICIPANT) is required for this command")?;
    let participant =
        ParticipantId::from_hex(participant).context("invalid participant identity")?;

    Ok(SigningCoordinator::new(
        participant,
        Duration::from_secs(cli.timeout_secs),
        HttpBackend::new(&cli.backend_url),
    )?)
}

async fn run_keygen(
    coordinator: &SigningCoordinator<HttpBackend>,
    broadcaster: &impl Broadcaster,
    key_uid: &str,
) -> Result<()> {
    let key_uid = KeyUid::new(key_uid);

    info!(
        key_uid = %key_uid,
        party_uid = %coordinator.party_uid(),
        "Starting keygen"
    );

    let public_key = coordinator.generate_key(&key_uid).await?;

    broadcaster
        .broadcast(Submission::PublicKey {
            key_uid,
            participant: coordinator.participant().clone(),
            public_key,
        })
        .await?;

    Ok(())
}

async fn run_sign(
    coordinator: &SigningCoordinator<HttpBackend>,
    broadcaster: &impl Broadcaster,
    key_uid: &str,
    payload_hash: &str,
    public_key: &str,
) -> Result<()> {
    let key_uid = KeyUid::new(key_uid);
    let payload_hash = PayloadHash::from_hex(payload_hash)?;
    let public_key = PublicKey::new(
        hex::decode(public_key.trim_start_matches("0x"))
            .context("public key must be hex encoded")?,
    );

    info!(
        key_uid = %key_uid,
        party_uid = %coordinator.party_uid(),
        "Starting signing"
    );

    let signature = coordinator.sign(&key_uid, &payload_hash, &public_key).await?;

    broadcaster
        .broadcast(Submission::Signature {
            key_uid,
            participant: coordinator.participant().clone(),
            payload_hash,
            signature,
        })
        .await?;

    Ok(())
}

async fn run_finalized_block(rpc_url: &str, confirmations: u64, finality: &str) -> Result<()> {
    let finality: FinalityOverride = finality.parse()?;
    let client = evm_rpc::connect(rpc_url, finality).await?;

    let number = client.latest_finalized_block_number(confirmations).await;
    client.close();
    let number = number?;

    info!(
        finality = ?client.finality(),
        confirmations,
        number,
        "Latest finalized block"
    );
    println!("{number}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sign() {
        let cli = Cli::try_parse_from([
            "validator-signer",
            "--participant",
            "0101",
            "sign",
            "--key-uid",
            "key1",
            "-m",
            "ab",
            "-P",
            "02",
        ])
        .unwrap();

        assert_eq!(cli.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(matches!(cli.command, Commands::Sign { ref key_uid, .. } if key_uid == "key1"));
        assert_eq!(build_coordinator(&cli).unwrap().participant().as_bytes(), &[1, 1]);
    }

    #[test]
    fn test_finalized_block_needs_no_participant() {
        let cli = Cli::try_parse_from([
            "validator-signer",
            "finalized-block",
            "--rpc-url",
            "http://127.0.0.1:8545",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::FinalizedBlock { confirmations: 1, .. }));
        if cli.participant.is_none() {
            assert!(build_coordinator(&cli).is_err());
        }
    }
}
