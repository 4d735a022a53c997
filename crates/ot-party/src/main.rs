//! OT Party CLI
//!
//! Command-line interface for Simplest OT:
//! - Run a transfer with sender and receiver as separate tasks over a relay
//! - Generate a private key and its public point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use simplest_ot::key_agreement::{generate_private_scalar, public_point_of};
use simplest_ot::relay::MemoryRelay;
use simplest_ot::{
    session, Receiver, ReceiverConfig, ReceiverPhase, Sender, SenderConfig, SessionId,
};
use std::time::Duration;
use tracing::{info, Level};

/// OT Party - Simplest OT runner
#[derive(Parser)]
#[command(name = "ot-party")]
#[command(about = "1-out-of-2 oblivious transfer over secp256k1")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full transfer between a local sender and receiver
    Transfer {
        /// Message delivered for choice 0
        #[arg(long)]
        message0: String,

        /// Message delivered for choice 1
        #[arg(long)]
        message1: String,

        /// Receiver's choice bit
        #[arg(short, long, action = clap::ArgAction::Set, default_value_t = false)]
        choice: bool,

        /// Sender private key (hex, 32 bytes); generated if absent
        #[arg(long, env = "OT_SENDER_KEY")]
        sender_key: Option<String>,

        /// Receiver private key (hex, 32 bytes); generated if absent
        #[arg(long, env = "OT_RECEIVER_KEY")]
        receiver_key: Option<String>,

        /// Seconds each party waits for its peer
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },

    /// Generate a private key and print it with its public point
    Keygen,
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

    match cli.command {
        Commands::Transfer {
            message0,
            message1,
            choice,
            sender_key,
            receiver_key,
            timeout_secs,
        } => {
            let mut sender_config = SenderConfig::new(message0, message1);
            if let Some(key) = sender_key {
                sender_config = sender_config.with_private_key(parse_key(&key)?);
            }

            let mut receiver_config = ReceiverConfig::new(choice);
            if let Some(key) = receiver_key {
                receiver_config = receiver_config.with_private_key(parse_key(&key)?);
            }

            run_transfer(
                sender_config,
                receiver_config,
                Duration::from_secs(timeout_secs),
            )
            .await?;
        }
        Commands::Keygen => {
            run_keygen()?;
        }
    }

    Ok(())
}

async fn run_transfer(
    sender_config: SenderConfig,
    receiver_config: ReceiverConfig,
    timeout: Duration,
) -> Result<()> {
    let relay = MemoryRelay::new().with_timeout(timeout);
    let session_id: SessionId = rand::random();

    let sender = Sender::new(sender_config).context("invalid sender configuration")?;
    let mut receiver = Receiver::new(receiver_config).context("invalid receiver configuration")?;

    info!(session_id = %hex::encode(session_id), "Starting transfer");

    let sender_relay = relay.clone();
    let sender_task =
        tokio::spawn(async move { session::run_sender(&sender, &session_id, &sender_relay).await });

    let phase = session::run_receiver(&mut receiver, &session_id, &relay).await;
    let sent = sender_task.await;
    relay.close_session(&session_id);

    let phase = phase?;
    sent??;

    if phase != ReceiverPhase::Resolved {
        anyhow::bail!("receiver could not recover a message");
    }

    let message = receiver.get_message()?;
    info!(len = message.len(), "Transfer completed");

    // Print recovered message
    println!("Recovered: {}", String::from_utf8_lossy(message));

    Ok(())
}

fn run_keygen() -> Result<()> {
    let private_key = generate_private_scalar(&mut OsRng)?;
    let public_key = public_point_of(&private_key);

    println!("Private Key: {}", hex::encode(private_key.to_bytes()));
    println!("Public Key: {}", hex::encode(public_key.to_bytes()));

    Ok(())
}

fn parse_key(hex_key: &str) -> Result<[u8; 32]> {
    hex::decode(hex_key.trim_start_matches("0x"))?
        .try_into()
        .map_err(|_| anyhow::anyhow!("Private key must be 32 bytes"))
}
