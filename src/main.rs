//! Farcaster EdDSA Signer
//!
//! Generates an EdDSA signer, connects the wallet, resolves its fid and asks
//! the wallet to sign the signer authorization message.
//!
//! ## Usage
//!
//! ```bash
//! INFURA_API_KEY=<key> WALLET_PRIVATE_KEY=<hex> cargo run --bin farcaster-signer
//! ```
//!
//! Pass `--dev` to also log the generated private key (local demos only).

use anyhow::{Context, Result};
use clap::Parser;
use farcaster_signer::{
    console::Console,
    evm_client::EvmClient,
    Approval, Config, IdRegistryClient, LocalWallet, Session, SessionState, SignerKeypair,
};
use std::io::Write;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "farcaster-signer")]
#[command(about = "Generate a Farcaster EdDSA signer and have your wallet sign its authorization")]
struct Args {
    /// Path to configuration file (default: config/farcaster-signer.toml or FARCASTER_SIGNER_CONFIG_PATH env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Hex private key of the wallet that owns the Farcaster account
    #[arg(long, env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
    wallet_key: String,

    /// Sign without asking for confirmation
    #[arg(long)]
    auto_approve: bool,

    /// Development mode: log the generated EdDSA private key
    #[arg(long)]
    dev: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first (before initializing logging)
    let args = Args::parse();

    if args.json_logs {
        tracing_subscriber::fmt().json().init();
    } else {
        tracing_subscriber::fmt::init();
    }

    info!("Starting Farcaster EdDSA Signer");

    // Priority: CLI arg > env var > default
    let mut config = match args.config.as_deref() {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            Config::load_from_path(Some(path))
        }
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if args.dev {
        config.debug.log_private_key = true;
    }
    if config.debug.log_private_key {
        warn!("Development mode: the generated private key will be logged. Do not use it in production.");
    }

    let keypair = SignerKeypair::generate().context("Failed to generate EdDSA signer")?;
    info!("Generated EdDSA signer: {}", keypair.public_key_hex());

    let evm_client = EvmClient::new(&config.rpc_url())?;
    if let Some(expected) = config.provider.chain_id {
        let chain_id = evm_client
            .get_chain_id()
            .await
            .with_context(|| format!("Failed to query chain ID from {}", evm_client.endpoint()))?;
        if chain_id != expected {
            anyhow::bail!(
                "Provider at {} is on chain {}, expected {}",
                evm_client.endpoint(),
                chain_id,
                expected
            );
        }
    }
    let resolver = IdRegistryClient::new(evm_client, &config.registry.id_registry_address)?;
    info!("IdRegistry: {}", resolver.registry_addr());

    let approval = if args.auto_approve {
        Approval::Auto
    } else {
        Approval::Prompt
    };
    let (wallet, mut events) = LocalWallet::from_private_key_hex(&args.wallet_key, approval)
        .context("Failed to load wallet")?;
    let wallet = Arc::new(wallet);

    let session = Session::new(&config, keypair, resolver, wallet.clone());
    let mut console = Console::stdout();
    console.render_intro()?;

    let mut state_rx = session.subscribe();
    session.mark_connecting();
    wallet.connect()?;

    let final_state = tokio::select! {
        _ = session.run(&mut events) => session.state(),
        rendered = render_until_settled(&mut state_rx, &mut console) => rendered?,
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, disconnecting wallet...");
            wallet.disconnect().ok();
            session.state()
        }
    };

    match final_state {
        SessionState::Failed { reason } => anyhow::bail!("Signer authorization failed: {}", reason),
        SessionState::Signed(signed) => {
            info!(
                "Done. Signer {} authorized for fid {}",
                signed.message.authorized_public_key, signed.message.fid
            );
            Ok(())
        }
        other => {
            info!("Stopped in state {}", other.name());
            Ok(())
        }
    }
}

/// Renders every observed state until the flow settles.
async fn render_until_settled<W: Write>(
    state_rx: &mut watch::Receiver<SessionState>,
    console: &mut Console<W>,
) -> Result<SessionState> {
    loop {
        let state = state_rx.borrow_and_update().clone();
        console.render_state(&state)?;
        if state.is_settled() || state_rx.changed().await.is_err() {
            return Ok(state);
        }
    }
}
