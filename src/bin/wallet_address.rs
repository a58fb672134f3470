//! Get Wallet Ethereum Address
//!
//! Prints the EIP-55 checksummed Ethereum address of a wallet key. This is the
//! address whose fid the signer flow looks up.

use anyhow::{Context, Result};
use clap::Parser;
use farcaster_signer::{Approval, LocalWallet};

#[derive(Parser, Debug)]
#[command(name = "wallet_address")]
#[command(about = "Print the Ethereum address of a wallet private key")]
struct Args {
    /// Hex private key of the wallet
    #[arg(long, env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
    wallet_key: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (wallet, _events) = LocalWallet::from_private_key_hex(&args.wallet_key, Approval::Auto)
        .context("Failed to load wallet")?;

    println!("{}", wallet.address());

    Ok(())
}
