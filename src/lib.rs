//! Farcaster EdDSA Signer
//!
//! Generates an ed25519 signer, resolves the fid of a connected wallet through
//! the IdRegistry, and asks the wallet to sign the signer authorization message.

pub mod config;
pub mod console;
pub mod error;
pub mod evm_client;
pub mod keypair;
pub mod message;
pub mod registry;
pub mod session;
pub mod wallet;

pub use config::Config;
pub use error::SignerError;
pub use keypair::SignerKeypair;
pub use message::{SignedAuthorization, SignerAuthorization, SIGNER_SCHEMA};
pub use registry::{FidResolver, IdRegistryClient};
pub use session::{Session, SessionState};
pub use wallet::{Approval, LocalWallet, WalletBridge, WalletEvent};
