//! Wallet bridge
//!
//! The session consumes two capabilities from a wallet: connection events
//! delivered over a channel, and signature requests over UTF-8 text.
//! `LocalWallet` provides both from an in-memory secp256k1 key.

use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::error::{Result, SignerError};

/// Connection lifecycle events emitted by a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    Connected { address: String, reconnected: bool },
    Disconnected,
}

/// Receiving half of a wallet's event stream.
pub type WalletEvents = mpsc::UnboundedReceiver<WalletEvent>;

/// Asks a connected wallet to sign text.
///
/// Implementations return `SignerError::SignatureRejected` when the user
/// declines. A request that never resolves is bounded by the session timeout.
#[allow(async_fn_in_trait)]
pub trait WalletBridge {
    async fn request_signature(&self, message: &str) -> Result<String>;
}

/// How `LocalWallet` decides whether to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    /// Sign every request
    Auto,
    /// Ask on the terminal; only "y" or "yes" approves
    Prompt,
}

/// Lines typed by the user, in order.
pub type Answers = mpsc::UnboundedReceiver<String>;

/// A wallet holding its secp256k1 key in memory.
pub struct LocalWallet {
    signing_key: SigningKey,
    address: String,
    approval: Approval,
    events: mpsc::UnboundedSender<WalletEvent>,
    connected_before: AtomicBool,
    /// Answer lines for `Approval::Prompt`; stdin is attached on first use
    answers: Mutex<Option<Answers>>,
}

impl LocalWallet {
    /// Creates a wallet from a hex private key (with or without 0x prefix).
    ///
    /// # Returns
    ///
    /// * `Ok((LocalWallet, WalletEvents))` - Wallet and the stream of its connection events
    /// * `Err(SignerError::Wallet)` - Key is not a valid secp256k1 scalar
    pub fn from_private_key_hex(
        private_key_hex: &str,
        approval: Approval,
    ) -> Result<(Self, WalletEvents)> {
        let key_hex = private_key_hex
            .strip_prefix("0x")
            .unwrap_or(private_key_hex);
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| SignerError::Wallet(format!("invalid wallet key hex: {}", e)))?;
        if key_bytes.len() != 32 {
            return Err(SignerError::Wallet(format!(
                "wallet key must be 32 bytes (64 hex chars), got {}",
                key_bytes.len()
            )));
        }
        let signing_key = SigningKey::from_slice(&key_bytes)
            .map_err(|e| SignerError::Wallet(format!("invalid wallet key: {}", e)))?;

        Ok(Self::new(signing_key, approval))
    }

    pub fn new(signing_key: SigningKey, approval: Approval) -> (Self, WalletEvents) {
        let (events, receiver) = mpsc::unbounded_channel();
        let address = ethereum_address(&signing_key);
        let wallet = Self {
            signing_key,
            address,
            approval,
            events,
            connected_before: AtomicBool::new(false),
            answers: Mutex::new(None),
        };
        (wallet, receiver)
    }

    /// Reads prompt answers from `answers` instead of stdin.
    pub fn with_answers(mut self, answers: Answers) -> Self {
        self.answers = Mutex::new(Some(answers));
        self
    }

    /// EIP-55 checksummed address of this wallet
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Emits a `Connected` event for this wallet's account.
    pub fn connect(&self) -> Result<()> {
        let reconnected = self.connected_before.swap(true, Ordering::SeqCst);
        info!("Connected {} (reconnected: {})", self.address, reconnected);
        self.emit(WalletEvent::Connected {
            address: self.address.clone(),
            reconnected,
        })
    }

    pub fn disconnect(&self) -> Result<()> {
        info!("Disconnected {}", self.address);
        self.emit(WalletEvent::Disconnected)
    }

    /// Produces an EIP-191 `personal_sign` signature without asking for approval.
    ///
    /// Returns 65 bytes: r (32) || s (32) || v (1), with v in {27, 28}.
    pub fn personal_sign(&self, message: &[u8]) -> Result<[u8; 65]> {
        let digest = personal_message_hash(message);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| SignerError::Wallet(format!("signing failed: {}", e)))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte() + 27;
        Ok(out)
    }

    fn emit(&self, event: WalletEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| SignerError::Wallet("session is no longer listening".to_string()))
    }

    async fn approve(&self, message: &str) -> Result<bool> {
        match self.approval {
            Approval::Auto => Ok(true),
            Approval::Prompt => {
                let mut slot = self.answers.lock().await;
                let answers = match &mut *slot {
                    Some(answers) => answers,
                    empty => empty.insert(spawn_stdin_reader()?),
                };
                // Lines typed after an abandoned prompt must not answer this one
                while answers.try_recv().is_ok() {}

                write_prompt(&format!(
                    "\nSignature request from {}\n\n{}\n\nSign this message? [y/N] ",
                    self.address, message
                ))?;

                // Dropping this future leaves no read outstanding
                match answers.recv().await {
                    Some(answer) => Ok(is_yes(&answer)),
                    None => Err(SignerError::Wallet(
                        "stdin closed before the signature request was answered".to_string(),
                    )),
                }
            }
        }
    }
}

impl WalletBridge for LocalWallet {
    async fn request_signature(&self, message: &str) -> Result<String> {
        if !self.approve(message).await? {
            debug!("User declined signature request");
            return Err(SignerError::SignatureRejected);
        }

        let signature = self.personal_sign(message.as_bytes())?;
        Ok(format!("0x{}", hex::encode(signature)))
    }
}

impl<T: WalletBridge> WalletBridge for std::sync::Arc<T> {
    async fn request_signature(&self, message: &str) -> Result<String> {
        (**self).request_signature(message).await
    }
}

/// keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Derives the EIP-55 checksummed Ethereum address of a secp256k1 key.
pub fn ethereum_address(signing_key: &SigningKey) -> String {
    let public_key = signing_key.verifying_key().to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag
    let hash = Keccak256::digest(&public_key.as_bytes()[1..]);
    to_checksum_address(&hex::encode(&hash[12..]))
}

/// Applies EIP-55 mixed-case checksumming to a 20-byte hex address.
pub fn to_checksum_address(address: &str) -> String {
    let lower = address
        .strip_prefix("0x")
        .unwrap_or(address)
        .to_lowercase();
    let hash = hex::encode(Keccak256::digest(lower.as_bytes()));

    let checksummed: String = lower
        .chars()
        .zip(hash.chars())
        .map(|(c, h)| {
            if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect();

    format!("0x{}", checksummed)
}

fn is_yes(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

fn write_prompt(prompt: &str) -> Result<()> {
    let mut stderr = std::io::stderr();
    stderr
        .write_all(prompt.as_bytes())
        .and_then(|_| stderr.flush())
        .map_err(|e| SignerError::Wallet(format!("failed to write prompt: {}", e)))
}

/// Forwards stdin lines from a detached thread, which never holds up runtime shutdown.
fn spawn_stdin_reader() -> Result<Answers> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("stdin-answers".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .map_err(|e| SignerError::Wallet(format!("failed to start prompt reader: {}", e)))?;
    Ok(rx)
}
