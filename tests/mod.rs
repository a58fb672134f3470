//! Shared test helpers
//!
//! Dummy addresses, a test configuration, and in-memory registry and wallet
//! doubles for driving the session without a network.

#![allow(dead_code)]

use farcaster_signer::config::{Config, ProviderConfig, SessionConfig};
use farcaster_signer::error::{Result, SignerError};
use farcaster_signer::registry::FidResolver;
use farcaster_signer::session::SessionState;
use farcaster_signer::wallet::WalletBridge;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Address of the secp256k1 key 0x...01
pub const DUMMY_WALLET_ADDR: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
pub const DUMMY_WALLET_KEY: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000001";
pub const DUMMY_UNREGISTERED_ADDR: &str = "0x000000000000000000000000000000000000dEaD";
pub const DUMMY_SECOND_ADDR: &str = "0x1111111111111111111111111111111111111111";
pub const DUMMY_REGISTRY_ADDR: &str = "0xda107a1caf36d198b12c16c7b6a1d1c795978c42";
pub const DUMMY_API_KEY: &str = "test-api-key";
pub const DUMMY_SIGNATURE: &str = "0x1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b";

// ============================================================================
// CONFIG
// ============================================================================

/// Valid configuration pointing at a local RPC URL with short timeouts.
pub fn build_test_config() -> Config {
    Config {
        provider: ProviderConfig {
            api_key: DUMMY_API_KEY.to_string(),
            rpc_url: Some("http://127.0.0.1:18545".to_string()),
            ..ProviderConfig::default()
        },
        session: SessionConfig {
            resolve_timeout_ms: 1_000,
            signature_timeout_ms: 1_000,
        },
        ..Config::default()
    }
}

// ============================================================================
// REGISTRY DOUBLES
// ============================================================================

/// Resolver backed by a fixed address -> fid table. Unknown addresses resolve to 0.
pub struct StaticRegistry {
    fids: HashMap<String, u64>,
}

impl StaticRegistry {
    pub fn new(entries: &[(&str, u64)]) -> Self {
        Self {
            fids: entries
                .iter()
                .map(|(addr, fid)| (addr.to_lowercase(), *fid))
                .collect(),
        }
    }
}

impl FidResolver for StaticRegistry {
    async fn resolve_fid(&self, address: &str) -> Result<u64> {
        Ok(self.fids.get(&address.to_lowercase()).copied().unwrap_or(0))
    }
}

/// Resolver that fails each lookup once `gate` is notified.
pub struct GatedFailingRegistry {
    pub gate: Arc<Notify>,
}

impl FidResolver for GatedFailingRegistry {
    async fn resolve_fid(&self, _address: &str) -> Result<u64> {
        self.gate.notified().await;
        Err(SignerError::Resolution("connection refused".to_string()))
    }
}

/// Resolver whose lookups never complete.
pub struct HangingRegistry;

impl FidResolver for HangingRegistry {
    async fn resolve_fid(&self, _address: &str) -> Result<u64> {
        std::future::pending().await
    }
}

// ============================================================================
// WALLET DOUBLES
// ============================================================================

/// How a `MockWallet` answers the n-th signature request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletBehavior {
    Approve,
    Reject,
    Hang,
}

/// Wallet double that records every message it is asked to sign.
pub struct MockWallet {
    behaviors: Vec<WalletBehavior>,
    requests: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockWallet {
    pub fn new(behavior: WalletBehavior) -> Self {
        Self::with_sequence(vec![behavior])
    }

    /// Answers request n with `behaviors[n]`, repeating the last entry.
    pub fn with_sequence(behaviors: Vec<WalletBehavior>) -> Self {
        Self {
            behaviors,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl WalletBridge for MockWallet {
    async fn request_signature(&self, message: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(message.to_string());

        let behavior = self
            .behaviors
            .get(call)
            .or_else(|| self.behaviors.last())
            .copied()
            .unwrap_or(WalletBehavior::Approve);

        match behavior {
            WalletBehavior::Approve => Ok(DUMMY_SIGNATURE.to_string()),
            WalletBehavior::Reject => Err(SignerError::SignatureRejected),
            WalletBehavior::Hang => std::future::pending().await,
        }
    }
}

// ============================================================================
// STATE HELPERS
// ============================================================================

/// Waits until the session state satisfies `predicate` and returns it.
pub async fn wait_for_state<F>(rx: &mut watch::Receiver<SessionState>, predicate: F) -> SessionState
where
    F: Fn(&SessionState) -> bool,
{
    loop {
        let state = rx.borrow_and_update().clone();
        if predicate(&state) {
            return state;
        }
        rx.changed().await.expect("session dropped its state channel");
    }
}

/// Waits until the session reaches `Signed` or `Failed`.
pub async fn wait_for_settled(rx: &mut watch::Receiver<SessionState>) -> SessionState {
    wait_for_state(rx, SessionState::is_settled).await
}

