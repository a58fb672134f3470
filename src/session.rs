//! Signer authorization session
//!
//! Reacts to wallet connection events and drives one authorization flow per
//! connection: resolve fid, compose the message, request the wallet signature.
//!
//! State transitions:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Resolving -> Composed -> AwaitingSignature -> Signed
//!                                              |                            |
//!                                              +------------> Failed <------+
//! ```
//!
//! A new wallet event arriving while a flow is in flight abandons that flow.
//! The abandoned future is dropped, so it never touches session state again.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{Config, SessionConfig};
use crate::error::{Result, SignerError};
use crate::keypair::SignerKeypair;
use crate::message::{SignedAuthorization, SignerAuthorization};
use crate::registry::FidResolver;
use crate::wallet::{WalletBridge, WalletEvent, WalletEvents};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected { address: String },
    Resolving { address: String },
    Composed { message: SignerAuthorization },
    AwaitingSignature { message: SignerAuthorization },
    Signed(SignedAuthorization),
    Failed { reason: String },
}

impl SessionState {
    /// True once a flow has ended, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, SessionState::Signed(_) | SessionState::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected { .. } => "connected",
            SessionState::Resolving { .. } => "resolving",
            SessionState::Composed { .. } => "composed",
            SessionState::AwaitingSignature { .. } => "awaiting_signature",
            SessionState::Signed(_) => "signed",
            SessionState::Failed { .. } => "failed",
        }
    }
}

/// One page session: a signer keypair plus the collaborators it talks to.
pub struct Session<R, W> {
    keypair: SignerKeypair,
    resolver: R,
    wallet: W,
    timeouts: SessionConfig,
    log_private_key: bool,
    state: watch::Sender<SessionState>,
    /// Incremented for every connect event; identifies a flow
    generation: AtomicU64,
    /// Generation whose success report has been emitted
    last_reported: AtomicU64,
    reports: AtomicUsize,
}

impl<R: FidResolver, W: WalletBridge> Session<R, W> {
    pub fn new(config: &Config, keypair: SignerKeypair, resolver: R, wallet: W) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            keypair,
            resolver,
            wallet,
            timeouts: config.session.clone(),
            log_private_key: config.debug.log_private_key,
            state,
            generation: AtomicU64::new(0),
            last_reported: AtomicU64::new(0),
            reports: AtomicUsize::new(0),
        }
    }

    pub fn keypair(&self) -> &SignerKeypair {
        &self.keypair
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Number of success reports emitted so far
    pub fn reports_emitted(&self) -> usize {
        self.reports.load(Ordering::SeqCst)
    }

    /// Records that the user asked the wallet to connect.
    pub fn mark_connecting(&self) {
        self.set_state(SessionState::Connecting);
    }

    /// Processes wallet events until the event stream closes.
    pub async fn run(&self, events: &mut WalletEvents) {
        let mut next = events.recv().await;

        while let Some(event) = next {
            next = match event {
                WalletEvent::Disconnected => {
                    self.set_state(SessionState::Disconnected);
                    events.recv().await
                }
                WalletEvent::Connected {
                    address,
                    reconnected,
                } => {
                    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(
                        "Wallet connected: {} (reconnected: {}, flow: {})",
                        address, reconnected, generation
                    );
                    self.set_state(SessionState::Connected {
                        address: address.clone(),
                    });

                    let interrupted = tokio::select! {
                        outcome = self.authorize(&address) => {
                            self.finish(generation, outcome);
                            None
                        }
                        event = events.recv() => Some(event),
                    };

                    match interrupted {
                        None => events.recv().await,
                        Some(event) => {
                            warn!("Abandoning authorization flow {} for {}", generation, address);
                            event
                        }
                    }
                }
            };
        }

        debug!("Wallet event stream closed");
    }

    /// Runs resolve -> compose -> sign for `address`.
    ///
    /// Every external call is bounded by its configured timeout.
    pub async fn authorize(&self, address: &str) -> Result<SignedAuthorization> {
        self.set_state(SessionState::Resolving {
            address: address.to_string(),
        });

        let resolve_timeout = self.timeouts.resolve_timeout();
        let fid = timeout(resolve_timeout, self.resolver.resolve_fid(address))
            .await
            .map_err(|_| SignerError::ResolutionTimeout(resolve_timeout))??;

        let message = SignerAuthorization::new(fid, &self.keypair.public_key_hex());
        let payload = message
            .to_signing_payload()
            .map_err(|e| SignerError::Serialization(e.to_string()))?;
        self.set_state(SessionState::Composed {
            message: message.clone(),
        });

        self.set_state(SessionState::AwaitingSignature {
            message: message.clone(),
        });
        let signature_timeout = self.timeouts.signature_timeout();
        let signature = timeout(signature_timeout, self.wallet.request_signature(&payload))
            .await
            .map_err(|_| SignerError::SignatureTimeout(signature_timeout))??;

        Ok(SignedAuthorization { message, signature })
    }

    fn finish(&self, generation: u64, outcome: Result<SignedAuthorization>) {
        match outcome {
            Ok(signed) => {
                self.report(generation, &signed);
                self.set_state(SessionState::Signed(signed));
            }
            Err(e) => {
                warn!("Authorization flow {} failed: {}", generation, e);
                self.set_state(SessionState::Failed {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Emits the developer report for a signed authorization, at most once per flow.
    fn report(&self, generation: u64, signed: &SignedAuthorization) {
        if self.last_reported.swap(generation, Ordering::SeqCst) == generation {
            return;
        }
        self.reports.fetch_add(1, Ordering::SeqCst);

        info!(
            fid = signed.message.fid,
            active = signed.message.active,
            authorized_public_key = %signed.message.authorized_public_key,
            schema = %signed.message.schema,
            signature = %signed.signature,
            "Signer authorization signed"
        );
        if self.log_private_key {
            warn!(
                "DONTUSE_DEMO_EdDSA_PRIVATE_KEY: {}",
                self.keypair.private_key_hex()
            );
        }
        info!("Note: fid value 0 means address has no fid.");
    }

    fn set_state(&self, state: SessionState) {
        debug!("Session state -> {}", state.name());
        self.state.send_replace(state);
    }
}
