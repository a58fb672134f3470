//! Unit tests for the local wallet bridge
//!
//! These tests verify Ethereum address derivation, EIP-191 signatures, and
//! connection events.

use farcaster_signer::error::SignerError;
use farcaster_signer::wallet::{
    personal_message_hash, to_checksum_address, Approval, LocalWallet, WalletBridge, WalletEvent,
};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use std::time::Duration;
use tokio::sync::mpsc;

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{DUMMY_WALLET_ADDR, DUMMY_WALLET_KEY};

/// 1. Test: Ethereum Address Derivation
/// Verifies that private key 1 derives the well-known address 0x7E5F...5Bdf.
/// Why: The fid lookup is keyed on this address.
#[test]
fn test_ethereum_address_derivation() {
    let (wallet, _events) = LocalWallet::from_private_key_hex(DUMMY_WALLET_KEY, Approval::Auto).unwrap();
    assert_eq!(wallet.address(), DUMMY_WALLET_ADDR);
}

/// 2. Test: EIP-55 Checksum
/// Verifies the reference vector from EIP-55.
/// Why: Wallets present checksummed addresses.
#[test]
fn test_checksum_address() {
    assert_eq!(
        to_checksum_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
    );
    assert_eq!(
        to_checksum_address("5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"),
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
    );
}

/// 3. Test: personal_sign Message Hash
/// Verifies the EIP-191 digest of "hello".
/// Why: Wallet signatures must be verifiable by standard Ethereum tooling.
#[test]
fn test_personal_message_hash() {
    assert_eq!(
        hex::encode(personal_message_hash(b"hello")),
        "50b2c43fd39106bafbba0da34fc430e1f91e3c96ea2acee2bc34119f92b37750"
    );
}

/// 4. Test: Signature Format And Recovery
/// Verifies the 65-byte r || s || v layout and that the signer recovers to the wallet key.
/// Why: ecrecover over the payload must yield the connected account.
#[test]
fn test_personal_sign_recovers_wallet_key() {
    let (wallet, _events) = LocalWallet::from_private_key_hex(DUMMY_WALLET_KEY, Approval::Auto).unwrap();
    let message = br#"{"fid":42,"active":true}"#;

    let signature = wallet.personal_sign(message).unwrap();

    let v = signature[64];
    assert!(v == 27 || v == 28, "Recovery ID v must be 27 or 28, got {}", v);

    let sig = Signature::from_slice(&signature[..64]).unwrap();
    let recovery_id = RecoveryId::from_byte(v - 27).unwrap();
    let recovered =
        VerifyingKey::recover_from_prehash(&personal_message_hash(message), &sig, recovery_id)
            .unwrap();

    let expected_key =
        k256::ecdsa::SigningKey::from_slice(&hex::decode(&DUMMY_WALLET_KEY[2..]).unwrap()).unwrap();
    assert_eq!(&recovered, expected_key.verifying_key());
}

/// 5. Test: Auto-Approved Signature Request
/// Verifies that request_signature returns 0x-prefixed hex of 65 bytes.
/// Why: The session logs this string as the wallet signature.
#[tokio::test]
async fn test_request_signature_auto_approve() {
    let (wallet, _events) = LocalWallet::from_private_key_hex(DUMMY_WALLET_KEY, Approval::Auto).unwrap();

    let signature = wallet.request_signature("payload").await.unwrap();

    assert!(signature.starts_with("0x"));
    assert_eq!(signature.len(), 2 + 130);
    assert_eq!(signature, format!("0x{}", hex::encode(wallet.personal_sign(b"payload").unwrap())));
}

/// 6. Test: Connection Events
/// Verifies that connect emits Connected (reconnected only the second time) and disconnect emits Disconnected.
/// Why: The session reacts only to these events.
#[tokio::test]
async fn test_connection_events() {
    let (wallet, mut events) = LocalWallet::from_private_key_hex(DUMMY_WALLET_KEY, Approval::Auto).unwrap();

    wallet.connect().unwrap();
    wallet.disconnect().unwrap();
    wallet.connect().unwrap();

    assert_eq!(
        events.recv().await,
        Some(WalletEvent::Connected {
            address: DUMMY_WALLET_ADDR.to_string(),
            reconnected: false,
        })
    );
    assert_eq!(events.recv().await, Some(WalletEvent::Disconnected));
    assert_eq!(
        events.recv().await,
        Some(WalletEvent::Connected {
            address: DUMMY_WALLET_ADDR.to_string(),
            reconnected: true,
        })
    );
}

/// 7. Test: Connect Without A Listener
/// Verifies that connect fails once the event receiver is gone.
/// Why: A torn-down session must not silently swallow connection attempts.
#[test]
fn test_connect_without_listener() {
    let (wallet, events) = LocalWallet::from_private_key_hex(DUMMY_WALLET_KEY, Approval::Auto).unwrap();
    drop(events);

    assert!(matches!(wallet.connect(), Err(SignerError::Wallet(_))));
}

/// 8. Test: Invalid Wallet Keys
/// Verifies that malformed, short and out-of-range keys are rejected.
/// Why: A zero scalar is not a valid secp256k1 private key.
#[test]
fn test_invalid_wallet_keys() {
    assert!(LocalWallet::from_private_key_hex("zz", Approval::Auto).is_err());
    assert!(LocalWallet::from_private_key_hex("0x01", Approval::Auto).is_err());
    assert!(LocalWallet::from_private_key_hex(&"0".repeat(64), Approval::Auto).is_err());
}

/// 9. Test: Prompt Answers
/// Verifies that "y" approves, anything else rejects, and a closed answer stream is a wallet error.
/// Why: Only an explicit yes may produce a signature.
#[tokio::test]
async fn test_prompt_answers() {
    let (answers_tx, answers) = mpsc::unbounded_channel();
    let (wallet, _events) = LocalWallet::from_private_key_hex(DUMMY_WALLET_KEY, Approval::Prompt).unwrap();
    let wallet = wallet.with_answers(answers);

    let answer = |text: &'static str| {
        let answers_tx = answers_tx.clone();
        async move {
            // Answer once the prompt is waiting
            tokio::task::yield_now().await;
            answers_tx.send(text.to_string()).unwrap();
        }
    };

    let (approved, _) = tokio::join!(wallet.request_signature("payload"), answer(" Y "));
    assert!(approved.unwrap().starts_with("0x"));

    let (declined, _) = tokio::join!(wallet.request_signature("payload"), answer("no"));
    assert!(matches!(declined, Err(SignerError::SignatureRejected)));

    drop(answers_tx);
    assert!(matches!(
        wallet.request_signature("payload").await,
        Err(SignerError::Wallet(_))
    ));
}

/// 10. Test: Stale Answers Are Discarded
/// Verifies that a line typed before the prompt does not approve it.
/// Why: An answer meant for an abandoned prompt must not sign the next message.
#[tokio::test(start_paused = true)]
async fn test_prompt_discards_stale_answers() {
    let (answers_tx, answers) = mpsc::unbounded_channel();
    let (wallet, _events) = LocalWallet::from_private_key_hex(DUMMY_WALLET_KEY, Approval::Prompt).unwrap();
    let wallet = wallet.with_answers(answers);

    answers_tx.send("y".to_string()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), wallet.request_signature("payload")).await;

    assert!(result.is_err(), "stale answer must not approve the request");
}

/// 11. Test: Timed-Out Prompt Does Not Block Shutdown
/// Verifies that after a prompt times out the runtime shuts down without waiting for input.
/// Why: A signature timeout must end the process instead of hanging on the terminal.
#[test]
fn test_prompt_timeout_does_not_block_shutdown() {
    for use_stdin in [false, true] {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let (wallet, _events) =
            LocalWallet::from_private_key_hex(DUMMY_WALLET_KEY, Approval::Prompt).unwrap();
        let (_answers_tx, answers) = mpsc::unbounded_channel();
        let wallet = if use_stdin { wallet } else { wallet.with_answers(answers) };

        let result = runtime.block_on(async {
            tokio::time::timeout(Duration::from_millis(200), wallet.request_signature("payload"))
                .await
        });
        // Reading the test's own stdin may end early at EOF; either way nothing is signed
        assert!(!matches!(result, Ok(Ok(_))), "unanswered prompt must not sign");

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            drop(runtime);
            done_tx.send(()).ok();
        });
        assert!(
            done_rx.recv_timeout(Duration::from_secs(3)).is_ok(),
            "runtime shutdown blocked on the prompt (stdin: {})",
            use_stdin
        );
    }
}
