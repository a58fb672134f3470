//! Ed25519 signer keypair
//!
//! One keypair is generated per run. Only the public half leaves the process
//! (hex-encoded inside the signer authorization message).

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;

use crate::error::{Result, SignerError};

/// An EdDSA signer generated for a single session.
pub struct SignerKeypair {
    signing_key: SigningKey,
}

impl SignerKeypair {
    /// Generates a new keypair from the operating system RNG.
    ///
    /// # Returns
    ///
    /// * `Ok(SignerKeypair)` - Freshly generated keypair
    /// * `Err(SignerError::KeyGeneration)` - The RNG could not be read
    pub fn generate() -> Result<Self> {
        let mut rng = rand::rngs::OsRng;
        let mut secret_key_bytes = [0u8; 32];
        rng.try_fill_bytes(&mut secret_key_bytes)
            .map_err(|e| SignerError::KeyGeneration(e.to_string()))?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret_key_bytes),
        })
    }

    /// Rebuilds a keypair from a hex-encoded private key (with or without 0x prefix).
    pub fn from_private_key_hex(private_key_hex: &str) -> Result<Self> {
        let key_hex = private_key_hex
            .strip_prefix("0x")
            .unwrap_or(private_key_hex);
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| SignerError::KeyGeneration(format!("invalid private key hex: {}", e)))?;
        let key_array: [u8; 32] = key_bytes.as_slice().try_into().map_err(|_| {
            SignerError::KeyGeneration(format!(
                "invalid private key length: expected 32 bytes, got {}",
                key_bytes.len()
            ))
        })?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&key_array),
        })
    }

    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Lowercase hex of the private key. Only the debug report may print this.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.private_key_bytes())
    }

    /// Lowercase hex of the public key, as carried in `authorizedPublicKey`.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Signs a message (e.g. a cast) with the signer key.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verifies a signature produced by `sign`.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        let verifying_key: VerifyingKey = self.signing_key.verifying_key();
        verifying_key
            .verify(message, &Signature::from_bytes(signature))
            .is_ok()
    }
}

impl std::fmt::Debug for SignerKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerKeypair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}
