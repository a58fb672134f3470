//! Signer authorization message
//!
//! The message asserts that an EdDSA public key may act on behalf of an fid.
//! See <https://github.com/farcasterxyz/protocol#45-signer-authorizations>.

use serde::{Deserialize, Serialize};

/// Schema identifier carried in every signer authorization message.
pub const SIGNER_SCHEMA: &str = "farcaster.xyz/schemas/v1/signer";

/// Signer authorization payload.
///
/// Field declaration order is the serialization order: fid, active,
/// authorizedPublicKey, schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerAuthorization {
    /// Farcaster ID of the connected account (0 = address has no fid)
    pub fid: u64,
    /// Always true for a freshly composed authorization
    pub active: bool,
    /// Lowercase hex of the ed25519 public key, no 0x prefix
    #[serde(rename = "authorizedPublicKey")]
    pub authorized_public_key: String,
    /// Always `SIGNER_SCHEMA`
    pub schema: String,
}

impl SignerAuthorization {
    /// Composes an authorization for `fid` and the given public key.
    pub fn new(fid: u64, public_key_hex: &str) -> Self {
        let key = public_key_hex.strip_prefix("0x").unwrap_or(public_key_hex);
        Self {
            fid,
            active: true,
            authorized_public_key: key.to_lowercase(),
            schema: SIGNER_SCHEMA.to_string(),
        }
    }

    /// Serializes the message into the text the wallet signs.
    pub fn to_signing_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A composed message together with the wallet's signature over its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedAuthorization {
    pub message: SignerAuthorization,
    pub signature: String,
}
