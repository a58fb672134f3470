//! Error definitions for the signer authorization flow.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the signer authorization flow.
///
/// Configuration and key generation errors are fatal at startup. Everything
/// else is caught at the session boundary and rendered as a `Failed` state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signer key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid Ethereum address: {0}")]
    InvalidAddress(String),

    #[error("Registry lookup failed: {0}")]
    Resolution(String),

    #[error("Registry lookup timed out after {0:?}")]
    ResolutionTimeout(Duration),

    #[error("fid conversion failed: {0}")]
    Conversion(String),

    #[error("Failed to serialize authorization message: {0}")]
    Serialization(String),

    #[error("Signature request rejected by wallet")]
    SignatureRejected,

    #[error("Signature request timed out after {0:?}")]
    SignatureTimeout(Duration),

    #[error("Wallet error: {0}")]
    Wallet(String),
}

pub type Result<T> = std::result::Result<T, SignerError>;
