//! Farcaster ID resolution
//!
//! Looks up the fid owned by an Ethereum address through the IdRegistry
//! contract (`idOf(address) returns (uint256)`).

use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::error::{Result, SignerError};
use crate::evm_client::EvmClient;

/// Largest fid the resolver hands out: 2^53 - 1.
///
/// The fid ends up as a JSON number in the authorization message, and JSON
/// consumers treat numbers as IEEE doubles. Registry values above this bound
/// fail with `SignerError::Conversion` instead of losing precision.
pub const MAX_FID: u64 = (1 << 53) - 1;

/// Resolves the fid currently owned by an address.
///
/// Returns `Ok(0)` when the address owns no fid.
#[allow(async_fn_in_trait)]
pub trait FidResolver {
    async fn resolve_fid(&self, address: &str) -> Result<u64>;
}

/// `FidResolver` backed by the on-chain IdRegistry.
#[derive(Debug, Clone)]
pub struct IdRegistryClient {
    client: EvmClient,
    registry_addr: String,
}

impl IdRegistryClient {
    /// Creates a resolver for the IdRegistry deployed at `registry_addr`.
    pub fn new(client: EvmClient, registry_addr: &str) -> Result<Self> {
        let registry_addr = normalize_address(registry_addr)?;
        Ok(Self {
            client,
            registry_addr,
        })
    }

    pub fn registry_addr(&self) -> &str {
        &self.registry_addr
    }
}

impl FidResolver for IdRegistryClient {
    async fn resolve_fid(&self, address: &str) -> Result<u64> {
        let data = id_of_calldata(address)?;

        let raw = self
            .client
            .eth_call(&self.registry_addr, &data)
            .await
            .map_err(|e| SignerError::Resolution(format!("{:#}", e)))?;

        let fid = decode_fid(&raw)?;
        debug!("Resolved fid {} for {}", fid, address);
        Ok(fid)
    }
}

/// Validates an Ethereum address and returns it lowercased with a 0x prefix.
pub fn normalize_address(address: &str) -> Result<String> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| SignerError::InvalidAddress(format!("missing 0x prefix: {}", address)))?;

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SignerError::InvalidAddress(format!(
            "expected 20-byte hex address, got {}",
            address
        )));
    }

    Ok(format!("0x{}", hex_part.to_lowercase()))
}

/// 4-byte function selector: first bytes of keccak256 of the signature
pub fn function_selector(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    let hash = hasher.finalize();
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encodes `idOf(address)`: selector followed by the address left-padded to 32 bytes.
pub fn id_of_calldata(address: &str) -> Result<String> {
    let address = normalize_address(address)?;
    let selector = function_selector("idOf(address)");
    Ok(format!(
        "0x{}{:0>64}",
        hex::encode(selector),
        &address[2..]
    ))
}

/// Decodes a single `uint256` return word into an fid.
///
/// The upper 24 bytes must be zero and the value must not exceed `MAX_FID`.
pub fn decode_fid(raw: &str) -> Result<u64> {
    let hex_part = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(hex_part)
        .map_err(|e| SignerError::Resolution(format!("invalid return data {}: {}", raw, e)))?;

    // Empty return data means there is no contract at the registry address
    if bytes.len() != 32 {
        return Err(SignerError::Resolution(format!(
            "expected 32-byte uint256 return word, got {} bytes",
            bytes.len()
        )));
    }

    if bytes[..24].iter().any(|&b| b != 0) {
        return Err(SignerError::Conversion(format!(
            "registry value 0x{} does not fit in 64 bits",
            hex_part
        )));
    }

    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[24..]);
    let value = u64::from_be_bytes(low);

    if value > MAX_FID {
        return Err(SignerError::Conversion(format!(
            "registry value {} exceeds the maximum fid {}",
            value, MAX_FID
        )));
    }

    Ok(value)
}
