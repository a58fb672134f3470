//! EVM Client Module
//!
//! This module provides a client for communicating with EVM-compatible blockchain nodes
//! via their JSON-RPC API. It covers the read-only calls the signer flow needs:
//! contract view calls and chain identification.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// API RESPONSE STRUCTURES
// ============================================================================

/// EVM JSON-RPC request wrapper
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<serde_json::Value>,
    id: u64,
}

/// EVM JSON-RPC response wrapper
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

// ============================================================================
// EVM CLIENT IMPLEMENTATION
// ============================================================================

/// Client for communicating with EVM-compatible blockchain nodes via JSON-RPC
#[derive(Debug, Clone)]
pub struct EvmClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL of the EVM node (e.g., "https://goerli.infura.io/v3/<key>")
    base_url: String,
    /// Scheme and host of `base_url`, used in messages so the credential path never reaches logs
    endpoint: String,
}

impl EvmClient {
    /// Creates a new EVM client for the given node URL
    ///
    /// # Arguments
    ///
    /// * `node_url` - Base URL of the EVM node
    ///
    /// # Returns
    ///
    /// * `Ok(EvmClient)` - Successfully created client
    /// * `Err(anyhow::Error)` - Failed to create client
    pub fn new(node_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: node_url.to_string(),
            endpoint: redact_url(node_url),
        })
    }

    /// Executes a read-only contract call using eth_call against the latest block
    ///
    /// # Arguments
    ///
    /// * `to` - Contract address
    /// * `data` - ABI-encoded calldata (0x-prefixed hex)
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Raw return data (0x-prefixed hex)
    /// * `Err(anyhow::Error)` - Failed to execute the call
    pub async fn eth_call(&self, to: &str, data: &str) -> Result<String> {
        let call = serde_json::json!({
            "to": to,
            "data": data,
        });

        let result: Option<String> = self
            .send("eth_call", vec![call, serde_json::json!("latest")])
            .await?;

        result.ok_or_else(|| anyhow::anyhow!("No result in eth_call response from {}", self.endpoint))
    }

    /// Gets the chain ID reported by the node
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Chain ID
    /// * `Err(anyhow::Error)` - Failed to query chain ID
    pub async fn get_chain_id(&self) -> Result<u64> {
        let chain_id_hex: String = self
            .send("eth_chainId", vec![])
            .await?
            .ok_or_else(|| anyhow::anyhow!("No result in eth_chainId response"))?;

        let chain_id = u64::from_str_radix(
            chain_id_hex.strip_prefix("0x").unwrap_or(&chain_id_hex),
            16,
        )
        .context("Failed to parse chain ID")?;

        Ok(chain_id)
    }

    /// Returns the redacted endpoint (scheme and host only)
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<Option<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to send {} request to {}", method, self.endpoint))?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to parse {} response from {}", method, self.endpoint))?;

        if let Some(error) = response.error {
            return Err(anyhow::anyhow!(
                "JSON-RPC error from {}: {} (code: {})",
                self.endpoint,
                error.message,
                error.code
            ));
        }

        Ok(response.result)
    }
}

/// Reduces a provider URL to `scheme://host[:port]`.
///
/// Infura-style URLs carry the API key in the path.
fn redact_url(node_url: &str) -> String {
    match url::Url::parse(node_url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}://{}:{}", parsed.scheme(), host, port),
            (Some(host), None) => format!("{}://{}", parsed.scheme(), host),
            _ => parsed.scheme().to_string(),
        },
        Err(_) => "<invalid url>".to_string(),
    }
}
