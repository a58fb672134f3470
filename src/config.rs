//! Configuration
//!
//! Loaded from a TOML file and the environment. The blockchain provider
//! credential is mandatory; a missing credential fails at startup.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SignerError};
use crate::registry::normalize_address;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/farcaster-signer.toml";
/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "FARCASTER_SIGNER_CONFIG_PATH";
/// Environment variable carrying the provider API key
pub const API_KEY_ENV: &str = "INFURA_API_KEY";

/// Farcaster IdRegistry on Goerli
pub const DEFAULT_ID_REGISTRY_ADDRESS: &str = "0xda107a1caf36d198b12c16c7b6a1d1c795978c42";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub registry: RegistryConfig,
    pub session: SessionConfig,
    pub debug: DebugConfig,
}

/// Blockchain RPC provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Infura network name (e.g. "goerli")
    pub network: String,
    /// Provider API key; `INFURA_API_KEY` takes precedence
    pub api_key: String,
    /// Full RPC URL used verbatim instead of the Infura endpoint
    pub rpc_url: Option<String>,
    /// Expected chain ID; checked against eth_chainId at startup when set
    pub chain_id: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            network: "goerli".to_string(),
            api_key: String::new(),
            rpc_url: None,
            chain_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub id_registry_address: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id_registry_address: DEFAULT_ID_REGISTRY_ADDRESS.to_string(),
        }
    }
}

/// Bounds on the two external calls of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub resolve_timeout_ms: u64,
    pub signature_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: 15_000,
            signature_timeout_ms: 120_000,
        }
    }
}

impl SessionConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn signature_timeout(&self) -> Duration {
        Duration::from_millis(self.signature_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log the generated EdDSA private key after a successful signature.
    /// Local demos only.
    pub log_private_key: bool,
}

impl Config {
    /// Loads configuration from the default location.
    ///
    /// Uses `FARCASTER_SIGNER_CONFIG_PATH` if set, otherwise `config/farcaster-signer.toml`.
    /// A missing default file yields the built-in defaults; environment
    /// overrides are applied and the result is validated.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from_path(path.as_deref())
    }

    /// Loads configuration from `path`, or the default location when `None`.
    pub fn load_from_path(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(Path::new(path))?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SignerError::Config(format!(
                "Failed to read config file at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SignerError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Applies environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty()) {
            self.provider.api_key = api_key;
        }
    }

    /// Checks the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_key.trim().is_empty() {
            return Err(SignerError::Config(format!(
                "Missing blockchain provider API key: set {} or provider.api_key",
                API_KEY_ENV
            )));
        }

        match &self.provider.rpc_url {
            Some(rpc_url) => {
                url::Url::parse(rpc_url).map_err(|e| {
                    SignerError::Config(format!("Invalid provider.rpc_url '{}': {}", rpc_url, e))
                })?;
            }
            None => {
                if self.provider.network.trim().is_empty() {
                    return Err(SignerError::Config(
                        "provider.network must not be empty".to_string(),
                    ));
                }
            }
        }

        normalize_address(&self.registry.id_registry_address).map_err(|e| {
            SignerError::Config(format!("Invalid registry.id_registry_address: {}", e))
        })?;

        if self.session.resolve_timeout_ms == 0 {
            return Err(SignerError::Config(
                "session.resolve_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.session.signature_timeout_ms == 0 {
            return Err(SignerError::Config(
                "session.signature_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// JSON-RPC endpoint: `provider.rpc_url` if set, otherwise the Infura URL for the network.
    pub fn rpc_url(&self) -> String {
        match &self.provider.rpc_url {
            Some(rpc_url) => rpc_url.clone(),
            None => format!(
                "https://{}.infura.io/v3/{}",
                self.provider.network, self.provider.api_key
            ),
        }
    }
}
