//! Configuration types for the pilot service.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete pilot configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PilotConfig {
	/// Service identity and HTTP settings
	#[serde(default)]
	pub service: ServiceConfig,
	/// Intent resolution settings
	#[serde(default)]
	pub resolver: ResolverConfig,
	/// Wallet identity and session policy
	#[serde(default)]
	pub wallet: WalletConfig,
	/// Token registry overrides
	#[serde(default)]
	pub tokens: TokenConfig,
	/// Signing backend selection
	#[serde(default)]
	pub signer: SignerConfig,
}

/// Service identity and HTTP settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
	/// Service name for logging
	pub name: String,
	/// HTTP bind address
	pub host: String,
	/// HTTP port
	pub port: u16,
	/// Log level when RUST_LOG is not set
	pub log_level: String,
}

/// Intent resolution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
	/// API key for the model stage; absent or empty disables it.
	/// Supports `${VAR}` substitution from the environment.
	pub api_key: Option<String>,
	/// Model identifier sent to the endpoint
	pub model: String,
	/// OpenAI-compatible endpoint base URL
	pub base_url: String,
	/// Request timeout in seconds
	pub timeout_secs: u64,
	/// Template file; the built-in send/swap set when absent
	pub template_file: Option<String>,
}

/// Wallet identity and session policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
	/// Wallet address plans read balances for
	pub address: String,
	/// Spender granted approvals and swaps
	pub spender: String,
	/// Consent scope lifetime in milliseconds
	pub session_ttl_ms: u64,
	/// Risk ceiling stamped into minted scopes: "low", "medium" or "high"
	pub risk_level: String,
}

/// Token registry overrides
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TokenConfig {
	/// symbol → contract address
	pub addresses: HashMap<String, String>,
	/// symbol → decimals
	pub decimals: HashMap<String, u8>,
}

/// Signing backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
	/// Backend name: "stub" or "local"
	pub backend: String,
	/// Backend-specific settings
	pub config: toml::Table,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self {
			name: "wallet-pilot".to_string(),
			host: "127.0.0.1".to_string(),
			port: 4000,
			log_level: "info".to_string(),
		}
	}
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self {
			api_key: None,
			model: "gpt-5.2".to_string(),
			base_url: "https://api.openai.com/v1".to_string(),
			timeout_secs: 10,
			template_file: None,
		}
	}
}

impl Default for WalletConfig {
	fn default() -> Self {
		Self {
			address: "0x0000000000000000000000000000000000001001".to_string(),
			spender: "0x0000000000000000000000000000000000002002".to_string(),
			session_ttl_ms: 60_000,
			risk_level: "low".to_string(),
		}
	}
}

impl Default for SignerConfig {
	fn default() -> Self {
		Self {
			backend: "stub".to_string(),
			config: toml::Table::new(),
		}
	}
}

impl ResolverConfig {
	/// Whether a usable model credential is configured.
	pub fn model_enabled(&self) -> bool {
		self.api_key
			.as_deref()
			.map(|key| !key.trim().is_empty())
			.unwrap_or(false)
	}
}
