//! Configuration loading for the pilot service.
//!
//! A TOML file is read, `${VAR}` references are substituted from the
//! environment, the result is parsed into [`PilotConfig`] and validated.
//! Environment overrides with the `PILOT_` prefix win over the file.

use std::env;
use std::path::Path;
use thiserror::Error;

pub mod types;

pub use types::{
	PilotConfig, ResolverConfig, ServiceConfig, SignerConfig, TokenConfig, WalletConfig,
};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "PILOT_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<PilotConfig, ConfigError> {
		// Load base configuration from file
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		// Apply environment variable overrides
		self.apply_env_overrides(&mut config)?;

		// Validate configuration
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<PilotConfig, ConfigError> {
		let content = tokio::fs::read_to_string(file_path)
			.await
			.map_err(|e| match e.kind() {
				std::io::ErrorKind::NotFound => ConfigError::FileNotFound(file_path.to_string()),
				_ => ConfigError::IoError(e),
			})?;

		// Substitute environment variables
		let substituted_content = self.substitute_env_vars(&content)?;

		// Parse TOML
		let config: PilotConfig = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut PilotConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.service.log_level = log_level;
		}

		if let Ok(http_port) = env::var(format!("{}HTTP_PORT", self.env_prefix)) {
			config.service.port = http_port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid HTTP port: {}", e)))?;
		}

		Ok(())
	}

	fn validate_config(&self, config: &PilotConfig) -> Result<(), ConfigError> {
		if config.service.port == 0 {
			return Err(ConfigError::ValidationError(
				"Service port must be non-zero".to_string(),
			));
		}

		if !matches!(config.wallet.risk_level.as_str(), "low" | "medium" | "high") {
			return Err(ConfigError::ValidationError(format!(
				"Unknown risk level: {}",
				config.wallet.risk_level
			)));
		}

		if !is_address(&config.wallet.address) {
			return Err(ConfigError::ValidationError(format!(
				"Invalid wallet address: {}",
				config.wallet.address
			)));
		}

		if !is_address(&config.wallet.spender) {
			return Err(ConfigError::ValidationError(format!(
				"Invalid spender address: {}",
				config.wallet.spender
			)));
		}

		for (symbol, address) in &config.tokens.addresses {
			if !is_address(address) {
				return Err(ConfigError::ValidationError(format!(
					"Invalid address for token {}: {}",
					symbol, address
				)));
			}
		}

		if !matches!(config.signer.backend.as_str(), "stub" | "local") {
			return Err(ConfigError::ValidationError(format!(
				"Unknown signer backend: {}",
				config.signer.backend
			)));
		}

		if config.resolver.timeout_secs == 0 {
			return Err(ConfigError::ValidationError(
				"Resolver timeout must be non-zero".to_string(),
			));
		}

		Ok(())
	}
}

/// Checked shape of an EVM address: 0x followed by 40 hex digits.
fn is_address(value: &str) -> bool {
	value.len() == 42
		&& value.starts_with("0x")
		&& value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("pilot.toml");
		let mut file = std::fs::File::create(&path).unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		(dir, path)
	}

	#[tokio::test]
	async fn test_load_fills_missing_sections_with_defaults() {
		let (_dir, path) = write_config(
			r#"
[service]
name = "pilot-test"
port = 9000
"#,
		);

		let config = ConfigLoader::new().with_file(&path).load().await.unwrap();
		assert_eq!(config.service.name, "pilot-test");
		assert_eq!(config.service.port, 9000);
		assert_eq!(config.signer.backend, "stub");
		assert_eq!(config.wallet.risk_level, "low");
	}

	#[tokio::test]
	async fn test_missing_file_is_a_typed_error() {
		let error = ConfigLoader::new()
			.with_file("/nonexistent/pilot.toml")
			.load()
			.await
			.unwrap_err();
		assert!(matches!(error, ConfigError::FileNotFound(_)));
	}

	#[tokio::test]
	async fn test_env_vars_are_substituted() {
		env::set_var("PILOT_CONFIG_TEST_KEY", "sk-test-123");
		let (_dir, path) = write_config(
			r#"
[resolver]
api_key = "${PILOT_CONFIG_TEST_KEY}"
"#,
		);

		let config = ConfigLoader::new().with_file(&path).load().await.unwrap();
		assert_eq!(config.resolver.api_key.as_deref(), Some("sk-test-123"));
		assert!(config.resolver.model_enabled());
	}

	#[tokio::test]
	async fn test_missing_env_var_fails_the_load() {
		let (_dir, path) = write_config(
			r#"
[resolver]
api_key = "${PILOT_CONFIG_TEST_MISSING_VAR}"
"#,
		);

		let error = ConfigLoader::new().with_file(&path).load().await.unwrap_err();
		assert!(
			matches!(error, ConfigError::EnvVarNotFound(ref name) if name == "PILOT_CONFIG_TEST_MISSING_VAR")
		);
	}

	#[tokio::test]
	async fn test_log_level_env_override_wins() {
		env::set_var("PILOT_TEST_OVERRIDE_LOG_LEVEL", "debug");
		let (_dir, path) = write_config("[service]\nlog_level = \"info\"\n");

		let config = ConfigLoader::new()
			.with_file(&path)
			.with_env_prefix("PILOT_TEST_OVERRIDE_")
			.load()
			.await
			.unwrap();
		assert_eq!(config.service.log_level, "debug");
	}

	#[tokio::test]
	async fn test_unknown_risk_level_is_rejected() {
		let (_dir, path) = write_config("[wallet]\nrisk_level = \"yolo\"\n");
		let error = ConfigLoader::new().with_file(&path).load().await.unwrap_err();
		assert!(matches!(error, ConfigError::ValidationError(ref m) if m.contains("risk level")));
	}

	#[tokio::test]
	async fn test_malformed_wallet_address_is_rejected() {
		let (_dir, path) = write_config("[wallet]\naddress = \"0x123\"\n");
		let error = ConfigLoader::new().with_file(&path).load().await.unwrap_err();
		assert!(matches!(error, ConfigError::ValidationError(ref m) if m.contains("wallet address")));
	}

	#[tokio::test]
	async fn test_unknown_signer_backend_is_rejected() {
		let (_dir, path) = write_config("[signer]\nbackend = \"paper\"\n");
		let error = ConfigLoader::new().with_file(&path).load().await.unwrap_err();
		assert!(matches!(error, ConfigError::ValidationError(ref m) if m.contains("signer backend")));
	}

	#[tokio::test]
	async fn test_bad_token_override_is_rejected() {
		let (_dir, path) = write_config("[tokens.addresses]\nUSDC = \"not-an-address\"\n");
		let error = ConfigLoader::new().with_file(&path).load().await.unwrap_err();
		assert!(matches!(error, ConfigError::ValidationError(ref m) if m.contains("USDC")));
	}

	#[test]
	fn test_address_shape_check() {
		assert!(is_address("0x0000000000000000000000000000000000001001"));
		assert!(!is_address("0x123"));
		assert!(!is_address("0000000000000000000000000000000000001001aa"));
		assert!(!is_address("0xzz00000000000000000000000000000000001001"));
	}
}
