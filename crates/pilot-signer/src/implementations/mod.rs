//! Signer backend implementations.
//!
//! Backends are selected by the `backend` key of the signer config table:
//! `stub` for the deterministic placeholder signer, `local` for a real
//! private-key signer.

pub mod local;
pub mod stub;

use crate::{SignerBackend, SignerError};

/// Factory function to create a signer backend from configuration.
pub fn create_backend(config: &toml::Value) -> Result<Box<dyn SignerBackend>, SignerError> {
	let backend = config
		.get("backend")
		.and_then(|v| v.as_str())
		.unwrap_or("stub");

	match backend {
		"stub" => Ok(Box::new(stub::StubSigner::new())),
		"local" => local::create_backend(config),
		other => Err(SignerError::InvalidConfig(format!(
			"unknown signer backend '{}'",
			other
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_to_stub_backend() {
		let config: toml::Value = toml::from_str("").unwrap();
		assert!(create_backend(&config).is_ok());
	}

	#[test]
	fn test_unknown_backend_is_rejected() {
		let config: toml::Value = toml::from_str("backend = \"hsm\"").unwrap();
		assert!(matches!(
			create_backend(&config),
			Err(SignerError::InvalidConfig(_))
		));
	}
}
