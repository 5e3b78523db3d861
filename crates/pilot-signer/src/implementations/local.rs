//! Private-key signer backend built on Alloy.
//!
//! Holds a key locally and signs legacy transactions assembled from the
//! request's to/data/value fields. Suitable for development and testing;
//! anything custodial belongs behind its own backend.

use alloy_consensus::TxLegacy;
use alloy_network::TxSigner;
use alloy_primitives::{Address as AlloyAddress, Bytes, TxKind, U256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use pilot_types::{
	parse_base_units, ConfigSchema, Field, FieldType, Schema, SignRequest, SignedTx,
	ValidationError,
};

use crate::{SignerBackend, SignerError};

/// Local wallet backend using Alloy's signer.
pub struct LocalSigner {
	/// The underlying Alloy signer that handles cryptographic operations.
	signer: PrivateKeySigner,
}

impl LocalSigner {
	/// Creates a new LocalSigner from a hex-encoded private key, with or
	/// without the 0x prefix.
	pub fn new(private_key_hex: &str) -> Result<Self, SignerError> {
		let signer = private_key_hex
			.parse::<PrivateKeySigner>()
			.map_err(|e| SignerError::InvalidConfig(format!("Invalid private key: {}", e)))?;

		Ok(Self { signer })
	}
}

/// Configuration schema for LocalSigner.
pub struct LocalSignerSchema;

impl ConfigSchema for LocalSignerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![
				Field::new("private_key", FieldType::String).with_validator(|value| {
					let key = value.as_str().unwrap_or_default();
					let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

					if key_without_prefix.len() != 64 {
						return Err("Private key must be 64 hex characters (32 bytes)".to_string());
					}

					if hex::decode(key_without_prefix).is_err() {
						return Err("Private key must be valid hexadecimal".to_string());
					}

					Ok(())
				}),
			],
			// Optional fields
			vec![],
		);

		let json = pilot_types::toml_to_json(config)?;
		schema.validate(&json)
	}
}

/// Chain ids for the chains the pilot names. Unknown chains sign without
/// replay protection.
fn chain_id_for(chain: &str) -> Option<u64> {
	match chain {
		"evm" => Some(1),
		"sepolia" => Some(11_155_111),
		"arbitrum" => Some(42_161),
		"polygon" => Some(137),
		_ => None,
	}
}

#[async_trait]
impl SignerBackend for LocalSigner {
	async fn address(&self) -> Result<String, SignerError> {
		Ok(format!("{:#x}", self.signer.address()))
	}

	async fn sign(&self, request: &SignRequest) -> Result<SignedTx, SignerError> {
		let to = request.to.parse::<AlloyAddress>().map_err(|e| {
			SignerError::SigningFailed(format!("invalid to address '{}': {}", request.to, e))
		})?;

		let value = match &request.value {
			Some(value) => parse_base_units(value)
				.ok_or_else(|| SignerError::SigningFailed(format!("invalid value '{}'", value)))?,
			None => U256::ZERO,
		};

		let stripped = request.data.strip_prefix("0x").unwrap_or(&request.data);
		let bytes = hex::decode(stripped)
			.map_err(|e| SignerError::SigningFailed(format!("invalid calldata: {}", e)))?;
		let input = Bytes::from(bytes);

		let mut legacy_tx = TxLegacy {
			chain_id: chain_id_for(&request.chain),
			nonce: 0,
			gas_price: 0,
			gas_limit: 0,
			to: TxKind::Call(to),
			value,
			input,
		};

		let signature = self
			.signer
			.sign_transaction(&mut legacy_tx)
			.await
			.map_err(|e| {
				SignerError::SigningFailed(format!("Failed to sign transaction: {}", e))
			})?;

		Ok(SignedTx {
			signed_tx: format!("0x{}", hex::encode(signature.as_bytes())),
		})
	}
}

/// Factory function to create a local signer backend from configuration.
pub fn create_backend(config: &toml::Value) -> Result<Box<dyn SignerBackend>, SignerError> {
	LocalSignerSchema
		.validate(config)
		.map_err(|e| SignerError::InvalidConfig(e.to_string()))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.ok_or_else(|| SignerError::InvalidConfig("private_key is required".to_string()))?;

	Ok(Box::new(LocalSigner::new(private_key)?))
}
