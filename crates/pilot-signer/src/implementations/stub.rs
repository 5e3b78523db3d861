//! Deterministic placeholder signer for stub pipelines and tests.

use alloy_primitives::keccak256;
use async_trait::async_trait;
use pilot_types::{SignRequest, SignedTx};

use crate::{SignerBackend, SignerError};

/// Signs nothing real: the artifact is the keccak hash of the request,
/// hex-encoded. Deterministic per request, so downstream threading stays
/// testable, and distinct requests produce distinct artifacts.
pub struct StubSigner;

impl StubSigner {
	pub fn new() -> Self {
		Self
	}
}

impl Default for StubSigner {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl SignerBackend for StubSigner {
	async fn address(&self) -> Result<String, SignerError> {
		Ok("0x0000000000000000000000000000000000001001".to_string())
	}

	async fn sign(&self, request: &SignRequest) -> Result<SignedTx, SignerError> {
		let payload = serde_json::to_vec(request)
			.map_err(|e| SignerError::SigningFailed(format!("unencodable request: {}", e)))?;
		let digest = keccak256(&payload);
		Ok(SignedTx {
			signed_tx: format!("0x{}", hex::encode(digest)),
		})
	}
}
