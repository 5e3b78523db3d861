//! Policy signing module for the wallet pilot.
//!
//! The signer is the trust boundary of the pipeline: key material lives
//! behind the [`SignerBackend`] trait, and nothing gets signed unless the
//! request passes every check of the caller-supplied [`ConsentScope`].
//! The scope instance handed over at construction is the entire policy;
//! the signer consults no ambient or global configuration.

pub mod audit;
pub mod implementations;

use async_trait::async_trait;
use pilot_types::{parse_base_units, ConsentScope, ErrorKind, SignRequest, SignedTx};
use thiserror::Error;
use tracing::{debug, warn};

use crate::audit::{AuditEntry, AuditLog};

/// Errors that can occur during signing.
#[derive(Debug, Error)]
pub enum SignerError {
	/// The consent scope refused the request.
	#[error("Denied by consent scope: {kind}: {reason}")]
	Denied { kind: ErrorKind, reason: String },
	/// An amount (request or scope ceiling) is not a base-10 integer
	/// string. The signer fails closed rather than skip the ceiling check.
	#[error("Invalid amount '{0}' in sign request")]
	InvalidAmount(String),
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid signer configuration: {0}")]
	InvalidConfig(String),
}

impl SignerError {
	/// The policy kind behind a denial, if this is one.
	pub fn denied_kind(&self) -> Option<ErrorKind> {
		match self {
			Self::Denied { kind, .. } => Some(*kind),
			_ => None,
		}
	}
}

/// Trait defining how signed artifacts are produced once policy passes.
///
/// Implementations hold the actual key material (or stand in for it).
#[async_trait]
pub trait SignerBackend: Send + Sync {
	/// The address this backend signs as, hex-encoded.
	async fn address(&self) -> Result<String, SignerError>;
	/// Produces the signed artifact for an already-authorized request.
	async fn sign(&self, request: &SignRequest) -> Result<SignedTx, SignerError>;
}

/// The consent-scoped signer.
///
/// Checks run in a fixed order and the first failure wins: chain, expiry,
/// spender, token, amount. Every attempt is recorded in the audit log,
/// granted or not.
pub struct PolicySigner {
	scope: ConsentScope,
	backend: Box<dyn SignerBackend>,
	audit: AuditLog,
}

impl PolicySigner {
	pub fn new(scope: ConsentScope, backend: Box<dyn SignerBackend>) -> Self {
		Self {
			scope,
			backend,
			audit: AuditLog::new(),
		}
	}

	pub fn scope(&self) -> &ConsentScope {
		&self.scope
	}

	pub fn audit(&self) -> &AuditLog {
		&self.audit
	}

	/// Signs a request if the consent scope allows it.
	pub async fn sign(&self, request: &SignRequest) -> Result<SignedTx, SignerError> {
		let now_ms = chrono::Utc::now().timestamp_millis();
		if let Err(error) = self.check_scope(request, now_ms) {
			let code = match &error {
				SignerError::Denied { kind, .. } => kind.code().to_string(),
				other => other.to_string(),
			};
			warn!(chain = %request.chain, code = %code, "sign request denied");
			self.audit.record(AuditEntry::denied(now_ms, request, code));
			return Err(error);
		}

		let signed = self.backend.sign(request).await?;
		debug!(chain = %request.chain, "sign request granted");
		self.audit.record(AuditEntry::granted(now_ms, request));
		Ok(signed)
	}

	/// The address the underlying backend signs as.
	pub async fn address(&self) -> Result<String, SignerError> {
		self.backend.address().await
	}

	fn check_scope(&self, request: &SignRequest, now_ms: i64) -> Result<(), SignerError> {
		let scope = &self.scope;

		if request.chain != scope.chain {
			return Err(denied(
				ErrorKind::ChainNotAllowed,
				format!("scope is limited to chain '{}'", scope.chain),
			));
		}

		if scope.is_expired(now_ms) {
			return Err(denied(
				ErrorKind::ConsentExpired,
				format!("scope expired at {}", scope.expiry),
			));
		}

		if let Some(spender) = &request.spender {
			if !scope.allows_spender(spender) {
				return Err(denied(
					ErrorKind::SpenderNotAllowed,
					format!("spender '{}' is not allowlisted", spender),
				));
			}
		}

		if let Some(token) = &request.token {
			if !scope.allows_token(token) {
				return Err(denied(
					ErrorKind::TokenNotAllowed,
					format!("token '{}' is outside the scope", token),
				));
			}
		}

		if let Some(amount) = &request.amount {
			let requested = parse_base_units(amount)
				.ok_or_else(|| SignerError::InvalidAmount(amount.clone()))?;
			let ceiling = parse_base_units(&scope.max_amount)
				.ok_or_else(|| SignerError::InvalidAmount(scope.max_amount.clone()))?;
			if requested > ceiling {
				return Err(denied(
					ErrorKind::AmountExceedsScope,
					format!("amount {} exceeds ceiling {}", amount, scope.max_amount),
				));
			}
		}

		Ok(())
	}
}

fn denied(kind: ErrorKind, reason: String) -> SignerError {
	SignerError::Denied { kind, reason }
}
