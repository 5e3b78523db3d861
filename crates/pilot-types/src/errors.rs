//! Canonical error taxonomy for the wallet pilot.
//!
//! Step failures surface to callers as a small closed set of string codes.
//! Handlers and the signer report structured kinds; the engine turns them
//! into `StepResult.error.code` values. Anything a handler cannot classify
//! falls into `revert`.

use serde::{Deserialize, Serialize};

/// Structured failure classification reported by tool handlers and policy
/// checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	// Execution failures observed against the chain.
	InsufficientBalance,
	InsufficientAllowance,
	SlippageTooHigh,
	NonceConflict,
	/// Catch-all for any unclassified execution failure.
	Revert,

	// Policy denials from the consent-scope signer.
	ChainNotAllowed,
	ConsentExpired,
	SpenderNotAllowed,
	TokenNotAllowed,
	AmountExceedsScope,
}

impl ErrorKind {
	/// The canonical wire code for this kind.
	pub fn code(&self) -> &'static str {
		match self {
			Self::InsufficientBalance => "insufficient_balance",
			Self::InsufficientAllowance => "insufficient_allowance",
			Self::SlippageTooHigh => "slippage_too_high",
			Self::NonceConflict => "nonce_conflict",
			Self::Revert => "revert",
			Self::ChainNotAllowed => "chain_not_allowed",
			Self::ConsentExpired => "consent_expired",
			Self::SpenderNotAllowed => "spender_not_allowed",
			Self::TokenNotAllowed => "token_not_allowed",
			Self::AmountExceedsScope => "amount_exceeds_scope",
		}
	}

	/// Whether this kind is a consent-policy denial rather than an
	/// execution failure.
	pub fn is_policy(&self) -> bool {
		matches!(
			self,
			Self::ChainNotAllowed
				| Self::ConsentExpired
				| Self::SpenderNotAllowed
				| Self::TokenNotAllowed
				| Self::AmountExceedsScope
		)
	}
}

impl std::fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.code())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_codes_are_stable() {
		assert_eq!(ErrorKind::InsufficientBalance.code(), "insufficient_balance");
		assert_eq!(ErrorKind::AmountExceedsScope.code(), "amount_exceeds_scope");
		assert_eq!(ErrorKind::Revert.code(), "revert");
	}

	#[test]
	fn test_policy_partition() {
		assert!(ErrorKind::ConsentExpired.is_policy());
		assert!(!ErrorKind::NonceConflict.is_policy());
	}

	#[test]
	fn test_serializes_as_snake_case_code() {
		let json = serde_json::to_string(&ErrorKind::SlippageTooHigh).unwrap();
		assert_eq!(json, "\"slippage_too_high\"");
	}
}
