//! Consent scope types for the wallet pilot.
//!
//! A consent scope is the entire signing policy for a session: which chain,
//! which tokens, how much, to whom, and until when. The signer consults
//! nothing else, so whoever mints the scope controls what can be signed.

use serde::{Deserialize, Serialize};

/// Coarse risk classification attached to a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
	Low,
	Medium,
	High,
}

/// The caller-supplied signing policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentScope {
	/// Chain this scope is valid on.
	pub chain: String,
	/// Token symbols the scope allows spending.
	pub tokens: Vec<String>,
	/// Spending ceiling as an integer base-unit string.
	pub max_amount: String,
	/// Contract addresses that may be approved as spenders, lowercased.
	pub spender_allowlist: Vec<String>,
	/// Expiry as unix milliseconds; a request after this instant is denied.
	pub expiry: i64,
	pub risk_level: RiskLevel,
}

impl ConsentScope {
	pub fn is_expired(&self, now_unix_ms: i64) -> bool {
		now_unix_ms > self.expiry
	}

	pub fn allows_token(&self, token: &str) -> bool {
		self.tokens.iter().any(|t| t == token)
	}

	/// Spender comparison is case-insensitive since addresses may arrive
	/// checksummed.
	pub fn allows_spender(&self, spender: &str) -> bool {
		let wanted = spender.to_ascii_lowercase();
		self.spender_allowlist
			.iter()
			.any(|s| s.to_ascii_lowercase() == wanted)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scope() -> ConsentScope {
		ConsentScope {
			chain: "evm".to_string(),
			tokens: vec!["USDC".to_string()],
			max_amount: "200000000".to_string(),
			spender_allowlist: vec!["0x0000000000000000000000000000000000002002".to_string()],
			expiry: 1_700_000_000_000,
			risk_level: RiskLevel::Low,
		}
	}

	#[test]
	fn test_expiry_is_exclusive_of_the_deadline() {
		let scope = scope();
		assert!(!scope.is_expired(1_700_000_000_000));
		assert!(scope.is_expired(1_700_000_000_001));
	}

	#[test]
	fn test_spender_match_ignores_case() {
		let scope = scope();
		assert!(scope.allows_spender("0x0000000000000000000000000000000000002002"));
		assert!(scope.allows_spender("0x0000000000000000000000000000000000002002".to_ascii_uppercase().as_str()));
		assert!(!scope.allows_spender("0x0000000000000000000000000000000000009999"));
	}

	#[test]
	fn test_token_match_is_exact() {
		let scope = scope();
		assert!(scope.allows_token("USDC"));
		assert!(!scope.allows_token("usdc"));
	}
}
