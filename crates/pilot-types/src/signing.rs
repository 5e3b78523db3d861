//! Signing wire types.
//!
//! The signer takes one flat request per transaction: the raw calldata
//! plus the policy-relevant facts (token, amount, spender) alongside it.
//! Policy checks fire only on the fields that are present, so callers
//! that omit them are opting out of those checks.

use serde::{Deserialize, Serialize};

/// A request to sign one transaction under a consent scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
	/// Chain the transaction targets.
	pub chain: String,
	/// Destination address.
	pub to: String,
	/// Hex calldata, `"0x"` for plain transfers.
	pub data: String,
	/// Native value in base units, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<String>,
	/// Token symbol the transaction spends, for the token allowlist check.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
	/// Spend amount in base units, for the ceiling check.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub amount: Option<String>,
	/// Spender being approved, for the spender allowlist check.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub spender: Option<String>,
}

/// A signed transaction artifact ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
	/// Hex-encoded signed payload (or a deterministic placeholder for
	/// stub backends).
	pub signed_tx: String,
}
