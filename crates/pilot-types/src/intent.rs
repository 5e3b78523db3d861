//! Intent types for the wallet pilot.
//!
//! An intent is the typed, validated form of a user command. It is produced
//! by the intent resolver and consumed by the plan builder; everything
//! downstream of resolution works with this shape, never with raw text.

use serde::{Deserialize, Serialize};

/// The kind of wallet operation an intent asks for.
///
/// The set is closed: resolution rejects anything outside it. Only a subset
/// has a dedicated planning branch today; the rest still resolve and plan
/// as read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
	Send,
	Swap,
	Approve,
	Revoke,
	Deposit,
	Stake,
	Withdraw,
	Unstake,
	Batch,
	Rebalance,
	Schedule,
}

impl std::fmt::Display for ActionType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Self::Send => "send",
			Self::Swap => "swap",
			Self::Approve => "approve",
			Self::Revoke => "revoke",
			Self::Deposit => "deposit",
			Self::Stake => "stake",
			Self::Withdraw => "withdraw",
			Self::Unstake => "unstake",
			Self::Batch => "batch",
			Self::Rebalance => "rebalance",
			Self::Schedule => "schedule",
		};
		write!(f, "{}", s)
	}
}

/// Optional execution constraints attached to an intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
	/// Maximum acceptable slippage in percent (e.g. 0.5 for 0.5%).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub slippage: Option<f64>,
	/// Unix-ms deadline after which the operation should not run.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub deadline: Option<u64>,
}

/// A resolved user intent.
///
/// Amounts are decimal strings in display units (`"0.1"`, `"200"`); the
/// plan builder converts them to integer base units. Symbols are uppercase,
/// chains and addresses lowercase. Unknown fields in incoming JSON are
/// ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSpec {
	/// The operation being requested.
	pub action_type: ActionType,
	/// Normalized chain identifier (e.g. "evm", "sepolia").
	pub chain: String,
	/// Asset being spent, as an uppercase symbol.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset_in: Option<String>,
	/// Asset being received, for exchange-like operations.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset_out: Option<String>,
	/// Amount in display units as a decimal string.
	pub amount: String,
	/// Execution constraints, if the user expressed any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub constraints: Option<Constraints>,
	/// Protocol hint steering plan expansion. `"approve+swap"` asks for an
	/// ERC-20 approval subchain ahead of the main branch.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_protocol: Option<String>,
	/// Destination address, lowercased.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recipient: Option<String>,
}

impl IntentSpec {
	/// Slippage constraint, if present.
	pub fn slippage(&self) -> Option<f64> {
		self.constraints.as_ref().and_then(|c| c.slippage)
	}

	/// Whether the plan for this intent must include an approval subchain.
	pub fn wants_approval(&self) -> bool {
		self.action_type == ActionType::Approve
			|| self.target_protocol.as_deref() == Some("approve+swap")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_deserialize_full_intent() {
		let json = serde_json::json!({
			"action_type": "swap",
			"chain": "evm",
			"asset_in": "USDC",
			"asset_out": "ETH",
			"amount": "200",
			"constraints": { "slippage": 0.5 },
			"target_protocol": "approve+swap"
		});

		let intent: IntentSpec = serde_json::from_value(json).unwrap();
		assert_eq!(intent.action_type, ActionType::Swap);
		assert_eq!(intent.chain, "evm");
		assert_eq!(intent.asset_in.as_deref(), Some("USDC"));
		assert_eq!(intent.asset_out.as_deref(), Some("ETH"));
		assert_eq!(intent.amount, "200");
		assert_eq!(intent.slippage(), Some(0.5));
		assert!(intent.wants_approval());
	}

	#[test]
	fn test_unknown_fields_are_ignored() {
		let json = serde_json::json!({
			"action_type": "send",
			"chain": "evm",
			"amount": "1",
			"note": "not part of the shape"
		});

		let intent: IntentSpec = serde_json::from_value(json).unwrap();
		assert_eq!(intent.action_type, ActionType::Send);
		assert!(!intent.wants_approval());
	}

	#[test]
	fn test_rejects_unknown_action_type() {
		let json = serde_json::json!({
			"action_type": "teleport",
			"chain": "evm",
			"amount": "1"
		});

		assert!(serde_json::from_value::<IntentSpec>(json).is_err());
	}

	#[test]
	fn test_approval_requested_by_action_type() {
		let json = serde_json::json!({
			"action_type": "approve",
			"chain": "evm",
			"asset_in": "USDC",
			"amount": "50"
		});

		let intent: IntentSpec = serde_json::from_value(json).unwrap();
		assert!(intent.wants_approval());
	}
}
