//! Plan types for the wallet pilot.
//!
//! A plan is the ordered, fully static expansion of an intent: which tools
//! run, in what order, with which inputs known ahead of time. Runtime data
//! (built transactions, signatures, hashes) is threaded between steps by
//! the engine, never stored here.

use serde::{Deserialize, Serialize};

use crate::intent::Constraints;

/// Canonical step identifiers used by the plan builder and the wiring table.
pub mod steps {
	pub const CHAIN_READ: &str = "chain_read";

	pub const BUILD_APPROVE_TX: &str = "build_approve_tx";
	pub const SIMULATE_APPROVE_TX: &str = "simulate_approve_tx";
	pub const SIGN_APPROVE_TX: &str = "sign_approve_tx";
	pub const SEND_APPROVE_TX: &str = "send_approve_tx";
	pub const WAIT_CONFIRM_APPROVE: &str = "wait_confirm_approve";

	pub const BUILD_SEND_TX: &str = "build_send_tx";
	pub const SIMULATE_SEND_TX: &str = "simulate_send_tx";
	pub const SIGN_SEND_TX: &str = "sign_send_tx";
	pub const SEND_SEND_TX: &str = "send_send_tx";
	pub const WAIT_CONFIRM_SEND: &str = "wait_confirm_send";

	pub const QUOTE_ROUTE: &str = "quote_route";
	pub const BUILD_SWAP_TX: &str = "build_swap_tx";
	pub const SIMULATE_SWAP_TX: &str = "simulate_swap_tx";
	pub const SIGN_SWAP_TX: &str = "sign_swap_tx";
	pub const SEND_SWAP_TX: &str = "send_swap_tx";
	pub const WAIT_CONFIRM_SWAP: &str = "wait_confirm_swap";
}

/// Registry names of the tool capabilities steps dispatch to.
pub mod tools {
	pub const CHAIN_READ: &str = "chain_read";
	pub const QUOTE_ROUTE: &str = "quote_route";
	pub const BUILD_TX: &str = "build_tx";
	pub const SIMULATE_TX: &str = "simulate_tx";
	pub const SIGN_TX: &str = "sign_tx";
	pub const SEND_TX: &str = "send_tx";
	pub const WAIT_CONFIRM: &str = "wait_confirm";
}

/// Retry guidance carried on a step.
///
/// Informational for callers; the engine never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
	pub max_retries: u32,
	pub backoff_ms: u64,
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
	/// Stable identifier, unique within the plan (e.g. "sign_swap_tx").
	pub step_id: String,
	/// Registry name of the tool this step dispatches to.
	pub tool: String,
	/// Static input parameters known at plan time, as a JSON object.
	pub input: serde_json::Value,
	/// Named conditions expected to hold before the step runs.
	pub preconditions: Vec<String>,
	/// Named conditions the step establishes on success.
	pub postconditions: Vec<String>,
	/// Optional retry guidance; carried but not auto-applied.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub retry_policy: Option<RetryPolicy>,
}

/// One ERC-20 allowance the plan will set up before spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceRequirement {
	/// Token being approved, as an uppercase symbol.
	pub token: String,
	/// Spender contract the allowance is granted to.
	pub spender: String,
	/// Allowance amount in integer base units.
	pub amount: String,
}

/// Summary of what executing the plan will require from the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredPermissions {
	/// Allowances the plan will establish. Empty when no approval runs.
	pub allowance: Vec<AllowanceRequirement>,
	/// Number of signatures the plan will request.
	pub signatures: u32,
}

/// An ordered, executable expansion of an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
	/// Unique identifier for this build of the plan.
	pub plan_id: String,
	/// Steps in execution order.
	pub steps: Vec<PlanStep>,
	/// Constraints carried over from the intent, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub constraints: Option<Constraints>,
	/// Permissions summary across all steps.
	pub required_permissions: RequiredPermissions,
}

impl Plan {
	/// Looks up a step by its identifier.
	pub fn step(&self, step_id: &str) -> Option<&PlanStep> {
		self.steps.iter().find(|s| s.step_id == step_id)
	}

	/// Ordered step identifiers, useful for assertions and display.
	pub fn step_ids(&self) -> Vec<&str> {
		self.steps.iter().map(|s| s.step_id.as_str()).collect()
	}
}
