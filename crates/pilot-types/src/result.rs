//! Step outcome types for the wallet pilot.
//!
//! Every executed step produces exactly one `StepResult`, successful or
//! not. The engine stops at the first failure, so a run's result list is
//! always a prefix of the plan with at most one failed entry at the end.
//!
//! Results are shaped by step kind rather than carrying raw tool output:
//! simulation steps report `simulation`, submission steps `tx_hash`,
//! confirmation steps `receipt`, and everything else is status-only.

use serde::{Deserialize, Serialize};

/// Terminal status of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
	Success,
	Failed,
	/// Reserved for outer surfaces that elide steps; the engine itself
	/// never emits it.
	Skipped,
}

/// Canonical error attached to a failed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
	/// Taxonomy code (e.g. "insufficient_balance", "revert").
	pub code: String,
	/// Human-readable detail.
	pub message: String,
}

/// A balance delta observed or predicted for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetChange {
	pub asset: String,
	/// Signed decimal string; negative means spent.
	pub delta: String,
}

/// The recorded outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
	/// Identifier of the plan step this result belongs to.
	pub step_id: String,
	pub status: StepStatus,
	/// Full simulation report, present on simulation steps only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub simulation: Option<serde_json::Value>,
	/// Transaction hash, present on submission steps only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tx_hash: Option<String>,
	/// Confirmation receipt, present on confirmation steps only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub receipt: Option<serde_json::Value>,
	/// Asset movements reported by simulation-capable handlers.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset_changes: Option<Vec<AssetChange>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<StepError>,
}

impl StepResult {
	/// A status-only successful result.
	pub fn success(step_id: impl Into<String>) -> Self {
		Self {
			step_id: step_id.into(),
			status: StepStatus::Success,
			simulation: None,
			tx_hash: None,
			receipt: None,
			asset_changes: None,
			error: None,
		}
	}

	/// A failed result with a taxonomy code and message.
	pub fn failed(
		step_id: impl Into<String>,
		code: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self {
			step_id: step_id.into(),
			status: StepStatus::Failed,
			simulation: None,
			tx_hash: None,
			receipt: None,
			asset_changes: None,
			error: Some(StepError {
				code: code.into(),
				message: message.into(),
			}),
		}
	}

	/// Attaches a simulation report to this result.
	pub fn with_simulation(mut self, simulation: serde_json::Value) -> Self {
		self.simulation = Some(simulation);
		self
	}

	/// Attaches a transaction hash to this result.
	pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
		self.tx_hash = Some(tx_hash.into());
		self
	}

	/// Attaches a confirmation receipt to this result.
	pub fn with_receipt(mut self, receipt: serde_json::Value) -> Self {
		self.receipt = Some(receipt);
		self
	}

	/// Attaches asset movements to this result.
	pub fn with_asset_changes(mut self, changes: Vec<AssetChange>) -> Self {
		self.asset_changes = Some(changes);
		self
	}

	pub fn is_success(&self) -> bool {
		self.status == StepStatus::Success
	}
}
