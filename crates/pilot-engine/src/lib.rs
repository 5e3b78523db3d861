//! Execution engine for the wallet pilot.
//!
//! The engine turns an intent into a plan and walks the plan's steps in
//! order: thread inputs, validate against the tool's schemas, dispatch,
//! post-validate, record. Execution halts at the first failed step and the
//! partial result list comes back in a normal report, so callers can
//! always inspect what ran. Nothing is retried and nothing is rolled back.

pub mod lifecycle;
pub mod wiring;

use pilot_plan::{PlanBuilder, PlanError};
use pilot_signer::PolicySigner;
use pilot_tools::{ToolContext, ToolError, ToolRegistry};
use pilot_types::{
	parse_base_units, tools, ErrorKind, ExecutionState, IntentSpec, Plan, PlanStep, StepError,
	StepResult,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::lifecycle::RunLifecycle;

/// Errors raised before any step has run.
///
/// Once stepping starts, failures are captured in the report instead.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Planning failed: {0}")]
	Plan(#[from] PlanError),
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition {
		from: ExecutionState,
		to: ExecutionState,
	},
}

/// The outcome of one execution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
	/// The plan that was executed.
	pub plan: Plan,
	/// Terminal lifecycle state, `DONE` or `FAILED`.
	pub state: ExecutionState,
	/// One result per attempted step; a prefix of the plan on failure.
	pub results: Vec<StepResult>,
}

impl ExecutionReport {
	pub fn succeeded(&self) -> bool {
		self.state == ExecutionState::Done
	}

	/// Recovery suggestions after a failed run, empty on success.
	pub fn recovery_options(&self) -> Vec<RecoveryOption> {
		match self.results.last() {
			Some(result) if result.error.is_some() => recovery_options(),
			_ => Vec::new(),
		}
	}
}

/// Caller-facing follow-up suggestions after a failed run.
///
/// The engine only suggests; acting on these is an outer-surface concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOption {
	Retry,
	AdjustSlippage,
	AdjustAmount,
}

/// The canned recovery menu. One menu fits every failure today; callers
/// decide which entries make sense for the code they got.
pub fn recovery_options() -> Vec<RecoveryOption> {
	vec![
		RecoveryOption::Retry,
		RecoveryOption::AdjustSlippage,
		RecoveryOption::AdjustAmount,
	]
}

/// Runs plans step by step against a tool registry.
///
/// One engine serves many runs. Each `execute` call owns its lifecycle and
/// its output-threading map, so concurrent calls do not interact; the
/// consent scope inside the shared signer is immutable and re-checked on
/// every sign request.
pub struct ExecutionEngine {
	builder: PlanBuilder,
	registry: ToolRegistry,
	signer: Option<Arc<PolicySigner>>,
}

impl ExecutionEngine {
	pub fn new(
		builder: PlanBuilder,
		registry: ToolRegistry,
		signer: Option<Arc<PolicySigner>>,
	) -> Self {
		Self {
			builder,
			registry,
			signer,
		}
	}

	/// Builds the plan for an intent without executing it.
	pub fn plan(&self, intent: &IntentSpec) -> Result<Plan, EngineError> {
		Ok(self.builder.build(intent)?)
	}

	/// Plans and executes an intent.
	///
	/// A failed step does not surface as `Err`: the run halts, the failed
	/// result closes the partial result list, and the report comes back
	/// with state `FAILED`. `Err` is reserved for planning failures.
	pub async fn execute(&self, intent: &IntentSpec) -> Result<ExecutionReport, EngineError> {
		let mut run = RunLifecycle::new();
		let plan = self.builder.build(intent)?;
		run.advance(ExecutionState::Planned)?;

		// No in-process approval gate: the caller holding a valid consent
		// scope is the grant, and the signer re-checks that scope on every
		// sign request.
		run.advance(ExecutionState::Approved)?;
		run.advance(ExecutionState::Executing)?;

		info!(
			plan_id = %plan.plan_id,
			steps = plan.steps.len(),
			"Executing plan"
		);

		let ctx = ToolContext::for_run(
			intent.chain.as_str(),
			plan.plan_id.clone(),
			self.signer.clone(),
		);
		let mut results = Vec::with_capacity(plan.steps.len());
		let mut outputs: HashMap<String, serde_json::Value> = HashMap::new();

		for step in &plan.steps {
			match self.run_step(step, &ctx, &outputs).await {
				Ok(output) => {
					info!(step_id = %step.step_id, tool = %step.tool, "Step succeeded");
					results.push(shape_result(step, &output));
					outputs.insert(step.step_id.clone(), output);
				}
				Err(error) => {
					warn!(
						step_id = %step.step_id,
						code = %error.code,
						"Step failed: {}",
						error.message
					);
					results.push(StepResult::failed(
						step.step_id.as_str(),
						error.code,
						error.message,
					));
					run.advance(ExecutionState::Failed)?;
					return Ok(ExecutionReport {
						plan,
						state: run.state(),
						results,
					});
				}
			}
		}

		run.advance(ExecutionState::Confirmed)?;
		run.advance(ExecutionState::Done)?;

		Ok(ExecutionReport {
			plan,
			state: run.state(),
			results,
		})
	}

	async fn run_step(
		&self,
		step: &PlanStep,
		ctx: &ToolContext,
		outputs: &HashMap<String, serde_json::Value>,
	) -> Result<serde_json::Value, StepError> {
		let tool = self
			.registry
			.get(&step.tool)
			.ok_or_else(|| revert(format!("tool '{}' not found", step.tool)))?;

		let input = wiring::thread_inputs(&step.step_id, &step.input, outputs);
		tool.input_schema()
			.validate(&input)
			.map_err(|error| revert(format!("input rejected: {}", error)))?;

		let output = tool
			.execute(&input, ctx)
			.await
			.map_err(|error| tool_failure(&error))?;

		tool.output_schema()
			.validate(&output)
			.map_err(|error| revert(format!("output rejected: {}", error)))?;

		if step.tool == tools::CHAIN_READ {
			check_sufficiency(&input, &output)?;
		}

		Ok(output)
	}
}

fn revert(message: String) -> StepError {
	StepError {
		code: ErrorKind::Revert.code().to_string(),
		message,
	}
}

fn tool_failure(error: &ToolError) -> StepError {
	StepError {
		code: error.code().to_string(),
		message: error.to_string(),
	}
}

/// Builds the success result for a step.
///
/// Results are shaped by tool kind: simulation steps carry the whole
/// report, broadcast steps surface the hash, confirmation steps the
/// receipt, and everything else is status-only.
fn shape_result(step: &PlanStep, output: &serde_json::Value) -> StepResult {
	let result = StepResult::success(step.step_id.as_str());
	match step.tool.as_str() {
		tools::SIMULATE_TX => result.with_simulation(output.clone()),
		tools::SEND_TX => match output.get("tx_hash").and_then(|v| v.as_str()) {
			Some(hash) => result.with_tx_hash(hash),
			None => result,
		},
		tools::WAIT_CONFIRM => match output.get("receipt") {
			Some(receipt) => result.with_receipt(receipt.clone()),
			None => result,
		},
		_ => result,
	}
}

/// Compares declared requirements against what `chain_read` returned.
///
/// Only integer-string requirements are compared; a decimal-valued
/// requirement stays recorded in the plan but is not enforced here.
fn check_sufficiency(
	input: &serde_json::Value,
	output: &serde_json::Value,
) -> Result<(), StepError> {
	let floor = |field: &str| {
		input
			.get(field)
			.and_then(|v| v.as_str())
			.and_then(parse_base_units)
	};

	if let Some(required) = floor("required_amount") {
		// A missing or unparseable balance counts as zero, so shortfalls
		// on absent data fail rather than pass.
		let balance = output
			.get("balance")
			.and_then(|v| v.as_str())
			.and_then(parse_base_units)
			.unwrap_or_default();
		if balance < required {
			return Err(StepError {
				code: ErrorKind::InsufficientBalance.code().to_string(),
				message: format!("balance {} below required {}", balance, required),
			});
		}
	}

	if let Some(required) = floor("required_allowance") {
		// A reading without an allowance was not asked about a spender;
		// there is nothing to enforce against.
		if let Some(allowance) = output.get("allowance").and_then(|v| v.as_str()) {
			let allowance = parse_base_units(allowance).unwrap_or_default();
			if allowance < required {
				return Err(StepError {
					code: ErrorKind::InsufficientAllowance.code().to_string(),
					message: format!("allowance {} below required {}", allowance, required),
				});
			}
		}
	}

	Ok(())
}
