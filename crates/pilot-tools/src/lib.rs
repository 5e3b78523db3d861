//! Tool capability module for the wallet pilot.
//!
//! A tool is one chain-facing capability (read state, build a transaction,
//! sign, broadcast, await confirmation). The engine only ever talks to
//! tools through [`ToolInterface`] and the [`ToolRegistry`], so swapping
//! the stub set for live handlers is a registry change, not an engine
//! change.

pub mod implementations;

use async_trait::async_trait;
use pilot_signer::{PolicySigner, SignerError};
use pilot_types::{ErrorKind, Schema};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

/// Errors that can occur during tool dispatch and execution.
#[derive(Debug, Error)]
pub enum ToolError {
	#[error("Tool not found: {0}")]
	NotFound(String),
	#[error("No signer available in context")]
	SignerUnavailable,
	#[error(transparent)]
	Signer(#[from] SignerError),
	#[error("Invalid input for '{tool}': {message}")]
	InvalidInput { tool: String, message: String },
	/// A classified execution failure. `kind` maps straight onto the
	/// canonical taxonomy; no message sniffing happens anywhere.
	#[error("{kind}: {message}")]
	Execution { kind: ErrorKind, message: String },
}

impl ToolError {
	/// The taxonomy code this error surfaces as on a failed step.
	pub fn code(&self) -> &'static str {
		match self {
			Self::Execution { kind, .. } => kind.code(),
			Self::Signer(error) => error
				.denied_kind()
				.map(|kind| kind.code())
				.unwrap_or(ErrorKind::Revert.code()),
			_ => ErrorKind::Revert.code(),
		}
	}
}

/// Rough cost class of invoking a tool, for surfaces that want to show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostEstimate {
	Low,
	Medium,
	High,
}

/// Per-dispatch context handed to every tool invocation.
#[derive(Clone)]
pub struct ToolContext {
	/// Chain the surrounding execution targets.
	pub chain: String,
	/// Correlation id for logs; the engine passes the plan id of the run.
	pub request_id: String,
	/// Policy signer shared across the run, when one is installed.
	pub signer: Option<Arc<PolicySigner>>,
}

impl ToolContext {
	/// Context with a fresh correlation id.
	pub fn new(chain: impl Into<String>, signer: Option<Arc<PolicySigner>>) -> Self {
		Self::for_run(chain, uuid::Uuid::new_v4().to_string(), signer)
	}

	/// Context correlated to an existing run identifier.
	pub fn for_run(
		chain: impl Into<String>,
		request_id: impl Into<String>,
		signer: Option<Arc<PolicySigner>>,
	) -> Self {
		Self {
			chain: chain.into(),
			request_id: request_id.into(),
			signer,
		}
	}
}

/// Trait defining a chain-facing capability.
///
/// Implementations must be deterministic about their declared metadata;
/// the engine trusts `input_schema`/`output_schema` to gate payloads and
/// callers trust `requires_signature` when counting approvals.
#[async_trait]
pub trait ToolInterface: Send + Sync {
	/// Registry name of this tool.
	fn name(&self) -> &str;
	/// Schema the effective input must satisfy before dispatch.
	fn input_schema(&self) -> Schema;
	/// Schema the output must satisfy after execution.
	fn output_schema(&self) -> Schema;
	fn cost_estimate(&self) -> CostEstimate {
		CostEstimate::Low
	}
	fn requires_signature(&self) -> bool {
		false
	}
	fn is_retryable(&self) -> bool {
		false
	}
	fn required_permissions(&self) -> Vec<String> {
		Vec::new()
	}
	/// Runs the capability against a schema-valid input.
	async fn execute(
		&self,
		input: &serde_json::Value,
		ctx: &ToolContext,
	) -> Result<serde_json::Value, ToolError>;
}

/// Registry of tools for one pipeline instance.
///
/// Built during assembly and read-only afterwards; nothing mutates it
/// between runs. Registering a name twice replaces the earlier tool, so
/// a caller can overlay stubs with live handlers.
pub struct ToolRegistry {
	tools: HashMap<String, Arc<dyn ToolInterface>>,
}

impl ToolRegistry {
	pub fn new() -> Self {
		Self {
			tools: HashMap::new(),
		}
	}

	/// Registers a tool under its own name. Last registration wins.
	pub fn register(&mut self, tool: Arc<dyn ToolInterface>) {
		self.tools.insert(tool.name().to_string(), tool);
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn ToolInterface>> {
		self.tools.get(name).cloned()
	}

	/// Registered tool names, sorted for stable display.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.tools.keys().cloned().collect();
		names.sort();
		names
	}

	pub fn len(&self) -> usize {
		self.tools.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tools.is_empty()
	}
}

impl Default for ToolRegistry {
	fn default() -> Self {
		Self::new()
	}
}
