//! In-memory audit trail of signing decisions.
//!
//! Every call to the policy signer leaves exactly one entry, whether the
//! request was granted or denied. The log lives in process memory only;
//! persistence is a deliberate non-feature.

use pilot_types::SignRequest;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One recorded signing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
	pub timestamp_ms: i64,
	/// "sign_granted" or "sign_denied".
	pub event: String,
	pub chain: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub amount: Option<String>,
	/// Taxonomy code on denial.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
}

impl AuditEntry {
	pub fn granted(timestamp_ms: i64, request: &SignRequest) -> Self {
		Self {
			timestamp_ms,
			event: "sign_granted".to_string(),
			chain: request.chain.clone(),
			token: request.token.clone(),
			amount: request.amount.clone(),
			code: None,
		}
	}

	pub fn denied(timestamp_ms: i64, request: &SignRequest, code: String) -> Self {
		Self {
			timestamp_ms,
			event: "sign_denied".to_string(),
			chain: request.chain.clone(),
			token: request.token.clone(),
			amount: request.amount.clone(),
			code: Some(code),
		}
	}
}

/// Append-only audit log.
///
/// The mutex guards short, synchronous appends; it is never held across an
/// await point.
pub struct AuditLog {
	entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
	pub fn new() -> Self {
		Self {
			entries: Mutex::new(Vec::new()),
		}
	}

	pub fn record(&self, entry: AuditEntry) {
		if let Ok(mut entries) = self.entries.lock() {
			entries.push(entry);
		}
	}

	/// Snapshot of all entries in arrival order.
	pub fn entries(&self) -> Vec<AuditEntry> {
		self.entries
			.lock()
			.map(|entries| entries.clone())
			.unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Default for AuditLog {
	fn default() -> Self {
		Self::new()
	}
}
