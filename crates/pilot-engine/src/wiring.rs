//! Output threading between plan steps.
//!
//! The step vocabulary is fixed, so the data flow between steps is a fixed
//! table: each entry names the producing step, the consuming step, and the
//! output fields that travel. A new step kind needs a new wire here;
//! nothing is inferred from step names at runtime.

use pilot_types::steps;
use serde_json::Value;
use std::collections::HashMap;

/// One edge of the data-flow table.
///
/// Each named field is copied from the producer's output into the
/// consumer's input under the same name.
pub struct Wire {
	pub from_step: &'static str,
	pub to_step: &'static str,
	pub fields: &'static [&'static str],
}

const fn wire(
	from_step: &'static str,
	to_step: &'static str,
	fields: &'static [&'static str],
) -> Wire {
	Wire {
		from_step,
		to_step,
		fields,
	}
}

const BUILT_TX_FIELDS: &[&str] = &["to", "data", "value"];

/// Every data-flow edge between the steps the plan builder emits.
pub const WIRES: &[Wire] = &[
	// Approval chain: built tx feeds simulation and signing, the signed
	// artifact feeds broadcast, the hash feeds confirmation.
	wire(steps::BUILD_APPROVE_TX, steps::SIMULATE_APPROVE_TX, BUILT_TX_FIELDS),
	wire(steps::BUILD_APPROVE_TX, steps::SIGN_APPROVE_TX, BUILT_TX_FIELDS),
	wire(steps::SIGN_APPROVE_TX, steps::SEND_APPROVE_TX, &["signed_tx"]),
	wire(steps::SEND_APPROVE_TX, steps::WAIT_CONFIRM_APPROVE, &["tx_hash"]),
	// Send chain.
	wire(steps::BUILD_SEND_TX, steps::SIMULATE_SEND_TX, BUILT_TX_FIELDS),
	wire(steps::BUILD_SEND_TX, steps::SIGN_SEND_TX, BUILT_TX_FIELDS),
	wire(steps::SIGN_SEND_TX, steps::SEND_SEND_TX, &["signed_tx"]),
	wire(steps::SEND_SEND_TX, steps::WAIT_CONFIRM_SEND, &["tx_hash"]),
	// Swap chain. The quote informs planning only; nothing from it feeds
	// the transaction build.
	wire(steps::BUILD_SWAP_TX, steps::SIMULATE_SWAP_TX, BUILT_TX_FIELDS),
	wire(steps::BUILD_SWAP_TX, steps::SIGN_SWAP_TX, BUILT_TX_FIELDS),
	wire(steps::SIGN_SWAP_TX, steps::SEND_SWAP_TX, &["signed_tx"]),
	wire(steps::SEND_SWAP_TX, steps::WAIT_CONFIRM_SWAP, &["tx_hash"]),
];

/// Merges a step's static input with outputs threaded from earlier steps.
///
/// Threaded values overwrite static fields on collision. Producers that
/// have not run, or whose output lacks a named field, contribute nothing.
pub fn thread_inputs(
	step_id: &str,
	static_input: &Value,
	outputs: &HashMap<String, Value>,
) -> Value {
	let mut merged = static_input.as_object().cloned().unwrap_or_default();

	for wire in WIRES.iter().filter(|w| w.to_step == step_id) {
		let produced = match outputs.get(wire.from_step) {
			Some(value) => value,
			None => continue,
		};
		for field in wire.fields {
			if let Some(value) = produced.get(field) {
				merged.insert(field.to_string(), value.clone());
			}
		}
	}

	Value::Object(merged)
}
