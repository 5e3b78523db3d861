//! Plan building module for the wallet pilot.
//!
//! Expands a resolved intent into the ordered step list the engine runs.
//! Building is a pure function of the intent and the injected wallet
//! profile: no clocks, no chain reads, no globals. Two builds of the same
//! intent differ only in `plan_id`.
//!
//! Every plan opens with a `chain_read` sufficiency probe. Intents that
//! ask for approval (the `approve` action, or a `target_protocol` of
//! `"approve+swap"`) get the five-step approve subchain, then the action
//! branch (send or swap) contributes its own build/simulate/sign/send/
//! confirm chain. Action types without a dedicated branch still produce
//! the read-only plan rather than failing.

pub mod calldata;
pub mod profile;

use pilot_types::{
	is_native_asset, steps, to_base_units, tools, ActionType, AllowanceRequirement, AmountError,
	IntentSpec, Plan, PlanStep, RequiredPermissions, NATIVE_SYMBOL,
};
use thiserror::Error;

pub use profile::WalletProfile;

/// Errors that can occur while building a plan.
#[derive(Debug, Error)]
pub enum PlanError {
	/// The intent is structurally valid but cannot be expanded into steps.
	#[error("Intent cannot be planned: {0}")]
	UnplannableIntent(String),
	#[error("Invalid amount: {0}")]
	Amount(#[from] AmountError),
	#[error("Invalid wallet profile: {0}")]
	InvalidProfile(String),
}

/// Expands intents into plans against one wallet profile.
pub struct PlanBuilder {
	profile: WalletProfile,
}

impl PlanBuilder {
	pub fn new(profile: WalletProfile) -> Self {
		Self { profile }
	}

	pub fn profile(&self) -> &WalletProfile {
		&self.profile
	}

	/// Builds the execution plan for an intent.
	pub fn build(&self, intent: &IntentSpec) -> Result<Plan, PlanError> {
		let chain = intent.chain.as_str();
		let needs_approval = intent.wants_approval();

		if needs_approval && intent.asset_in.is_none() {
			return Err(PlanError::UnplannableIntent(
				"approval requires asset_in".to_string(),
			));
		}
		if intent.action_type == ActionType::Swap && intent.asset_in.is_none() {
			return Err(PlanError::UnplannableIntent(
				"swap requires asset_in".to_string(),
			));
		}

		let spend_symbol = intent
			.asset_in
			.clone()
			.unwrap_or_else(|| NATIVE_SYMBOL.to_string());
		let decimals = self.profile.decimals(&spend_symbol);
		let base_amount = to_base_units(&intent.amount, decimals)?;
		let base_str = base_amount.to_string();

		let mut plan_steps = Vec::new();
		plan_steps.push(self.chain_read_step(&spend_symbol, &base_str, needs_approval)?);

		if needs_approval {
			plan_steps.extend(self.approval_steps(chain, &spend_symbol, &base_str, base_amount)?);
		}

		match intent.action_type {
			ActionType::Send => {
				plan_steps.extend(self.send_steps(
					intent,
					&spend_symbol,
					&base_str,
					base_amount,
					needs_approval,
				)?);
			}
			ActionType::Swap => {
				plan_steps.extend(self.swap_steps(
					intent,
					&spend_symbol,
					&base_str,
					needs_approval,
				)?);
			}
			_ => {}
		}

		let allowance = if needs_approval {
			vec![AllowanceRequirement {
				token: spend_symbol.clone(),
				spender: format!("{:#x}", self.profile.spender_address()?),
				amount: base_str.clone(),
			}]
		} else {
			vec![]
		};
		let signatures = if needs_approval && intent.action_type == ActionType::Swap {
			2
		} else {
			1
		};

		Ok(Plan {
			plan_id: generate_plan_id(),
			steps: plan_steps,
			constraints: intent.constraints.clone(),
			required_permissions: RequiredPermissions {
				allowance,
				signatures,
			},
		})
	}

	/// The sufficiency probe every plan opens with.
	fn chain_read_step(
		&self,
		spend_symbol: &str,
		base_str: &str,
		needs_approval: bool,
	) -> Result<PlanStep, PlanError> {
		let mut input = serde_json::Map::new();
		input.insert(
			"address".to_string(),
			serde_json::Value::String(self.profile.wallet_address.clone()),
		);
		// Native balance reads carry no token field.
		if !is_native_asset(spend_symbol) {
			let token = self.profile.token_address(spend_symbol)?;
			input.insert(
				"token".to_string(),
				serde_json::Value::String(format!("{:#x}", token)),
			);
		}
		input.insert(
			"required_amount".to_string(),
			serde_json::Value::String(base_str.to_string()),
		);
		if needs_approval {
			let spender = self.profile.spender_address()?;
			input.insert(
				"spender".to_string(),
				serde_json::Value::String(format!("{:#x}", spender)),
			);
			input.insert(
				"required_allowance".to_string(),
				serde_json::Value::String(base_str.to_string()),
			);
		}

		Ok(PlanStep {
			step_id: steps::CHAIN_READ.to_string(),
			tool: tools::CHAIN_READ.to_string(),
			input: serde_json::Value::Object(input),
			preconditions: vec![],
			postconditions: vec!["has_balance".to_string()],
			retry_policy: None,
		})
	}

	/// The five-step approval subchain.
	fn approval_steps(
		&self,
		chain: &str,
		spend_symbol: &str,
		base_str: &str,
		base_amount: alloy_primitives::U256,
	) -> Result<Vec<PlanStep>, PlanError> {
		let token = self.profile.token_address(spend_symbol)?;
		let spender = self.profile.spender_address()?;
		let spender_str = format!("{:#x}", spender);

		Ok(vec![
			step(
				steps::BUILD_APPROVE_TX,
				tools::BUILD_TX,
				serde_json::json!({
					"to": format!("{:#x}", token),
					"data": calldata::approve_calldata(spender, base_amount),
					"value": "0",
				}),
				&["has_balance"],
				&["has_approve_tx"],
			),
			step(
				steps::SIMULATE_APPROVE_TX,
				tools::SIMULATE_TX,
				serde_json::json!({}),
				&["has_approve_tx"],
				&["approve_simulated"],
			),
			step(
				steps::SIGN_APPROVE_TX,
				tools::SIGN_TX,
				serde_json::json!({
					"chain": chain,
					"token": spend_symbol,
					"spender": spender_str,
					"amount": base_str,
				}),
				&["approve_simulated"],
				&["approve_signed"],
			),
			step(
				steps::SEND_APPROVE_TX,
				tools::SEND_TX,
				serde_json::json!({}),
				&["approve_signed"],
				&["approve_sent"],
			),
			step(
				steps::WAIT_CONFIRM_APPROVE,
				tools::WAIT_CONFIRM,
				serde_json::json!({}),
				&["approve_sent"],
				&["approve_confirmed"],
			),
		])
	}

	/// The transfer chain for send intents.
	fn send_steps(
		&self,
		intent: &IntentSpec,
		spend_symbol: &str,
		base_str: &str,
		base_amount: alloy_primitives::U256,
		needs_approval: bool,
	) -> Result<Vec<PlanStep>, PlanError> {
		let chain = intent.chain.as_str();
		let recipient = intent.recipient.as_deref().ok_or_else(|| {
			PlanError::UnplannableIntent("send requires a recipient".to_string())
		})?;
		let recipient_address = recipient
			.parse::<alloy_primitives::Address>()
			.map_err(|e| {
				PlanError::UnplannableIntent(format!("invalid recipient '{}': {}", recipient, e))
			})?;

		// Native transfers move value; token transfers move balance via
		// calldata against the token contract.
		let build_input = if is_native_asset(spend_symbol) {
			serde_json::json!({
				"to": recipient,
				"data": "0x",
				"value": base_str,
			})
		} else {
			let token = self.profile.token_address(spend_symbol)?;
			serde_json::json!({
				"to": format!("{:#x}", token),
				"data": calldata::transfer_calldata(recipient_address, base_amount),
				"value": "0",
			})
		};

		let build_precondition = if needs_approval {
			"approve_confirmed"
		} else {
			"has_balance"
		};

		let mut sign_input = serde_json::Map::new();
		sign_input.insert(
			"chain".to_string(),
			serde_json::Value::String(chain.to_string()),
		);
		if let Some(token) = &intent.asset_in {
			sign_input.insert("token".to_string(), serde_json::Value::String(token.clone()));
		}
		sign_input.insert(
			"amount".to_string(),
			serde_json::Value::String(base_str.to_string()),
		);
		if needs_approval {
			let spender = self.profile.spender_address()?;
			sign_input.insert(
				"spender".to_string(),
				serde_json::Value::String(format!("{:#x}", spender)),
			);
		}

		Ok(vec![
			step(
				steps::BUILD_SEND_TX,
				tools::BUILD_TX,
				build_input,
				&[build_precondition],
				&["has_tx"],
			),
			step(
				steps::SIMULATE_SEND_TX,
				tools::SIMULATE_TX,
				serde_json::json!({}),
				&["has_tx"],
				&["simulated"],
			),
			step(
				steps::SIGN_SEND_TX,
				tools::SIGN_TX,
				serde_json::Value::Object(sign_input),
				&["simulated"],
				&["signed"],
			),
			step(
				steps::SEND_SEND_TX,
				tools::SEND_TX,
				serde_json::json!({}),
				&["signed"],
				&["sent"],
			),
			step(
				steps::WAIT_CONFIRM_SEND,
				tools::WAIT_CONFIRM,
				serde_json::json!({}),
				&["sent"],
				&["confirmed"],
			),
		])
	}

	/// The quote-and-swap chain for swap intents.
	fn swap_steps(
		&self,
		intent: &IntentSpec,
		spend_symbol: &str,
		base_str: &str,
		needs_approval: bool,
	) -> Result<Vec<PlanStep>, PlanError> {
		let chain = intent.chain.as_str();
		let asset_out = intent.asset_out.as_deref().ok_or_else(|| {
			PlanError::UnplannableIntent("swap requires asset_out".to_string())
		})?;
		let spender = self.profile.spender_address()?;
		let spender_str = format!("{:#x}", spender);

		let mut quote_input = serde_json::Map::new();
		quote_input.insert(
			"asset_in".to_string(),
			serde_json::Value::String(spend_symbol.to_string()),
		);
		quote_input.insert(
			"asset_out".to_string(),
			serde_json::Value::String(asset_out.to_string()),
		);
		quote_input.insert(
			"amount_in".to_string(),
			serde_json::Value::String(intent.amount.clone()),
		);
		if let Some(slippage) = intent.slippage() {
			if let Some(number) = serde_json::Number::from_f64(slippage) {
				quote_input.insert("slippage".to_string(), serde_json::Value::Number(number));
			}
		}

		// The quote waits on confirmed allowance when an approval runs
		// first; otherwise a funded balance is enough.
		let quote_precondition = if needs_approval {
			"approve_confirmed"
		} else {
			"has_balance"
		};

		let mut sign_input = serde_json::Map::new();
		sign_input.insert(
			"chain".to_string(),
			serde_json::Value::String(chain.to_string()),
		);
		sign_input.insert(
			"token".to_string(),
			serde_json::Value::String(spend_symbol.to_string()),
		);
		sign_input.insert(
			"amount".to_string(),
			serde_json::Value::String(base_str.to_string()),
		);
		if needs_approval {
			sign_input.insert(
				"spender".to_string(),
				serde_json::Value::String(spender_str.clone()),
			);
		}

		Ok(vec![
			step(
				steps::QUOTE_ROUTE,
				tools::QUOTE_ROUTE,
				serde_json::Value::Object(quote_input),
				&[quote_precondition],
				&["has_quote"],
			),
			step(
				steps::BUILD_SWAP_TX,
				tools::BUILD_TX,
				serde_json::json!({
					"to": spender_str,
					"data": "0x",
					"value": "0",
				}),
				&["has_quote"],
				&["has_tx"],
			),
			step(
				steps::SIMULATE_SWAP_TX,
				tools::SIMULATE_TX,
				serde_json::json!({}),
				&["has_tx"],
				&["simulated"],
			),
			step(
				steps::SIGN_SWAP_TX,
				tools::SIGN_TX,
				serde_json::Value::Object(sign_input),
				&["simulated"],
				&["signed"],
			),
			step(
				steps::SEND_SWAP_TX,
				tools::SEND_TX,
				serde_json::json!({}),
				&["signed"],
				&["sent"],
			),
			step(
				steps::WAIT_CONFIRM_SWAP,
				tools::WAIT_CONFIRM,
				serde_json::json!({}),
				&["sent"],
				&["confirmed"],
			),
		])
	}
}

fn step(
	step_id: &str,
	tool: &str,
	input: serde_json::Value,
	preconditions: &[&str],
	postconditions: &[&str],
) -> PlanStep {
	PlanStep {
		step_id: step_id.to_string(),
		tool: tool.to_string(),
		input,
		preconditions: preconditions.iter().map(|s| s.to_string()).collect(),
		postconditions: postconditions.iter().map(|s| s.to_string()).collect(),
		retry_policy: None,
	}
}

/// Time-derived plan id; unique enough for an in-memory pipeline.
fn generate_plan_id() -> String {
	let now = std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap_or_default();
	format!("plan-{}-{}", now.as_secs(), now.subsec_nanos())
}

#[cfg(test)]
mod tests {
	use super::*;
	use pilot_types::Constraints;

	fn builder() -> PlanBuilder {
		PlanBuilder::new(WalletProfile::stub())
	}

	fn swap_intent() -> IntentSpec {
		IntentSpec {
			action_type: ActionType::Swap,
			chain: "evm".to_string(),
			asset_in: Some("USDC".to_string()),
			asset_out: Some("ETH".to_string()),
			amount: "200".to_string(),
			constraints: Some(Constraints {
				slippage: Some(0.5),
				deadline: None,
			}),
			target_protocol: Some("approve+swap".to_string()),
			recipient: None,
		}
	}

	fn send_native_intent() -> IntentSpec {
		IntentSpec {
			action_type: ActionType::Send,
			chain: "evm".to_string(),
			asset_in: Some("ETH".to_string()),
			asset_out: None,
			amount: "0.1".to_string(),
			constraints: None,
			target_protocol: None,
			recipient: Some("0x1111111111111111111111111111111111111111".to_string()),
		}
	}

	#[test]
	fn test_native_send_plan_shape() {
		let plan = builder().build(&send_native_intent()).unwrap();

		assert_eq!(
			plan.step_ids(),
			vec![
				steps::CHAIN_READ,
				steps::BUILD_SEND_TX,
				steps::SIMULATE_SEND_TX,
				steps::SIGN_SEND_TX,
				steps::SEND_SEND_TX,
				steps::WAIT_CONFIRM_SEND,
			]
		);

		// Native read: no token field, base-unit requirement, no allowance
		// probe without an approval.
		let read = plan.step(steps::CHAIN_READ).unwrap();
		assert!(read.input.get("token").is_none());
		assert!(read.input.get("required_allowance").is_none());
		assert_eq!(read.input["required_amount"], "100000000000000000");
		assert_eq!(read.postconditions, vec!["has_balance"]);

		// Native transfer moves value directly.
		let build = plan.step(steps::BUILD_SEND_TX).unwrap();
		assert_eq!(
			build.input["to"],
			"0x1111111111111111111111111111111111111111"
		);
		assert_eq!(build.input["data"], "0x");
		assert_eq!(build.input["value"], "100000000000000000");
		assert_eq!(build.preconditions, vec!["has_balance"]);

		let sign = plan.step(steps::SIGN_SEND_TX).unwrap();
		assert_eq!(sign.input["amount"], "100000000000000000");
		assert_eq!(sign.input["token"], "ETH");
		assert!(sign.input.get("spender").is_none());

		assert_eq!(plan.required_permissions.signatures, 1);
		assert!(plan.required_permissions.allowance.is_empty());
		assert!(plan.constraints.is_none());
	}

	#[test]
	fn test_token_send_moves_balance_via_calldata() {
		let mut intent = send_native_intent();
		intent.asset_in = Some("USDC".to_string());
		intent.amount = "5".to_string();

		let plan = builder().build(&intent).unwrap();
		let build = plan.step(steps::BUILD_SEND_TX).unwrap();

		// Destination is the token contract, not the recipient.
		assert_eq!(
			build.input["to"],
			"0x0000000000000000000000000000000000003003"
		);
		assert_eq!(build.input["value"], "0");
		let data = build.input["data"].as_str().unwrap();
		assert!(data.starts_with("0xa9059cbb"));

		let read = plan.step(steps::CHAIN_READ).unwrap();
		assert_eq!(read.input["required_amount"], "5000000");
		assert_eq!(
			read.input["token"],
			"0x0000000000000000000000000000000000003003"
		);
	}

	#[test]
	fn test_approve_swap_has_approval_subchain_and_two_signatures() {
		let plan = builder().build(&swap_intent()).unwrap();

		assert_eq!(
			plan.step_ids(),
			vec![
				steps::CHAIN_READ,
				steps::BUILD_APPROVE_TX,
				steps::SIMULATE_APPROVE_TX,
				steps::SIGN_APPROVE_TX,
				steps::SEND_APPROVE_TX,
				steps::WAIT_CONFIRM_APPROVE,
				steps::QUOTE_ROUTE,
				steps::BUILD_SWAP_TX,
				steps::SIMULATE_SWAP_TX,
				steps::SIGN_SWAP_TX,
				steps::SEND_SWAP_TX,
				steps::WAIT_CONFIRM_SWAP,
			]
		);

		let read = plan.step(steps::CHAIN_READ).unwrap();
		assert_eq!(read.input["required_allowance"], "200000000");
		assert_eq!(read.postconditions, vec!["has_balance"]);

		let approve = plan.step(steps::BUILD_APPROVE_TX).unwrap();
		let data = approve.input["data"].as_str().unwrap();
		assert!(data.starts_with("0x095ea7b3"));
		assert_eq!(approve.input["value"], "0");

		let quote = plan.step(steps::QUOTE_ROUTE).unwrap();
		assert_eq!(quote.preconditions, vec!["approve_confirmed"]);
		assert_eq!(quote.input["amount_in"], "200");
		assert_eq!(quote.input["slippage"], 0.5);

		let sign_swap = plan.step(steps::SIGN_SWAP_TX).unwrap();
		assert_eq!(sign_swap.input["amount"], "200000000");
		assert_eq!(
			sign_swap.input["spender"],
			"0x0000000000000000000000000000000000002002"
		);

		assert_eq!(plan.required_permissions.signatures, 2);
		assert_eq!(plan.required_permissions.allowance.len(), 1);
		let allowance = &plan.required_permissions.allowance[0];
		assert_eq!(allowance.token, "USDC");
		assert_eq!(
			allowance.spender,
			"0x0000000000000000000000000000000000002002"
		);
		assert_eq!(allowance.amount, "200000000");

		// Constraints carry over from the intent untouched.
		assert_eq!(plan.constraints.as_ref().unwrap().slippage, Some(0.5));
	}

	#[test]
	fn test_swap_without_protocol_hint_skips_approval() {
		let mut intent = swap_intent();
		intent.target_protocol = None;

		let plan = builder().build(&intent).unwrap();
		assert_eq!(
			plan.step_ids(),
			vec![
				steps::CHAIN_READ,
				steps::QUOTE_ROUTE,
				steps::BUILD_SWAP_TX,
				steps::SIMULATE_SWAP_TX,
				steps::SIGN_SWAP_TX,
				steps::SEND_SWAP_TX,
				steps::WAIT_CONFIRM_SWAP,
			]
		);

		let quote = plan.step(steps::QUOTE_ROUTE).unwrap();
		assert_eq!(quote.preconditions, vec!["has_balance"]);

		let sign_swap = plan.step(steps::SIGN_SWAP_TX).unwrap();
		assert!(sign_swap.input.get("spender").is_none());

		assert_eq!(plan.required_permissions.signatures, 1);
		assert!(plan.required_permissions.allowance.is_empty());
	}

	#[test]
	fn test_approve_intent_is_read_plus_approval_only() {
		let intent = IntentSpec {
			action_type: ActionType::Approve,
			chain: "evm".to_string(),
			asset_in: Some("USDC".to_string()),
			asset_out: None,
			amount: "50".to_string(),
			constraints: None,
			target_protocol: None,
			recipient: None,
		};

		let plan = builder().build(&intent).unwrap();
		assert_eq!(
			plan.step_ids(),
			vec![
				steps::CHAIN_READ,
				steps::BUILD_APPROVE_TX,
				steps::SIMULATE_APPROVE_TX,
				steps::SIGN_APPROVE_TX,
				steps::SEND_APPROVE_TX,
				steps::WAIT_CONFIRM_APPROVE,
			]
		);
		assert_eq!(plan.required_permissions.signatures, 1);
		assert_eq!(plan.required_permissions.allowance.len(), 1);
	}

	#[test]
	fn test_unbranch_action_builds_read_only_plan() {
		let intent = IntentSpec {
			action_type: ActionType::Stake,
			chain: "evm".to_string(),
			asset_in: Some("ETH".to_string()),
			asset_out: None,
			amount: "1".to_string(),
			constraints: None,
			target_protocol: None,
			recipient: None,
		};

		let plan = builder().build(&intent).unwrap();
		assert_eq!(plan.step_ids(), vec![steps::CHAIN_READ]);
		assert_eq!(plan.required_permissions.signatures, 1);
	}

	#[test]
	fn test_same_intent_builds_identical_plans() {
		let b = builder();
		let first = b.build(&swap_intent()).unwrap();
		let second = b.build(&swap_intent()).unwrap();
		assert_eq!(first.steps, second.steps);
		assert_eq!(first.required_permissions, second.required_permissions);
	}

	#[test]
	fn test_approval_without_asset_in_is_rejected() {
		let mut intent = send_native_intent();
		intent.asset_in = None;
		intent.target_protocol = Some("approve+swap".to_string());
		assert!(matches!(
			builder().build(&intent),
			Err(PlanError::UnplannableIntent(_))
		));
	}

	#[test]
	fn test_swap_without_asset_in_is_rejected() {
		let mut intent = swap_intent();
		intent.asset_in = None;
		assert!(matches!(
			builder().build(&intent),
			Err(PlanError::UnplannableIntent(_))
		));
	}

	#[test]
	fn test_swap_without_asset_out_is_rejected() {
		let mut intent = swap_intent();
		intent.asset_out = None;
		assert!(matches!(
			builder().build(&intent),
			Err(PlanError::UnplannableIntent(_))
		));
	}

	#[test]
	fn test_send_without_recipient_is_rejected() {
		let mut intent = send_native_intent();
		intent.recipient = None;
		assert!(matches!(
			builder().build(&intent),
			Err(PlanError::UnplannableIntent(_))
		));
	}

	#[test]
	fn test_send_with_malformed_recipient_is_rejected() {
		let mut intent = send_native_intent();
		intent.recipient = Some("bob".to_string());
		assert!(matches!(
			builder().build(&intent),
			Err(PlanError::UnplannableIntent(_))
		));
	}

	#[test]
	fn test_malformed_amount_is_rejected() {
		let mut intent = send_native_intent();
		intent.amount = "lots".to_string();
		assert!(matches!(builder().build(&intent), Err(PlanError::Amount(_))));

		intent.amount = "-1".to_string();
		assert!(matches!(builder().build(&intent), Err(PlanError::Amount(_))));
	}
}
