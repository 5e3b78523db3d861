//! Deterministic stub implementations of the tool set.
//!
//! These handlers touch no network and no chain. Reads report a large
//! fixed balance, quotes echo their input, and submission returns a hash
//! derived from the signed artifact, so a full plan can execute end to end
//! with reproducible outputs. Only `sign_tx` has a real dependency: it
//! forwards to the policy signer from the dispatch context.

use alloy_primitives::keccak256;
use async_trait::async_trait;
use pilot_types::{Field, FieldType, Schema, SignRequest};
use std::sync::Arc;

use crate::{CostEstimate, ToolContext, ToolError, ToolInterface, ToolRegistry};

/// Balance and allowance every stub read reports, in base units. Large
/// enough that realistic display amounts pass sufficiency checks.
pub const STUB_BALANCE: &str = "1000000000000000000000000";

/// Gas limit the stub builder attaches to every transaction.
const STUB_GAS_LIMIT: &str = "21000";

/// Reads balances, nonces and allowances. Stub: fixed values.
pub struct ChainRead;

#[async_trait]
impl ToolInterface for ChainRead {
	fn name(&self) -> &str {
		pilot_types::tools::CHAIN_READ
	}

	fn input_schema(&self) -> Schema {
		Schema::new(
			vec![Field::new("address", FieldType::String)],
			vec![
				Field::new("token", FieldType::String),
				Field::new("spender", FieldType::String),
				Field::new("required_amount", FieldType::String),
				Field::new("required_allowance", FieldType::String),
			],
		)
	}

	fn output_schema(&self) -> Schema {
		Schema::new(
			vec![Field::new("balance", FieldType::String)],
			vec![
				Field::new("nonce", FieldType::Integer { min: Some(0), max: None }),
				Field::new("allowance", FieldType::String),
			],
		)
	}

	fn is_retryable(&self) -> bool {
		true
	}

	async fn execute(
		&self,
		input: &serde_json::Value,
		_ctx: &ToolContext,
	) -> Result<serde_json::Value, ToolError> {
		let mut output = serde_json::json!({
			"balance": STUB_BALANCE,
			"nonce": 0,
		});
		// Allowance is only meaningful when the caller asked about a spender.
		if input.get("spender").is_some() {
			output["allowance"] = serde_json::Value::String(STUB_BALANCE.to_string());
		}
		Ok(output)
	}
}

/// Quotes a swap route. Stub: one-to-one rate over a single-hop route.
pub struct QuoteRoute;

#[async_trait]
impl ToolInterface for QuoteRoute {
	fn name(&self) -> &str {
		pilot_types::tools::QUOTE_ROUTE
	}

	fn input_schema(&self) -> Schema {
		Schema::new(
			vec![
				Field::new("asset_in", FieldType::String),
				Field::new("asset_out", FieldType::String),
				Field::new("amount_in", FieldType::String),
			],
			vec![Field::new("slippage", FieldType::Number)],
		)
	}

	fn output_schema(&self) -> Schema {
		Schema::new(
			vec![
				Field::new("amount_out", FieldType::String),
				Field::new("route", FieldType::Array(Box::new(FieldType::String))),
			],
			vec![],
		)
	}

	fn cost_estimate(&self) -> CostEstimate {
		CostEstimate::Medium
	}

	fn is_retryable(&self) -> bool {
		true
	}

	async fn execute(
		&self,
		input: &serde_json::Value,
		_ctx: &ToolContext,
	) -> Result<serde_json::Value, ToolError> {
		let amount_in = input
			.get("amount_in")
			.and_then(|v| v.as_str())
			.ok_or_else(|| ToolError::InvalidInput {
				tool: self.name().to_string(),
				message: "amount_in must be a string".to_string(),
			})?;

		Ok(serde_json::json!({
			"amount_out": amount_in,
			"route": ["stub"],
		}))
	}
}

/// Assembles an unsigned transaction. Stub: echoes the draft and attaches
/// a flat gas limit.
pub struct BuildTx;

#[async_trait]
impl ToolInterface for BuildTx {
	fn name(&self) -> &str {
		pilot_types::tools::BUILD_TX
	}

	fn input_schema(&self) -> Schema {
		Schema::new(
			vec![
				Field::new("to", FieldType::String),
				Field::new("data", FieldType::String),
			],
			vec![Field::new("value", FieldType::String)],
		)
	}

	fn output_schema(&self) -> Schema {
		Schema::new(
			vec![
				Field::new("to", FieldType::String),
				Field::new("data", FieldType::String),
			],
			vec![
				Field::new("value", FieldType::String),
				Field::new("gas_limit", FieldType::String),
			],
		)
	}

	fn cost_estimate(&self) -> CostEstimate {
		CostEstimate::Medium
	}

	fn is_retryable(&self) -> bool {
		true
	}

	async fn execute(
		&self,
		input: &serde_json::Value,
		_ctx: &ToolContext,
	) -> Result<serde_json::Value, ToolError> {
		let mut output = input.as_object().cloned().unwrap_or_default();
		output.insert(
			"gas_limit".to_string(),
			serde_json::Value::String(STUB_GAS_LIMIT.to_string()),
		);
		Ok(serde_json::Value::Object(output))
	}
}

/// Simulates a built transaction. Stub: always succeeds with zero gas.
pub struct SimulateTx;

#[async_trait]
impl ToolInterface for SimulateTx {
	fn name(&self) -> &str {
		pilot_types::tools::SIMULATE_TX
	}

	fn input_schema(&self) -> Schema {
		Schema::new(
			vec![
				Field::new("to", FieldType::String),
				Field::new("data", FieldType::String),
			],
			vec![Field::new("value", FieldType::String)],
		)
	}

	fn output_schema(&self) -> Schema {
		Schema::new(
			vec![Field::new("success", FieldType::Boolean)],
			vec![
				Field::new("gas_used", FieldType::String),
				Field::new("error", FieldType::String),
			],
		)
	}

	fn cost_estimate(&self) -> CostEstimate {
		CostEstimate::Medium
	}

	fn is_retryable(&self) -> bool {
		true
	}

	async fn execute(
		&self,
		_input: &serde_json::Value,
		_ctx: &ToolContext,
	) -> Result<serde_json::Value, ToolError> {
		Ok(serde_json::json!({
			"success": true,
			"gas_used": "0",
		}))
	}
}

/// Signs a built transaction through the policy signer in the context.
pub struct SignTx;

#[async_trait]
impl ToolInterface for SignTx {
	fn name(&self) -> &str {
		pilot_types::tools::SIGN_TX
	}

	fn input_schema(&self) -> Schema {
		Schema::new(
			vec![
				Field::new("chain", FieldType::String),
				Field::new("to", FieldType::String),
				Field::new("data", FieldType::String),
			],
			vec![
				Field::new("value", FieldType::String),
				Field::new("token", FieldType::String),
				Field::new("amount", FieldType::String),
				Field::new("spender", FieldType::String),
			],
		)
	}

	fn output_schema(&self) -> Schema {
		Schema::new(vec![Field::new("signed_tx", FieldType::String)], vec![])
	}

	fn requires_signature(&self) -> bool {
		true
	}

	fn required_permissions(&self) -> Vec<String> {
		vec!["sign".to_string()]
	}

	async fn execute(
		&self,
		input: &serde_json::Value,
		ctx: &ToolContext,
	) -> Result<serde_json::Value, ToolError> {
		let signer = ctx.signer.as_ref().ok_or(ToolError::SignerUnavailable)?;

		// The plan sets the chain explicitly; fall back to the run's chain.
		let mut payload = input.as_object().cloned().unwrap_or_default();
		payload
			.entry("chain".to_string())
			.or_insert_with(|| serde_json::Value::String(ctx.chain.clone()));
		let request: SignRequest = serde_json::from_value(serde_json::Value::Object(payload))
			.map_err(|e| ToolError::InvalidInput {
				tool: self.name().to_string(),
				message: e.to_string(),
			})?;

		let signed = signer.sign(&request).await?;
		Ok(serde_json::json!({ "signed_tx": signed.signed_tx }))
	}
}

/// Broadcasts a signed transaction. Stub: the hash is the keccak digest of
/// the artifact text, so resubmitting the same artifact yields the same
/// hash.
pub struct SendTx;

#[async_trait]
impl ToolInterface for SendTx {
	fn name(&self) -> &str {
		pilot_types::tools::SEND_TX
	}

	fn input_schema(&self) -> Schema {
		Schema::new(vec![Field::new("signed_tx", FieldType::String)], vec![])
	}

	fn output_schema(&self) -> Schema {
		Schema::new(vec![Field::new("tx_hash", FieldType::String)], vec![])
	}

	fn is_retryable(&self) -> bool {
		true
	}

	async fn execute(
		&self,
		input: &serde_json::Value,
		_ctx: &ToolContext,
	) -> Result<serde_json::Value, ToolError> {
		let signed_tx = input
			.get("signed_tx")
			.and_then(|v| v.as_str())
			.ok_or_else(|| ToolError::InvalidInput {
				tool: self.name().to_string(),
				message: "signed_tx must be a string".to_string(),
			})?;

		let digest = keccak256(signed_tx.as_bytes());
		Ok(serde_json::json!({
			"tx_hash": format!("0x{}", hex::encode(digest)),
		}))
	}
}

/// Waits for confirmation. Stub: confirms immediately with a minimal
/// receipt echoing the hash.
pub struct WaitConfirm;

#[async_trait]
impl ToolInterface for WaitConfirm {
	fn name(&self) -> &str {
		pilot_types::tools::WAIT_CONFIRM
	}

	fn input_schema(&self) -> Schema {
		Schema::new(vec![Field::new("tx_hash", FieldType::String)], vec![])
	}

	fn output_schema(&self) -> Schema {
		Schema::new(
			vec![Field::new("status", FieldType::String)],
			vec![Field::new(
				"receipt",
				FieldType::Object(Schema::new(vec![], vec![])),
			)],
		)
	}

	fn is_retryable(&self) -> bool {
		true
	}

	async fn execute(
		&self,
		input: &serde_json::Value,
		_ctx: &ToolContext,
	) -> Result<serde_json::Value, ToolError> {
		let tx_hash = input
			.get("tx_hash")
			.and_then(|v| v.as_str())
			.ok_or_else(|| ToolError::InvalidInput {
				tool: self.name().to_string(),
				message: "tx_hash must be a string".to_string(),
			})?;

		Ok(serde_json::json!({
			"status": "confirmed",
			"receipt": { "tx_hash": tx_hash },
		}))
	}
}

/// Builds the full stub tool set.
pub fn create_stub_registry() -> ToolRegistry {
	let mut registry = ToolRegistry::new();
	registry.register(Arc::new(ChainRead));
	registry.register(Arc::new(QuoteRoute));
	registry.register(Arc::new(BuildTx));
	registry.register(Arc::new(SimulateTx));
	registry.register(Arc::new(SignTx));
	registry.register(Arc::new(SendTx));
	registry.register(Arc::new(WaitConfirm));
	registry
}

#[cfg(test)]
mod tests {
	use super::*;
	use pilot_signer::implementations::stub::StubSigner;
	use pilot_signer::PolicySigner;
	use pilot_types::{ConsentScope, ErrorKind, RiskLevel};

	fn ctx_without_signer() -> ToolContext {
		ToolContext::new("evm", None)
	}

	fn ctx_with_signer(scope: ConsentScope) -> ToolContext {
		let signer = PolicySigner::new(scope, Box::new(StubSigner::new()));
		ToolContext::new("evm", Some(Arc::new(signer)))
	}

	fn scope() -> ConsentScope {
		ConsentScope {
			chain: "evm".to_string(),
			tokens: vec!["USDC".to_string()],
			max_amount: "1000000000".to_string(),
			spender_allowlist: vec!["0x0000000000000000000000000000000000002002".to_string()],
			expiry: 4_102_444_800_000,
			risk_level: RiskLevel::Low,
		}
	}

	#[tokio::test]
	async fn test_chain_read_reports_allowance_only_when_asked() {
		let tool = ChainRead;
		let ctx = ctx_without_signer();

		let bare = serde_json::json!({ "address": "0xabc" });
		let output = tool.execute(&bare, &ctx).await.unwrap();
		assert_eq!(output["balance"], STUB_BALANCE);
		assert!(output.get("allowance").is_none());

		let with_spender = serde_json::json!({
			"address": "0xabc",
			"spender": "0x0000000000000000000000000000000000002002",
		});
		let output = tool.execute(&with_spender, &ctx).await.unwrap();
		assert_eq!(output["allowance"], STUB_BALANCE);
	}

	#[tokio::test]
	async fn test_build_tx_echoes_draft_with_gas() {
		let tool = BuildTx;
		let input = serde_json::json!({
			"to": "0x0000000000000000000000000000000000003003",
			"data": "0xabcdef",
			"value": "0",
		});
		let output = tool.execute(&input, &ctx_without_signer()).await.unwrap();
		assert_eq!(output["to"], input["to"]);
		assert_eq!(output["data"], input["data"]);
		assert_eq!(output["gas_limit"], "21000");
	}

	#[tokio::test]
	async fn test_sign_tx_requires_signer_in_context() {
		let tool = SignTx;
		let input = serde_json::json!({
			"chain": "evm",
			"to": "0x0000000000000000000000000000000000003003",
			"data": "0x",
		});
		let err = tool.execute(&input, &ctx_without_signer()).await.unwrap_err();
		assert!(matches!(err, ToolError::SignerUnavailable));
	}

	#[tokio::test]
	async fn test_sign_tx_signs_within_scope() {
		let tool = SignTx;
		let ctx = ctx_with_signer(scope());
		let input = serde_json::json!({
			"to": "0x0000000000000000000000000000000000003003",
			"data": "0x095ea7b3",
			"value": "0",
			"token": "USDC",
			"amount": "200000000",
			"spender": "0x0000000000000000000000000000000000002002",
		});

		let output = tool.execute(&input, &ctx).await.unwrap();
		let signed = output["signed_tx"].as_str().unwrap();
		assert!(signed.starts_with("0x"));
	}

	#[tokio::test]
	async fn test_sign_tx_fills_chain_from_context() {
		let tool = SignTx;
		let ctx = ctx_with_signer(scope());
		// No chain key: the run's chain applies, and it matches the scope.
		let input = serde_json::json!({
			"to": "0x0000000000000000000000000000000000003003",
			"data": "0x",
		});
		assert!(tool.execute(&input, &ctx).await.is_ok());
	}

	#[tokio::test]
	async fn test_sign_tx_surfaces_policy_denial() {
		let tool = SignTx;
		let ctx = ctx_with_signer(scope());
		let input = serde_json::json!({
			"to": "0x0000000000000000000000000000000000003003",
			"data": "0x",
			"token": "DAI",
		});

		let err = tool.execute(&input, &ctx).await.unwrap_err();
		assert_eq!(err.code(), ErrorKind::TokenNotAllowed.code());
	}

	#[tokio::test]
	async fn test_send_tx_hash_is_deterministic() {
		let tool = SendTx;
		let input = serde_json::json!({ "signed_tx": "0xdeadbeef" });
		let first = tool.execute(&input, &ctx_without_signer()).await.unwrap();
		let second = tool.execute(&input, &ctx_without_signer()).await.unwrap();
		assert_eq!(first, second);
		let hash = first["tx_hash"].as_str().unwrap();
		assert!(hash.starts_with("0x"));
		assert_eq!(hash.len(), 66);
	}

	#[tokio::test]
	async fn test_wait_confirm_echoes_hash_into_receipt() {
		let tool = WaitConfirm;
		let input = serde_json::json!({ "tx_hash": "0xabc123" });
		let output = tool.execute(&input, &ctx_without_signer()).await.unwrap();
		assert_eq!(output["status"], "confirmed");
		assert_eq!(output["receipt"]["tx_hash"], "0xabc123");
	}

	#[test]
	fn test_only_signing_costs_a_signature() {
		let registry = create_stub_registry();
		let needs: Vec<String> = registry
			.names()
			.into_iter()
			.filter(|name| registry.get(name).unwrap().requires_signature())
			.collect();
		assert_eq!(needs, vec!["sign_tx"]);
	}

	#[test]
	fn test_signing_is_the_only_non_retryable_tool() {
		let registry = create_stub_registry();
		let frozen: Vec<String> = registry
			.names()
			.into_iter()
			.filter(|name| !registry.get(name).unwrap().is_retryable())
			.collect();
		assert_eq!(frozen, vec!["sign_tx"]);
	}

	#[test]
	fn test_stub_registry_contains_the_full_set() {
		let registry = create_stub_registry();
		assert_eq!(
			registry.names(),
			vec![
				"build_tx",
				"chain_read",
				"quote_route",
				"send_tx",
				"sign_tx",
				"simulate_tx",
				"wait_confirm",
			]
		);
	}
}
