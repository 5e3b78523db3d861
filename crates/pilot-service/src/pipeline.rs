//! Assembly of the full pipeline from configuration.
//!
//! One [`Pipeline`] serves all requests: it resolves the message, mints a
//! consent scope sized to exactly the resolved intent, and runs a fresh
//! engine under that scope. Nothing about one request leaks into the
//! next; the scope is the only grant the signer ever sees.

use pilot_config::PilotConfig;
use pilot_engine::{EngineError, ExecutionEngine, ExecutionReport};
use pilot_intent::{IntentResolver, ModelClient, ModelConfig, ModelError, ResolveError};
use pilot_plan::{PlanBuilder, WalletProfile};
use pilot_signer::{implementations, PolicySigner, SignerError};
use pilot_tools::implementations::stub::create_stub_registry;
use pilot_types::{
	to_base_units, AmountError, ConsentScope, IntentSpec, Plan, RiskLevel, NATIVE_SYMBOL,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
	#[error(transparent)]
	Resolve(#[from] ResolveError),
	#[error(transparent)]
	Engine(#[from] EngineError),
	#[error("Signer init failed: {0}")]
	Signer(#[from] SignerError),
	#[error("Model client init failed: {0}")]
	Model(#[from] ModelError),
	#[error("Scope amount invalid: {0}")]
	Amount(#[from] AmountError),
}

impl PipelineError {
	/// Whether the request, rather than the service, is at fault.
	/// Broken template files are the operator's problem, not the caller's.
	pub fn is_client_error(&self) -> bool {
		match self {
			Self::Resolve(ResolveError::Template(_)) => false,
			Self::Resolve(_) => true,
			Self::Engine(EngineError::Plan(_)) => true,
			Self::Amount(_) => true,
			_ => false,
		}
	}

	/// Stable code for the error envelope.
	pub fn code(&self) -> &'static str {
		match self {
			Self::Resolve(error) => error.code(),
			Self::Engine(EngineError::Plan(_)) => "unplannable_intent",
			Self::Engine(_) => "internal",
			Self::Signer(_) => "signer_init_failed",
			Self::Model(_) => "model_init_failed",
			Self::Amount(_) => "invalid_amount",
		}
	}
}

/// One incoming request: free text or an already structured intent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentRequest {
	pub text: Option<String>,
	pub intent: Option<serde_json::Value>,
}

impl IntentRequest {
	pub fn from_text(text: impl Into<String>) -> Self {
		Self {
			text: Some(text.into()),
			intent: None,
		}
	}

	pub fn from_intent(intent: serde_json::Value) -> Self {
		Self {
			text: None,
			intent: Some(intent),
		}
	}
}

/// Response body of a plan request.
#[derive(Debug, Serialize)]
pub struct PlanOutcome {
	pub intent_spec: IntentSpec,
	pub plan: Plan,
	pub scope: ConsentScope,
}

/// Response body of an execute request: the report fields plus the
/// scope the run was granted.
#[derive(Debug, Serialize)]
pub struct ExecOutcome {
	#[serde(flatten)]
	pub report: ExecutionReport,
	pub scope: ConsentScope,
}

/// The configured pipeline behind the CLI and the HTTP API.
pub struct Pipeline {
	config: PilotConfig,
	resolver: IntentResolver,
}

impl Pipeline {
	pub fn new(config: PilotConfig) -> Result<Self, PipelineError> {
		let model = if config.resolver.model_enabled() {
			Some(ModelClient::new(ModelConfig {
				api_key: config.resolver.api_key.clone().unwrap_or_default(),
				model: config.resolver.model.clone(),
				base_url: config.resolver.base_url.clone(),
				timeout_secs: config.resolver.timeout_secs,
			})?)
		} else {
			None
		};
		let resolver = IntentResolver::new(model, config.resolver.template_file.clone());

		Ok(Self { config, resolver })
	}

	pub fn config(&self) -> &PilotConfig {
		&self.config
	}

	/// Resolves a request to an intent, structured payload first.
	pub async fn resolve(&self, request: &IntentRequest) -> Result<IntentSpec, PipelineError> {
		if let Some(intent) = &request.intent {
			return Ok(self.resolver.resolve_value(intent.clone())?);
		}
		match &request.text {
			Some(text) => Ok(self.resolver.resolve(text).await?),
			None => Err(ResolveError::EmptyInput.into()),
		}
	}

	/// Resolves and plans without touching the signer.
	pub async fn plan(&self, request: &IntentRequest) -> Result<PlanOutcome, PipelineError> {
		let intent = self.resolve(request).await?;
		let scope = self.mint_scope(&intent)?;
		let plan = self.engine(None).plan(&intent)?;
		Ok(PlanOutcome {
			intent_spec: intent,
			plan,
			scope,
		})
	}

	/// Resolves, plans and executes under a freshly minted scope.
	pub async fn execute(&self, request: &IntentRequest) -> Result<ExecOutcome, PipelineError> {
		let intent = self.resolve(request).await?;
		let scope = self.mint_scope(&intent)?;
		let signer = self.signer(scope.clone())?;
		let report = self.engine(Some(signer)).execute(&intent).await?;
		Ok(ExecOutcome { report, scope })
	}

	/// Mints the consent scope for one resolved intent: its chain, its
	/// spend token, its amount as the ceiling, expiry one session from
	/// now, and the configured spender as the only approvable contract.
	pub fn mint_scope(&self, intent: &IntentSpec) -> Result<ConsentScope, PipelineError> {
		let spend_symbol = intent.asset_in.as_deref().unwrap_or(NATIVE_SYMBOL);
		let profile = self.profile();
		let max_amount = to_base_units(&intent.amount, profile.decimals(spend_symbol))?.to_string();

		Ok(ConsentScope {
			chain: intent.chain.clone(),
			tokens: vec![spend_symbol.to_string()],
			max_amount,
			spender_allowlist: vec![self.config.wallet.spender.to_lowercase()],
			expiry: now_unix_ms() + self.config.wallet.session_ttl_ms as i64,
			risk_level: self.risk_level(),
		})
	}

	fn risk_level(&self) -> RiskLevel {
		match self.config.wallet.risk_level.as_str() {
			"high" => RiskLevel::High,
			"medium" => RiskLevel::Medium,
			_ => RiskLevel::Low,
		}
	}

	/// The planning profile: stub registry defaults with config overrides.
	fn profile(&self) -> WalletProfile {
		let mut profile = WalletProfile::stub();
		profile.wallet_address = self.config.wallet.address.clone();
		profile.swap_spender = self.config.wallet.spender.clone();
		for (symbol, address) in &self.config.tokens.addresses {
			profile
				.token_addresses
				.insert(symbol.to_ascii_uppercase(), address.clone());
		}
		for (symbol, decimals) in &self.config.tokens.decimals {
			profile
				.decimal_overrides
				.insert(symbol.to_ascii_uppercase(), *decimals);
		}
		profile
	}

	fn signer(&self, scope: ConsentScope) -> Result<Arc<PolicySigner>, PipelineError> {
		let mut table = self.config.signer.config.clone();
		table.insert(
			"backend".to_string(),
			toml::Value::String(self.config.signer.backend.clone()),
		);
		let backend = implementations::create_backend(&toml::Value::Table(table))?;
		Ok(Arc::new(PolicySigner::new(scope, backend)))
	}

	fn engine(&self, signer: Option<Arc<PolicySigner>>) -> ExecutionEngine {
		let builder = PlanBuilder::new(self.profile());
		ExecutionEngine::new(builder, create_stub_registry(), signer)
	}
}

fn now_unix_ms() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as i64
}
