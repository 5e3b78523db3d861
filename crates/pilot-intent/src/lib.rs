//! Natural-language intent resolution.
//!
//! Turns a user message into a structured [`IntentSpec`] in two stages.
//! A model stage asks an OpenAI-compatible endpoint for the intent when a
//! credential is configured; any failure there degrades silently to the
//! template stage, a deterministic pattern matcher over a small template
//! set. The same message always resolves to the same intent once the
//! model stage is out of the picture, which is what tests and offline
//! deployments run on.

pub mod aliases;
pub mod compiler;
pub mod model;
pub mod templates;

use pilot_types::IntentSpec;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

pub use model::{ModelClient, ModelConfig, ModelError, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use templates::{TemplateError, TemplateSet, TemplateStore};

use templates::CompiledTemplate;

/// Errors surfaced to callers of the resolver.
///
/// Unresolvable input and broken template files are distinct failures;
/// the first is the user's problem, the second the operator's.
#[derive(Debug, Error)]
pub enum ResolveError {
	#[error("Intent parse failed: empty_input")]
	EmptyInput,
	#[error("Intent parse failed: template_not_matched")]
	TemplateNotMatched,
	#[error(transparent)]
	Template(#[from] TemplateError),
	#[error("Intent payload invalid: {0}")]
	InvalidIntent(String),
}

impl ResolveError {
	/// Stable code for error envelopes.
	pub fn code(&self) -> &'static str {
		match self {
			Self::EmptyInput | Self::TemplateNotMatched | Self::InvalidIntent(_) => {
				"intent_parse_failed"
			}
			Self::Template(_) => "nl_template_invalid",
		}
	}
}

/// What the model stage produced for one message.
#[derive(Debug)]
enum ModelOutcome {
	/// No model is configured; the stage was skipped.
	NotConfigured,
	Resolved(IntentSpec),
	Failed(ModelError),
}

/// Two-stage resolver from free text to a structured intent.
pub struct IntentResolver {
	model: Option<ModelClient>,
	store: TemplateStore,
}

impl IntentResolver {
	/// A resolver with an optional model stage and an optional template
	/// file. Without a file the built-in send/swap set is used.
	pub fn new(model: Option<ModelClient>, template_path: Option<String>) -> Self {
		Self {
			model,
			store: TemplateStore::new(template_path),
		}
	}

	/// A fully deterministic resolver: no model, built-in templates.
	pub fn offline() -> Self {
		Self::new(None, None)
	}

	/// Resolves one message to an intent.
	pub async fn resolve(&self, text: &str) -> Result<IntentSpec, ResolveError> {
		let normalized = normalize_text(text);
		if normalized.is_empty() {
			return Err(ResolveError::EmptyInput);
		}

		match self.model_stage(&normalized).await {
			ModelOutcome::Resolved(intent) => {
				debug!(action = %intent.action_type, "Model resolved intent");
				return Ok(intent);
			}
			ModelOutcome::NotConfigured => {}
			ModelOutcome::Failed(error) => {
				warn!("Model stage failed, falling back to templates: {}", error);
			}
		}

		self.template_stage(&normalized).await
	}

	/// Accepts an already structured intent object.
	pub fn resolve_value(&self, value: Value) -> Result<IntentSpec, ResolveError> {
		serde_json::from_value(value).map_err(|e| ResolveError::InvalidIntent(e.to_string()))
	}

	async fn model_stage(&self, text: &str) -> ModelOutcome {
		let client = match &self.model {
			Some(client) => client,
			None => return ModelOutcome::NotConfigured,
		};
		match client.resolve_intent(text).await {
			Ok(intent) => ModelOutcome::Resolved(intent),
			Err(error) => ModelOutcome::Failed(error),
		}
	}

	async fn template_stage(&self, text: &str) -> Result<IntentSpec, ResolveError> {
		let set = self.store.get().await?;
		let candidate = match_templates(&set, text).ok_or(ResolveError::TemplateNotMatched)?;
		debug!(
			template = %candidate.template.id,
			score = candidate.score,
			"Template matched"
		);
		build_intent(&candidate)
	}
}

/// A template that matched, with its normalized captures and score.
struct Candidate<'a> {
	template: &'a CompiledTemplate,
	captures: HashMap<String, Value>,
	score: f64,
}

/// Trims, unifies separators, strips trailing sentence punctuation and
/// collapses whitespace runs.
fn normalize_text(text: &str) -> String {
	let replaced = text.replace('，', " ").replace('、', " ");
	let stripped = replaced
		.trim()
		.trim_end_matches(|c| matches!(c, '。' | '！' | '？' | '!' | '?'));
	stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Runs every pattern of every template and keeps the best candidate.
///
/// Score is the template's confidence plus the share of declared slots
/// the pattern captured. Later candidates replace earlier ones only when
/// strictly better, so ties go to file order and matching stays
/// deterministic.
fn match_templates<'a>(set: &'a TemplateSet, text: &str) -> Option<Candidate<'a>> {
	let mut best: Option<Candidate<'a>> = None;

	for template in &set.templates {
		for regex in &template.patterns {
			let caps = match regex.captures(text) {
				Some(caps) => caps,
				None => continue,
			};

			let mut captures = HashMap::new();
			for (name, slot) in &template.slots {
				if let Some(matched) = caps.name(name) {
					captures.insert(name.clone(), aliases::normalize_slot(slot, matched.as_str()));
				}
			}

			let slot_share = if template.slots.is_empty() {
				0.0
			} else {
				captures.len() as f64 / template.slots.len() as f64
			};
			let score = template.confidence + slot_share;

			let replace = match &best {
				Some(current) => score > current.score,
				None => true,
			};
			if replace {
				best = Some(Candidate {
					template,
					captures,
					score,
				});
			}
		}
	}

	best
}

/// Assembles the intent object from defaults and the mapping, then
/// validates it against the intent shape.
fn build_intent(candidate: &Candidate<'_>) -> Result<IntentSpec, ResolveError> {
	let mut root = serde_json::Map::new();

	for (path, value) in &candidate.template.defaults {
		set_path(&mut root, path, value.clone());
	}
	for (path, value) in &candidate.template.mapping {
		let resolved = match slot_ref(value) {
			Some(name) => match candidate.captures.get(name) {
				Some(captured) => captured.clone(),
				// An uncaptured slot reference leaves the field unset.
				None => continue,
			},
			None => value.clone(),
		};
		set_path(&mut root, path, resolved);
	}

	serde_json::from_value(Value::Object(root)).map_err(|e| {
		ResolveError::Template(TemplateError::IntentShape(format!(
			"{}: {}",
			candidate.template.id, e
		)))
	})
}

/// The slot name if the mapping value is a `{slot}` reference.
fn slot_ref(value: &Value) -> Option<&str> {
	let text = value.as_str()?;
	if text.len() > 2 && text.starts_with('{') && text.ends_with('}') {
		Some(&text[1..text.len() - 1])
	} else {
		None
	}
}

/// Writes a value at a dotted path, creating intermediate objects.
fn set_path(object: &mut serde_json::Map<String, Value>, path: &str, value: Value) {
	match path.split_once('.') {
		None => {
			object.insert(path.to_string(), value);
		}
		Some((head, rest)) => {
			let entry = object
				.entry(head.to_string())
				.or_insert_with(|| Value::Object(serde_json::Map::new()));
			if !entry.is_object() {
				*entry = Value::Object(serde_json::Map::new());
			}
			if let Some(map) = entry.as_object_mut() {
				set_path(map, rest, value);
			}
		}
	}
}
