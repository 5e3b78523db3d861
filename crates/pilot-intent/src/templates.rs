//! Template definitions for deterministic intent matching.
//!
//! Templates load from a JSON file, validate fail-fast, and compile their
//! patterns once. The compiled set is cached inside the resolver that owns
//! it, never in module globals, so two resolvers reading different files
//! cannot observe each other's templates.

use crate::compiler;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Built-in send/swap templates used when no file is configured.
const DEFAULT_TEMPLATES: &str = include_str!("../templates/send_swap.json");

/// Score contribution of a template that declares no confidence.
const DEFAULT_CONFIDENCE: f64 = 0.6;

/// Problems with a template file. Every variant is a load-time failure;
/// a file that produces one is rejected as a whole.
#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("Template file unreadable: {0}")]
	Io(String),
	#[error("Template file is not JSON: {0}")]
	Parse(String),
	/// The JSON does not describe a valid template set. The reason is a
	/// stable machine-checkable string such as `template_2_patterns` or
	/// `slot_not_defined:asset`.
	#[error("nl_template_invalid:{0}")]
	Invalid(String),
	/// A matched template assembled a payload the intent shape rejects.
	#[error("Template produced an invalid intent: {0}")]
	IntentShape(String),
}

fn invalid(reason: impl Into<String>) -> TemplateError {
	TemplateError::Invalid(reason.into())
}

/// One template as written in the file, shape-checked but not compiled.
#[derive(Debug, Clone)]
pub struct RawTemplate {
	pub id: String,
	pub intent_type: String,
	pub language: Option<String>,
	pub patterns: Vec<String>,
	pub slots: HashMap<String, RawSlot>,
	pub mapping: HashMap<String, Value>,
	pub defaults: HashMap<String, Value>,
	pub confidence: Option<f64>,
}

/// A slot declaration as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSlot {
	#[serde(rename = "type", default)]
	pub slot_type: Option<String>,
	#[serde(default)]
	pub aliases: HashMap<String, String>,
}

/// Kinds of values a slot can capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
	Amount,
	Asset,
	Address,
	Chain,
	Slippage,
	/// Fallback for missing or unrecognized type names; captures free
	/// text so newer template files keep working on older builds.
	Text,
}

impl SlotType {
	pub fn from_name(name: Option<&str>) -> Self {
		match name {
			Some("amount") => Self::Amount,
			Some("asset") => Self::Asset,
			Some("address") => Self::Address,
			Some("chain") => Self::Chain,
			Some("slippage") => Self::Slippage,
			_ => Self::Text,
		}
	}

	/// Regex body a capture of this type matches.
	pub fn pattern_body(&self) -> &'static str {
		match self {
			Self::Amount => r"[0-9]+(?:\.[0-9]+)?",
			Self::Asset => r"[A-Za-z0-9]+",
			Self::Address => r"0x[a-fA-F0-9]{40}",
			Self::Chain => r"[A-Za-z0-9_-]+",
			Self::Slippage => r"[0-9]+(?:\.[0-9]+)?%?",
			Self::Text => r".+",
		}
	}
}

/// A validated slot declaration.
#[derive(Debug, Clone)]
pub struct SlotSpec {
	pub slot_type: SlotType,
	/// Slot-local aliases, keyed by lowercased surface form.
	pub aliases: HashMap<String, String>,
}

/// A template with its patterns compiled to anchored regexes.
#[derive(Debug)]
pub struct CompiledTemplate {
	pub id: String,
	pub intent_type: String,
	pub confidence: f64,
	pub patterns: Vec<regex::Regex>,
	pub slots: HashMap<String, SlotSpec>,
	pub mapping: HashMap<String, Value>,
	pub defaults: HashMap<String, Value>,
}

/// A compiled set of templates, in file order.
#[derive(Debug)]
pub struct TemplateSet {
	pub templates: Vec<CompiledTemplate>,
}

impl TemplateSet {
	/// Parses, validates and compiles a template file from a JSON string.
	pub fn parse(raw: &str) -> Result<Self, TemplateError> {
		let value: Value =
			serde_json::from_str(raw).map_err(|e| TemplateError::Parse(e.to_string()))?;
		Self::compile(validate_file(&value)?)
	}

	/// The built-in send/swap template set.
	pub fn built_in() -> Result<Self, TemplateError> {
		Self::parse(DEFAULT_TEMPLATES)
	}

	/// Reads, parses and compiles a template file.
	pub async fn load(path: &str) -> Result<Self, TemplateError> {
		let raw = tokio::fs::read_to_string(path)
			.await
			.map_err(|e| TemplateError::Io(format!("{}: {}", path, e)))?;
		Self::parse(&raw)
	}

	fn compile(raw_templates: Vec<RawTemplate>) -> Result<Self, TemplateError> {
		let mut templates = Vec::with_capacity(raw_templates.len());

		for raw in raw_templates {
			let mut slots = HashMap::new();
			for (name, slot) in &raw.slots {
				let aliases = slot
					.aliases
					.iter()
					.map(|(surface, canonical)| (surface.to_lowercase(), canonical.clone()))
					.collect();
				slots.insert(
					name.clone(),
					SlotSpec {
						slot_type: SlotType::from_name(slot.slot_type.as_deref()),
						aliases,
					},
				);
			}

			let mut patterns = Vec::with_capacity(raw.patterns.len());
			for pattern in &raw.patterns {
				patterns.push(compiler::compile_pattern(pattern, &slots)?);
			}

			templates.push(CompiledTemplate {
				id: raw.id,
				intent_type: raw.intent_type,
				confidence: raw.confidence.unwrap_or(DEFAULT_CONFIDENCE),
				patterns,
				slots,
				mapping: raw.mapping,
				defaults: raw.defaults,
			});
		}

		Ok(Self { templates })
	}
}

/// Shape-checks the parsed file, labelling problems with the index of the
/// offending template. Duplicate ids are allowed; every entry competes on
/// score regardless of its name.
fn validate_file(value: &Value) -> Result<Vec<RawTemplate>, TemplateError> {
	let entries = match value {
		Value::Object(root) => match root.get("templates") {
			Some(Value::Array(entries)) => entries,
			_ => return Err(invalid("missing_templates")),
		},
		// An array is object-shaped but has no `templates` member.
		Value::Array(_) => return Err(invalid("missing_templates")),
		_ => return Err(invalid("root_not_object")),
	};

	entries
		.iter()
		.enumerate()
		.map(|(index, entry)| validate_template(index, entry))
		.collect()
}

fn validate_template(index: usize, entry: &Value) -> Result<RawTemplate, TemplateError> {
	let object = entry
		.as_object()
		.ok_or_else(|| invalid(format!("template_{}_not_object", index)))?;

	let id = object
		.get("id")
		.and_then(Value::as_str)
		.filter(|id| !id.is_empty())
		.ok_or_else(|| invalid(format!("template_{}_id", index)))?;

	let intent_type = object
		.get("intent_type")
		.and_then(Value::as_str)
		.filter(|kind| matches!(*kind, "send" | "swap"))
		.ok_or_else(|| invalid(format!("template_{}_intent_type", index)))?;

	let patterns = object
		.get("patterns")
		.and_then(Value::as_array)
		.filter(|patterns| !patterns.is_empty())
		.and_then(|patterns| {
			patterns
				.iter()
				.map(|pattern| pattern.as_str().map(str::to_string))
				.collect::<Option<Vec<_>>>()
		})
		.ok_or_else(|| invalid(format!("template_{}_patterns", index)))?;

	let slots = object
		.get("slots")
		.and_then(Value::as_object)
		.ok_or_else(|| invalid(format!("template_{}_slots", index)))?
		.iter()
		.map(|(name, spec)| {
			serde_json::from_value::<RawSlot>(spec.clone())
				.map(|slot| (name.clone(), slot))
				.map_err(|_| invalid(format!("template_{}_slots", index)))
		})
		.collect::<Result<HashMap<_, _>, _>>()?;

	let mapping = object
		.get("mapping")
		.and_then(Value::as_object)
		.ok_or_else(|| invalid(format!("template_{}_mapping", index)))?
		.iter()
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect();

	let defaults = match object.get("defaults") {
		None => HashMap::new(),
		Some(defaults) => defaults
			.as_object()
			.map(|map| {
				map.iter()
					.map(|(key, value)| (key.clone(), value.clone()))
					.collect()
			})
			.ok_or_else(|| invalid(format!("template_{}_defaults", index)))?,
	};

	Ok(RawTemplate {
		id: id.to_string(),
		intent_type: intent_type.to_string(),
		language: object
			.get("language")
			.and_then(Value::as_str)
			.map(str::to_string),
		patterns,
		slots,
		mapping,
		defaults,
		confidence: object.get("confidence").and_then(Value::as_f64),
	})
}

/// Lazily loaded, cached template set for one resolver instance.
pub struct TemplateStore {
	path: Option<String>,
	cache: RwLock<Option<Arc<TemplateSet>>>,
}

impl TemplateStore {
	/// A store reading from `path`, or the built-in set when `None`.
	pub fn new(path: Option<String>) -> Self {
		Self {
			path,
			cache: RwLock::new(None),
		}
	}

	/// The compiled set, loading it on first use.
	pub async fn get(&self) -> Result<Arc<TemplateSet>, TemplateError> {
		if let Some(set) = self.cache.read().await.as_ref() {
			return Ok(set.clone());
		}

		let set = Arc::new(match &self.path {
			Some(path) => TemplateSet::load(path).await?,
			None => TemplateSet::built_in()?,
		});
		*self.cache.write().await = Some(set.clone());
		Ok(set)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_built_in_set_compiles() {
		let set = TemplateSet::built_in().unwrap();
		assert!(set.templates.len() >= 6);
		assert!(set.templates.iter().any(|t| t.id == "send_en"));
		assert!(set.templates.iter().any(|t| t.id == "swap_zh"));
		for template in &set.templates {
			assert!(!template.patterns.is_empty());
		}
	}

	#[test]
	fn test_non_object_root_is_rejected() {
		let error = TemplateSet::parse("42").unwrap_err();
		assert!(error.to_string().contains("root_not_object"));

		// An array root is object-shaped but lacks the templates member.
		let error = TemplateSet::parse("[]").unwrap_err();
		assert!(error.to_string().contains("missing_templates"));

		let error = TemplateSet::parse(r#"{"other": 1}"#).unwrap_err();
		assert!(error.to_string().contains("missing_templates"));
	}

	#[test]
	fn test_reasons_carry_the_template_index() {
		let missing_id = r#"{"templates": [
			{"id": "ok", "intent_type": "send", "patterns": ["x"], "slots": {}, "mapping": {}},
			{"intent_type": "send", "patterns": ["x"], "slots": {}, "mapping": {}}
		]}"#;
		let error = TemplateSet::parse(missing_id).unwrap_err();
		assert!(error.to_string().contains("template_1_id"));

		let bad_kind = r#"{"templates": [
			{"id": "a", "intent_type": "stake", "patterns": ["x"], "slots": {}, "mapping": {}}
		]}"#;
		let error = TemplateSet::parse(bad_kind).unwrap_err();
		assert!(error.to_string().contains("template_0_intent_type"));

		let no_slots = r#"{"templates": [
			{"id": "a", "intent_type": "send", "patterns": ["x"], "mapping": {}}
		]}"#;
		let error = TemplateSet::parse(no_slots).unwrap_err();
		assert!(error.to_string().contains("template_0_slots"));

		let no_mapping = r#"{"templates": [
			{"id": "a", "intent_type": "send", "patterns": ["x"], "slots": {}}
		]}"#;
		let error = TemplateSet::parse(no_mapping).unwrap_err();
		assert!(error.to_string().contains("template_0_mapping"));
	}

	#[test]
	fn test_template_without_patterns_is_rejected() {
		let raw = r#"{"templates": [
			{"id": "a", "intent_type": "send", "patterns": [], "slots": {}, "mapping": {}}
		]}"#;
		let error = TemplateSet::parse(raw).unwrap_err();
		assert!(error.to_string().contains("template_0_patterns"));
	}

	#[test]
	fn test_duplicate_ids_both_compile() {
		let raw = r#"{"templates": [
			{"id": "a", "intent_type": "send", "patterns": ["x"], "slots": {}, "mapping": {}},
			{"id": "a", "intent_type": "send", "patterns": ["y"], "slots": {}, "mapping": {}}
		]}"#;
		let set = TemplateSet::parse(raw).unwrap();
		assert_eq!(set.templates.len(), 2);
	}

	#[test]
	fn test_unknown_slot_type_captures_free_text() {
		let raw = r#"{"templates": [
			{
				"id": "a",
				"intent_type": "send",
				"patterns": ["send {thing}"],
				"slots": {"thing": {"type": "emoji"}},
				"mapping": {}
			}
		]}"#;
		let set = TemplateSet::parse(raw).unwrap();
		let template = &set.templates[0];
		assert_eq!(template.slots["thing"].slot_type, SlotType::Text);
		assert!(template.patterns[0].is_match("send anything at all"));
	}

	#[test]
	fn test_pattern_with_undeclared_slot_is_rejected() {
		let raw = r#"{"templates": [
			{
				"id": "a",
				"intent_type": "send",
				"patterns": ["send {amount} {asset}"],
				"slots": {"amount": {"type": "amount"}},
				"mapping": {}
			}
		]}"#;
		let error = TemplateSet::parse(raw).unwrap_err();
		assert!(error.to_string().contains("slot_not_defined:asset"));
	}

	#[test]
	fn test_slot_aliases_are_lowercased() {
		let raw = r#"{"templates": [
			{
				"id": "a",
				"intent_type": "send",
				"patterns": ["send {asset}"],
				"slots": {"asset": {"type": "asset", "aliases": {"Ether": "ETH"}}},
				"mapping": {}
			}
		]}"#;
		let set = TemplateSet::parse(raw).unwrap();
		let slot = &set.templates[0].slots["asset"];
		assert_eq!(slot.aliases.get("ether"), Some(&"ETH".to_string()));
	}

	#[tokio::test]
	async fn test_store_falls_back_to_built_in() {
		let store = TemplateStore::new(None);
		let set = store.get().await.unwrap();
		assert!(!set.templates.is_empty());
		// Second read hits the cache and returns the same set.
		let again = store.get().await.unwrap();
		assert!(Arc::ptr_eq(&set, &again));
	}

	#[tokio::test]
	async fn test_store_reports_missing_file() {
		let store = TemplateStore::new(Some("/nonexistent/templates.json".to_string()));
		let error = store.get().await.unwrap_err();
		assert!(matches!(error, TemplateError::Io(_)));
	}
}
