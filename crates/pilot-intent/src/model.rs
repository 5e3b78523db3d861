//! Model-backed resolution stage.
//!
//! Talks to any OpenAI-compatible chat completions endpoint and asks for
//! the intent as strict JSON. The resolver treats every failure here as
//! a soft miss and falls through to template matching, so this client
//! never needs to be reachable for the pipeline to work.

use pilot_types::IntentSpec;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default endpoint when the configuration names none.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when the configuration names none.
pub const DEFAULT_MODEL: &str = "gpt-5.2";

const SYSTEM_PROMPT: &str =
	"你是钱包意图解析器。把用户自然语言转换成 IntentSpec JSON。只输出 JSON，不要解释。";

#[derive(Debug, Error)]
pub enum ModelError {
	#[error("Model request failed: {0}")]
	Request(String),
	#[error("Model returned status {status}: {payload}")]
	Status { status: u16, payload: String },
	#[error("Model response malformed: {0}")]
	Malformed(String),
}

/// Connection settings for the model stage.
#[derive(Debug, Clone)]
pub struct ModelConfig {
	pub api_key: String,
	pub model: String,
	pub base_url: String,
	pub timeout_secs: u64,
}

/// Client for one OpenAI-compatible endpoint.
pub struct ModelClient {
	config: ModelConfig,
	client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
	model: String,
	messages: Vec<ChatMessage>,
	temperature: f64,
	response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
	role: &'static str,
	content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
	choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
	message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
	content: String,
}

impl ModelClient {
	pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_secs))
			.build()
			.map_err(|e| ModelError::Request(e.to_string()))?;
		Ok(Self { config, client })
	}

	pub fn model(&self) -> &str {
		&self.config.model
	}

	/// Asks the model for the intent behind one message.
	pub async fn resolve_intent(&self, text: &str) -> Result<IntentSpec, ModelError> {
		let url = format!(
			"{}/chat/completions",
			self.config.base_url.trim_end_matches('/')
		);
		let request = ChatRequest {
			model: self.config.model.clone(),
			messages: vec![
				ChatMessage {
					role: "system",
					content: SYSTEM_PROMPT.to_string(),
				},
				ChatMessage {
					role: "user",
					content: text.to_string(),
				},
			],
			// Deterministic decoding; the same message should yield the same intent.
			temperature: 0.0,
			response_format: response_format(),
		};

		let response = self
			.client
			.post(&url)
			.header("Authorization", format!("Bearer {}", self.config.api_key))
			.json(&request)
			.send()
			.await
			.map_err(|e| ModelError::Request(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let payload = response.text().await.unwrap_or_default();
			return Err(ModelError::Status {
				status: status.as_u16(),
				payload,
			});
		}

		let body: ChatResponse = response
			.json()
			.await
			.map_err(|e| ModelError::Malformed(e.to_string()))?;
		let content = body
			.choices
			.first()
			.map(|choice| choice.message.content.as_str())
			.filter(|content| !content.is_empty())
			.ok_or_else(|| ModelError::Malformed("empty response".to_string()))?;

		serde_json::from_str(content).map_err(|e| ModelError::Malformed(e.to_string()))
	}
}

/// JSON schema the endpoint is asked to conform to. Closed properties so
/// the model cannot smuggle extra fields past intent validation.
fn response_format() -> serde_json::Value {
	serde_json::json!({
		"type": "json_schema",
		"json_schema": {
			"name": "IntentSpec",
			"schema": {
				"type": "object",
				"additionalProperties": false,
				"properties": {
					"action_type": {
						"type": "string",
						"enum": [
							"send",
							"swap",
							"approve",
							"revoke",
							"deposit",
							"stake",
							"withdraw",
							"unstake",
							"batch",
							"rebalance",
							"schedule"
						]
					},
					"chain": { "type": "string" },
					"asset_in": { "type": "string" },
					"asset_out": { "type": "string" },
					"amount": { "type": "string" },
					"constraints": {
						"type": "object",
						"additionalProperties": false,
						"properties": {
							"slippage": { "type": "number" },
							"deadline": { "type": "number" }
						}
					},
					"target_protocol": { "type": "string" },
					"recipient": { "type": "string" }
				},
				"required": ["action_type", "chain", "amount"]
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_response_format_closes_properties() {
		let format = response_format();
		assert_eq!(format["type"], "json_schema");
		assert_eq!(format["json_schema"]["name"], "IntentSpec");
		assert_eq!(
			format["json_schema"]["schema"]["additionalProperties"],
			serde_json::Value::Bool(false)
		);
		let actions = &format["json_schema"]["schema"]["properties"]["action_type"]["enum"];
		assert_eq!(actions.as_array().map(|a| a.len()), Some(11));
	}

	#[test]
	fn test_chat_response_content_parses_to_intent() {
		let raw = r#"{
			"choices": [{
				"message": {
					"role": "assistant",
					"content": "{\"action_type\":\"send\",\"chain\":\"evm\",\"asset_in\":\"ETH\",\"amount\":\"0.1\",\"recipient\":\"0x1111111111111111111111111111111111111111\"}"
				}
			}]
		}"#;
		let response: ChatResponse = serde_json::from_str(raw).unwrap();
		let intent: IntentSpec =
			serde_json::from_str(&response.choices[0].message.content).unwrap();
		assert_eq!(intent.amount, "0.1");
		assert_eq!(intent.asset_in.as_deref(), Some("ETH"));
	}

	#[test]
	fn test_client_builds_with_timeout() {
		let client = ModelClient::new(ModelConfig {
			api_key: "test-key".to_string(),
			model: DEFAULT_MODEL.to_string(),
			base_url: DEFAULT_BASE_URL.to_string(),
			timeout_secs: 5,
		});
		assert!(client.is_ok());
	}
}
