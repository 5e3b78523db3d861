//! Declarative validation utilities for the wallet pilot.
//!
//! The same schema machinery validates tool inputs/outputs (JSON objects)
//! and implementation config (TOML tables, converted to JSON first via
//! [`toml_to_json`]).

use thiserror::Error;

/// Errors that can occur during schema validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// Error that occurs when conversion or deserialization fails.
	#[error("Failed to deserialize value: {0}")]
	DeserializationError(String),
}

/// Type of a schema field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Number,
	Boolean,
	Array(Box<FieldType>),
	Object(Schema),
	/// Accepts any value; for passthrough fields like receipts.
	Any,
}

/// Type alias for field validator functions.
pub type FieldValidator = Box<dyn Fn(&serde_json::Value) -> Result<(), String> + Send + Sync>;

/// A field definition with name and type.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&serde_json::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// Schema definition with required and optional fields.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a JSON value against this schema.
	pub fn validate(&self, value: &serde_json::Value) -> Result<(), ValidationError> {
		let object = value
			.as_object()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "object".to_string(),
				actual: json_type(value).to_string(),
			})?;

		// Check required fields
		for field in &self.required {
			let value = object
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;

			validate_field_type(&field.name, value, &field.field_type)?;

			// Run custom validator if present
			if let Some(validator) = &field.validator {
				validator(value).map_err(|msg| ValidationError::InvalidValue {
					field: field.name.clone(),
					message: msg,
				})?;
			}
		}

		// Check optional fields if present
		for field in &self.optional {
			if let Some(value) = object.get(&field.name) {
				validate_field_type(&field.name, value, &field.field_type)?;

				// Run custom validator if present
				if let Some(validator) = &field.validator {
					validator(value).map_err(|msg| ValidationError::InvalidValue {
						field: field.name.clone(),
						message: msg,
					})?;
				}
			}
		}

		Ok(())
	}
}

/// Short name of a JSON value's type, for error messages.
fn json_type(value: &serde_json::Value) -> &'static str {
	match value {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "boolean",
		serde_json::Value::Number(_) => "number",
		serde_json::Value::String(_) => "string",
		serde_json::Value::Array(_) => "array",
		serde_json::Value::Object(_) => "object",
	}
}

/// Validates that a value matches the expected field type.
fn validate_field_type(
	field_name: &str,
	value: &serde_json::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_string() {
				return Err(ValidationError::TypeMismatch {
					field: field_name.to_string(),
					expected: "string".to_string(),
					actual: json_type(value).to_string(),
				});
			}
		}
		FieldType::Integer { min, max } => {
			let int_val = value.as_i64().ok_or_else(|| ValidationError::TypeMismatch {
				field: field_name.to_string(),
				expected: "integer".to_string(),
				actual: json_type(value).to_string(),
			})?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		}
		FieldType::Number => {
			if !value.is_number() {
				return Err(ValidationError::TypeMismatch {
					field: field_name.to_string(),
					expected: "number".to_string(),
					actual: json_type(value).to_string(),
				});
			}
		}
		FieldType::Boolean => {
			if !value.is_boolean() {
				return Err(ValidationError::TypeMismatch {
					field: field_name.to_string(),
					expected: "boolean".to_string(),
					actual: json_type(value).to_string(),
				});
			}
		}
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| ValidationError::TypeMismatch {
					field: field_name.to_string(),
					expected: "array".to_string(),
					actual: json_type(value).to_string(),
				})?;

			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		}
		FieldType::Object(schema) => {
			schema.validate(value).map_err(|e| match e {
				ValidationError::MissingField(f) => {
					ValidationError::MissingField(format!("{}.{}", field_name, f))
				}
				ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
					field: format!("{}.{}", field_name, field),
					message,
				},
				ValidationError::TypeMismatch {
					field,
					expected,
					actual,
				} => ValidationError::TypeMismatch {
					field: format!("{}.{}", field_name, field),
					expected,
					actual,
				},
				other => other,
			})?;
		}
		FieldType::Any => {}
	}

	Ok(())
}

/// Converts a TOML value into its JSON equivalent so implementation config
/// can be validated with the same schemas as tool payloads.
pub fn toml_to_json(value: &toml::Value) -> Result<serde_json::Value, ValidationError> {
	serde_json::to_value(value).map_err(|e| ValidationError::DeserializationError(e.to_string()))
}

/// Trait defining a configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	///
	/// This method should check:
	/// - Required fields are present
	/// - Field types are correct
	/// - Values meet any constraints (ranges, patterns, etc.)
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_schema() -> Schema {
		Schema::new(
			vec![
				Field::new("address", FieldType::String).with_validator(|v| {
					let s = v.as_str().unwrap_or_default();
					if s.starts_with("0x") {
						Ok(())
					} else {
						Err("must start with 0x".to_string())
					}
				}),
				Field::new("chain", FieldType::String),
			],
			vec![Field::new(
				"required_amount",
				FieldType::String,
			)],
		)
	}

	#[test]
	fn test_validates_required_and_optional() {
		let schema = sample_schema();
		let value = serde_json::json!({
			"address": "0x0000000000000000000000000000000000001001",
			"chain": "evm",
			"required_amount": "200000000"
		});
		assert!(schema.validate(&value).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let schema = sample_schema();
		let value = serde_json::json!({ "chain": "evm" });
		let err = schema.validate(&value).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "address"));
	}

	#[test]
	fn test_custom_validator_runs() {
		let schema = sample_schema();
		let value = serde_json::json!({ "address": "1001", "chain": "evm" });
		let err = schema.validate(&value).unwrap_err();
		assert!(matches!(err, ValidationError::InvalidValue { field, .. } if field == "address"));
	}

	#[test]
	fn test_nested_object_paths_in_errors() {
		let schema = Schema::new(
			vec![Field::new(
				"receipt",
				FieldType::Object(Schema::new(
					vec![Field::new("tx_hash", FieldType::String)],
					vec![],
				)),
			)],
			vec![],
		);
		let value = serde_json::json!({ "receipt": {} });
		let err = schema.validate(&value).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "receipt.tx_hash"));
	}

	#[test]
	fn test_toml_round_trip() {
		let toml_value: toml::Value = toml::from_str("backend = \"stub\"\nttl = 60").unwrap();
		let json = toml_to_json(&toml_value).unwrap();
		assert_eq!(json["backend"], "stub");
		assert_eq!(json["ttl"], 60);
	}
}
