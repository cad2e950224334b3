//! Configuration validation utilities.
//!
//! Pluggable implementations (storage backends, generator clients) describe
//! their TOML configuration as a [`Schema`] of typed fields, validated before
//! the implementation is constructed so misconfiguration fails at startup
//! rather than on first use.

use thiserror::Error;

/// Errors that can occur during configuration validation.
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
}

/// Represents the type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer value with optional minimum and maximum bounds.
	Integer {
		/// Minimum allowed value (inclusive).
		min: Option<i64>,
		/// Maximum allowed value (inclusive).
		max: Option<i64>,
	},
	/// A boolean value.
	Boolean,
	/// An array of values, all of the same type.
	Array(Box<FieldType>),
}

/// Type alias for field validator functions.
///
/// Validators can perform additional checks beyond type checking. They
/// receive the TOML value and return an error message if validation fails.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named, typed field in a configuration schema.
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
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// Defines a validation schema for a flat TOML configuration table.
///
/// A schema consists of required fields that must be present and optional
/// fields that may be present.
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

	/// Validates a TOML value against this schema.
	///
	/// Checks that all required fields are present, that every known field
	/// has the declared type, and runs custom validators where defined.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			check_field(field, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				check_field(field, value)?;
			}
		}

		Ok(())
	}
}

fn check_field(field: &Field, value: &toml::Value) -> Result<(), ValidationError> {
	validate_field_type(&field.name, value, &field.field_type)?;

	if let Some(validator) = &field.validator {
		validator(value).map_err(|msg| ValidationError::InvalidValue {
			field: field.name.clone(),
			message: msg,
		})?;
	}

	Ok(())
}

/// Validates that a value matches the expected field type, including integer
/// bounds and array element types.
fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	let mismatch = |expected: &str| ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	};

	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch("string"));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value.as_integer().ok_or_else(|| mismatch("integer"))?;

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
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch("boolean"));
			}
		},
		FieldType::Array(inner_type) => {
			let array = value.as_array().ok_or_else(|| mismatch("array"))?;

			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		},
	}

	Ok(())
}

/// Trait defining a configuration schema that can validate TOML values.
///
/// Implement this trait to let an implementation declare its own
/// configuration requirements; the service wiring validates each
/// implementation's section against its schema before construction.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_schema() -> Schema {
		Schema::new(
			vec![Field::new("api_url", FieldType::String).with_validator(|v| {
				let url = v.as_str().unwrap_or_default();
				if url.starts_with("http://") || url.starts_with("https://") {
					Ok(())
				} else {
					Err("must start with http:// or https://".to_string())
				}
			})],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			)],
		)
	}

	#[test]
	fn accepts_valid_config() {
		let config: toml::Value =
			toml::from_str("api_url = \"https://cards.example\"\ntimeout_seconds = 10").unwrap();
		assert!(sample_schema().validate(&config).is_ok());
	}

	#[test]
	fn rejects_missing_required_field() {
		let config: toml::Value = toml::from_str("timeout_seconds = 10").unwrap();
		let err = sample_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "api_url"));
	}

	#[test]
	fn rejects_out_of_bounds_integer() {
		let config: toml::Value =
			toml::from_str("api_url = \"https://cards.example\"\ntimeout_seconds = 0").unwrap();
		assert!(sample_schema().validate(&config).is_err());
	}

	#[test]
	fn custom_validator_runs() {
		let config: toml::Value = toml::from_str("api_url = \"ftp://cards.example\"").unwrap();
		let err = sample_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::InvalidValue { field, .. } if field == "api_url"));
	}
}
