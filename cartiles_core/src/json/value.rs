//! JSON value enum representing any valid JSON data.

use crate::json::*;
use anyhow::{Result, bail};

/// Any JSON data: arrays, objects, numbers, strings, booleans or null.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonValue {
	Array(JsonArray),
	Boolean(bool),
	Null,
	Number(f64),
	Object(JsonObject),
	String(String),
}

impl JsonValue {
	/// Parses a JSON string.
	pub fn parse_str(json: &str) -> Result<JsonValue> {
		parse_json_str(json)
	}

	/// The JSON type as a lowercase name, used in error messages.
	pub fn type_as_str(&self) -> &str {
		use JsonValue::*;
		match self {
			Array(_) => "array",
			Boolean(_) => "boolean",
			Null => "null",
			Number(_) => "number",
			Object(_) => "object",
			String(_) => "string",
		}
	}

	/// Serializes to a compact JSON string.
	pub fn stringify(&self) -> String {
		stringify(self)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, JsonValue::Null)
	}

	pub fn as_array(&self) -> Result<&JsonArray> {
		if let JsonValue::Array(array) = self {
			Ok(array)
		} else {
			bail!("expected an array, found a {}", self.type_as_str())
		}
	}

	pub fn as_object(&self) -> Result<&JsonObject> {
		if let JsonValue::Object(object) = self {
			Ok(object)
		} else {
			bail!("expected an object, found a {}", self.type_as_str())
		}
	}

	pub fn as_str(&self) -> Result<&str> {
		if let JsonValue::String(text) = self {
			Ok(text)
		} else {
			bail!("expected a string, found a {}", self.type_as_str())
		}
	}

	pub fn as_string(&self) -> Result<String> {
		self.as_str().map(str::to_owned)
	}

	pub fn as_number(&self) -> Result<f64> {
		if let JsonValue::Number(value) = self {
			Ok(*value)
		} else {
			bail!("expected a number, found a {}", self.type_as_str())
		}
	}

	pub fn as_boolean(&self) -> Result<bool> {
		if let JsonValue::Boolean(value) = self {
			Ok(*value)
		} else {
			bail!("expected a boolean, found a {}", self.type_as_str())
		}
	}
}

impl From<&str> for JsonValue {
	fn from(value: &str) -> JsonValue {
		JsonValue::String(value.to_owned())
	}
}

impl From<String> for JsonValue {
	fn from(value: String) -> JsonValue {
		JsonValue::String(value)
	}
}

impl From<f64> for JsonValue {
	fn from(value: f64) -> JsonValue {
		JsonValue::Number(value)
	}
}

impl From<i64> for JsonValue {
	fn from(value: i64) -> JsonValue {
		JsonValue::Number(value as f64)
	}
}

impl From<bool> for JsonValue {
	fn from(value: bool) -> JsonValue {
		JsonValue::Boolean(value)
	}
}

impl<T> From<Vec<T>> for JsonValue
where
	JsonValue: From<T>,
{
	fn from(values: Vec<T>) -> JsonValue {
		JsonValue::Array(JsonArray(values.into_iter().map(JsonValue::from).collect()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn typed_accessors() {
		assert_eq!(JsonValue::from(23.5).as_number().unwrap(), 23.5);
		assert_eq!(JsonValue::from("x").as_str().unwrap(), "x");
		assert_eq!(JsonValue::from(true).as_boolean().unwrap(), true);
		assert!(JsonValue::Null.is_null());
		assert!(JsonValue::from(1.0).as_str().is_err());
		assert_eq!(
			JsonValue::from("x").as_number().unwrap_err().to_string(),
			"expected a number, found a string"
		);
	}

	#[test]
	fn from_vec() {
		let value = JsonValue::from(vec![1i64, 2, 3]);
		assert_eq!(value.stringify(), "[1,2,3]");
	}
}
