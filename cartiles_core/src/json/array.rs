use crate::json::*;
use anyhow::Result;
use std::fmt::{self, Debug};

/// A JSON array, backed by a `Vec<JsonValue>`.
#[derive(Clone, Default, PartialEq)]
pub struct JsonArray(pub Vec<JsonValue>);

impl JsonArray {
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&JsonValue> {
		self.0.get(index)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, JsonValue> {
		self.0.iter()
	}

	pub fn stringify(&self) -> String {
		let items = self.0.iter().map(stringify).collect::<Vec<_>>();
		format!("[{}]", items.join(","))
	}

	/// All elements as strings; errors when any element is not a string.
	pub fn as_string_vec(&self) -> Result<Vec<String>> {
		self.0.iter().map(JsonValue::as_string).collect()
	}

	/// All elements as numbers; errors when any element is not numeric.
	pub fn as_number_vec(&self) -> Result<Vec<f64>> {
		self.0.iter().map(JsonValue::as_number).collect()
	}
}

impl Debug for JsonArray {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self.0)
	}
}

impl From<Vec<JsonValue>> for JsonArray {
	fn from(values: Vec<JsonValue>) -> JsonArray {
		JsonArray(values)
	}
}

impl<'a> IntoIterator for &'a JsonArray {
	type Item = &'a JsonValue;
	type IntoIter = std::slice::Iter<'a, JsonValue>;
	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn conversions() {
		let array = JsonArray(vec![JsonValue::from(1.0), JsonValue::from(2.0)]);
		assert_eq!(array.as_number_vec().unwrap(), vec![1.0, 2.0]);
		assert!(array.as_string_vec().is_err());
		assert_eq!(array.stringify(), "[1,2]");
	}
}
