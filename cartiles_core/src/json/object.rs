use crate::json::*;
use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};

/// A JSON object backed by a `BTreeMap<String, JsonValue>`, so iteration and
/// serialization order are deterministic.
#[derive(Clone, Default, PartialEq)]
pub struct JsonObject(pub BTreeMap<String, JsonValue>);

impl JsonObject {
	pub fn new() -> JsonObject {
		JsonObject(BTreeMap::new())
	}

	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.0.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, JsonValue> {
		self.0.iter()
	}

	pub fn keys(&self) -> impl Iterator<Item = &String> {
		self.0.keys()
	}

	pub fn set<T>(&mut self, key: &str, value: T)
	where
		JsonValue: From<T>,
	{
		self.0.insert(key.to_owned(), JsonValue::from(value));
	}

	/// A string value for `key`; `None` if missing, error if not a string.
	pub fn get_string(&self, key: &str) -> Result<Option<String>> {
		self.get(key).map(JsonValue::as_string).transpose()
	}

	/// A numeric value for `key`; `None` if missing, error if not a number.
	pub fn get_number(&self, key: &str) -> Result<Option<f64>> {
		self.get(key).map(JsonValue::as_number).transpose()
	}

	pub fn get_boolean(&self, key: &str) -> Result<Option<bool>> {
		self.get(key).map(JsonValue::as_boolean).transpose()
	}

	pub fn get_array(&self, key: &str) -> Result<Option<&JsonArray>> {
		self.get(key).map(JsonValue::as_array).transpose()
	}

	pub fn get_object(&self, key: &str) -> Result<Option<&JsonObject>> {
		self.get(key).map(JsonValue::as_object).transpose()
	}

	pub fn get_string_vec(&self, key: &str) -> Result<Option<Vec<String>>> {
		self.get_array(key)?.map(JsonArray::as_string_vec).transpose()
	}

	pub fn get_number_vec(&self, key: &str) -> Result<Option<Vec<f64>>> {
		self.get_array(key)?.map(JsonArray::as_number_vec).transpose()
	}

	pub fn stringify(&self) -> String {
		let items = self
			.0
			.iter()
			.map(|(key, value)| format!("\"{}\":{}", escape_json_string(key), stringify(value)))
			.collect::<Vec<_>>();
		format!("{{{}}}", items.join(","))
	}
}

impl Debug for JsonObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.0.iter()).finish()
	}
}

impl From<Vec<(&str, JsonValue)>> for JsonObject {
	fn from(entries: Vec<(&str, JsonValue)>) -> JsonObject {
		JsonObject(entries.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
	}
}
