use crate::json::JsonValue;

/// Serializes a [`JsonValue`] to a compact JSON string without whitespace.
pub fn stringify(value: &JsonValue) -> String {
	match value {
		JsonValue::Array(array) => array.stringify(),
		JsonValue::Boolean(b) => b.to_string(),
		JsonValue::Null => "null".to_owned(),
		JsonValue::Number(number) => stringify_number(*number),
		JsonValue::Object(object) => object.stringify(),
		JsonValue::String(text) => format!("\"{}\"", escape_json_string(text)),
	}
}

/// Formats a number without a trailing `.0` for integral values.
fn stringify_number(number: f64) -> String {
	if number.fract() == 0.0 && number.abs() < 1e15 {
		format!("{}", number as i64)
	} else {
		number.to_string()
	}
}

/// Escapes the characters JSON strings cannot contain verbatim.
pub fn escape_json_string(text: &str) -> String {
	let mut result = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'"' => result.push_str("\\\""),
			'\\' => result.push_str("\\\\"),
			'\n' => result.push_str("\\n"),
			'\r' => result.push_str("\\r"),
			'\t' => result.push_str("\\t"),
			'\x08' => result.push_str("\\b"),
			'\x0C' => result.push_str("\\f"),
			c if (c as u32) < 0x20 => result.push_str(&format!("\\u{:04x}", c as u32)),
			c => result.push(c),
		}
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::json::{JsonArray, JsonObject};

	#[test]
	fn numbers_lose_trailing_zero() {
		assert_eq!(stringify(&JsonValue::Number(3.0)), "3");
		assert_eq!(stringify(&JsonValue::Number(3.25)), "3.25");
		assert_eq!(stringify(&JsonValue::Number(-0.5)), "-0.5");
	}

	#[test]
	fn escaping() {
		assert_eq!(escape_json_string("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
		assert_eq!(
			stringify(&JsonValue::from("tab\there")),
			"\"tab\\there\""
		);
	}

	#[test]
	fn nested() {
		let mut object = JsonObject::new();
		object.set("list", JsonValue::Array(JsonArray(vec![JsonValue::Null, JsonValue::from(true)])));
		assert_eq!(JsonValue::Object(object).stringify(), "{\"list\":[null,true]}");
	}
}
