//! A recursive-descent JSON parser over an in-memory string.
//!
//! Errors carry the byte position of the offending input so that style
//! documents with typos produce actionable diagnostics.

use crate::json::{JsonArray, JsonObject, JsonValue};
use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;

struct Parser<'a> {
	bytes: &'a [u8],
	pos: usize,
}

/// Parses a complete JSON document; trailing non-whitespace is an error.
pub fn parse_json_str(json: &str) -> Result<JsonValue> {
	let mut parser = Parser {
		bytes: json.as_bytes(),
		pos: 0,
	};
	let value = parser.parse_value().context("while parsing JSON")?;
	parser.skip_whitespace();
	if parser.pos < parser.bytes.len() {
		bail!("unexpected trailing data at position {}", parser.pos);
	}
	Ok(value)
}

impl<'a> Parser<'a> {
	fn peek(&self) -> Option<u8> {
		self.bytes.get(self.pos).copied()
	}

	fn advance(&mut self) -> Option<u8> {
		let byte = self.peek()?;
		self.pos += 1;
		Some(byte)
	}

	fn skip_whitespace(&mut self) {
		while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
			self.pos += 1;
		}
	}

	fn expect(&mut self, expected: u8) -> Result<()> {
		match self.advance() {
			Some(byte) if byte == expected => Ok(()),
			Some(byte) => bail!(
				"expected '{}' but found '{}' at position {}",
				char::from(expected),
				char::from(byte),
				self.pos - 1
			),
			None => bail!("expected '{}' but reached end of input", char::from(expected)),
		}
	}

	fn expect_tag(&mut self, tag: &str) -> Result<()> {
		for expected in tag.bytes() {
			self.expect(expected)?;
		}
		Ok(())
	}

	fn parse_value(&mut self) -> Result<JsonValue> {
		self.skip_whitespace();
		match self.peek() {
			Some(b'{') => self.parse_object(),
			Some(b'[') => self.parse_array(),
			Some(b'"') => Ok(JsonValue::String(self.parse_string()?)),
			Some(b't') => {
				self.expect_tag("true")?;
				Ok(JsonValue::Boolean(true))
			}
			Some(b'f') => {
				self.expect_tag("false")?;
				Ok(JsonValue::Boolean(false))
			}
			Some(b'n') => {
				self.expect_tag("null")?;
				Ok(JsonValue::Null)
			}
			Some(b'-' | b'0'..=b'9') => self.parse_number(),
			Some(byte) => bail!(
				"unexpected character '{}' at position {}",
				char::from(byte),
				self.pos
			),
			None => bail!("unexpected end of input"),
		}
	}

	fn parse_object(&mut self) -> Result<JsonValue> {
		self.expect(b'{')?;
		let mut entries = BTreeMap::new();
		self.skip_whitespace();
		if self.peek() == Some(b'}') {
			self.pos += 1;
			return Ok(JsonValue::Object(JsonObject(entries)));
		}
		loop {
			self.skip_whitespace();
			let key = self.parse_string()?;
			self.skip_whitespace();
			self.expect(b':')?;
			let value = self.parse_value().with_context(|| format!("in object key {key:?}"))?;
			entries.insert(key, value);
			self.skip_whitespace();
			match self.advance() {
				Some(b',') => {}
				Some(b'}') => break,
				_ => bail!("expected ',' or '}}' at position {}", self.pos - 1),
			}
		}
		Ok(JsonValue::Object(JsonObject(entries)))
	}

	fn parse_array(&mut self) -> Result<JsonValue> {
		self.expect(b'[')?;
		let mut values = Vec::new();
		self.skip_whitespace();
		if self.peek() == Some(b']') {
			self.pos += 1;
			return Ok(JsonValue::Array(JsonArray(values)));
		}
		loop {
			values.push(self.parse_value().with_context(|| format!("in array element {}", values.len()))?);
			self.skip_whitespace();
			match self.advance() {
				Some(b',') => {}
				Some(b']') => break,
				_ => bail!("expected ',' or ']' at position {}", self.pos - 1),
			}
		}
		Ok(JsonValue::Array(JsonArray(values)))
	}

	fn parse_string(&mut self) -> Result<String> {
		self.expect(b'"')?;
		let mut bytes = Vec::with_capacity(16);
		loop {
			match self.advance() {
				Some(b'"') => break,
				Some(b'\\') => match self.advance() {
					Some(b'"') => bytes.push(b'"'),
					Some(b'\\') => bytes.push(b'\\'),
					Some(b'/') => bytes.push(b'/'),
					Some(b'b') => bytes.push(b'\x08'),
					Some(b'f') => bytes.push(b'\x0C'),
					Some(b'n') => bytes.push(b'\n'),
					Some(b'r') => bytes.push(b'\r'),
					Some(b't') => bytes.push(b'\t'),
					Some(b'u') => {
						let mut hex = [0u8; 4];
						for digit in &mut hex {
							*digit = self
								.advance()
								.ok_or_else(|| anyhow::anyhow!("unterminated unicode escape"))?;
						}
						let code_point = u16::from_str_radix(std::str::from_utf8(&hex)?, 16)
							.with_context(|| format!("invalid unicode escape at position {}", self.pos))?;
						let mut buffer = [0u8; 4];
						let encoded = char::from_u32(u32::from(code_point))
							.unwrap_or(char::REPLACEMENT_CHARACTER)
							.encode_utf8(&mut buffer);
						bytes.extend_from_slice(encoded.as_bytes());
					}
					Some(byte) => bail!("invalid escape '\\{}' at position {}", char::from(byte), self.pos - 1),
					None => bail!("unterminated string"),
				},
				Some(byte) => bytes.push(byte),
				None => bail!("unterminated string"),
			}
		}
		String::from_utf8(bytes).context("string is not valid UTF-8")
	}

	fn parse_number(&mut self) -> Result<JsonValue> {
		let start = self.pos;
		if self.peek() == Some(b'-') {
			self.pos += 1;
		}
		while matches!(self.peek(), Some(b'0'..=b'9')) {
			self.pos += 1;
		}
		if self.peek() == Some(b'.') {
			self.pos += 1;
			while matches!(self.peek(), Some(b'0'..=b'9')) {
				self.pos += 1;
			}
		}
		if matches!(self.peek(), Some(b'e' | b'E')) {
			self.pos += 1;
			if matches!(self.peek(), Some(b'+' | b'-')) {
				self.pos += 1;
			}
			while matches!(self.peek(), Some(b'0'..=b'9')) {
				self.pos += 1;
			}
		}
		let text = std::str::from_utf8(&self.bytes[start..self.pos])?;
		let number: f64 = text
			.parse()
			.with_context(|| format!("invalid number {text:?} at position {start}"))?;
		Ok(JsonValue::Number(number))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_scalars() {
		assert_eq!(parse_json_str("null").unwrap(), JsonValue::Null);
		assert_eq!(parse_json_str("true").unwrap(), JsonValue::Boolean(true));
		assert_eq!(parse_json_str("-12.5e2").unwrap(), JsonValue::Number(-1250.0));
		assert_eq!(
			parse_json_str("\"he\\nllo\"").unwrap(),
			JsonValue::String("he\nllo".to_owned())
		);
	}

	#[test]
	fn parse_nested() {
		let value = parse_json_str(r#"{"layers": [{"id": "water", "minzoom": 4}], "sprite": null}"#).unwrap();
		let object = value.as_object().unwrap();
		let layers = object.get_array("layers").unwrap().unwrap();
		let first = layers.get(0).unwrap().as_object().unwrap();
		assert_eq!(first.get_string("id").unwrap(), Some("water".to_owned()));
		assert_eq!(first.get_number("minzoom").unwrap(), Some(4.0));
		assert!(object.get("sprite").unwrap().is_null());
	}

	#[test]
	fn unicode_escape() {
		assert_eq!(
			parse_json_str("\"\\u00e9l\\u00e8ve\"").unwrap(),
			JsonValue::String("élève".to_owned())
		);
	}

	#[test]
	fn rejects_garbage() {
		assert!(parse_json_str("{").is_err());
		assert!(parse_json_str("[1,]").is_err());
		assert!(parse_json_str("12 34").is_err());
		assert!(parse_json_str("\"open").is_err());
	}

	#[test]
	fn round_trip() {
		let text = r#"{"a":[1,2.5,"x"],"b":{"c":false}}"#;
		assert_eq!(parse_json_str(text).unwrap().stringify(), text);
	}
}
