//! The dynamically-typed values style expressions produce.
//!
//! [`ValueVariant`] is a closed sum over the types a style expression can
//! evaluate to. Equality and hashing are total; comparison between `Int64`
//! and `Double` coerces both sides to `Double`, every other cross-type
//! comparison is unequal for equality and absent for ordering.

use cartiles_core::Color;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// One run of formatted text, as produced by `format` expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedEntry {
	pub text: String,
	pub scale: f32,
}

impl FormattedEntry {
	pub fn new(text: impl Into<String>, scale: f32) -> FormattedEntry {
		FormattedEntry {
			text: text.into(),
			scale,
		}
	}
}

/// A dynamically-typed style value.
#[derive(Clone, Debug, Default)]
pub enum ValueVariant {
	/// The absent value.
	#[default]
	Monostate,
	String(String),
	Double(f64),
	Int64(i64),
	Bool(bool),
	Color(Color),
	FloatVec(Vec<f32>),
	StringVec(Vec<String>),
	FormattedStringVec(Vec<FormattedEntry>),
}

impl ValueVariant {
	pub fn is_monostate(&self) -> bool {
		matches!(self, ValueVariant::Monostate)
	}

	pub fn type_as_str(&self) -> &str {
		use ValueVariant::*;
		match self {
			Monostate => "monostate",
			String(_) => "string",
			Double(_) => "double",
			Int64(_) => "int64",
			Bool(_) => "bool",
			Color(_) => "color",
			FloatVec(_) => "float-vec",
			StringVec(_) => "string-vec",
			FormattedStringVec(_) => "formatted-string-vec",
		}
	}

	/// The numeric view of the value, if it is `Int64` or `Double`.
	pub fn as_number(&self) -> Option<f64> {
		match self {
			ValueVariant::Double(v) => Some(*v),
			ValueVariant::Int64(v) => Some(*v as f64),
			_ => None,
		}
	}

	/// Truthiness as used by conditions: non-empty strings, non-zero non-NaN
	/// numbers and any non-monostate container are true.
	pub fn to_boolean(&self) -> bool {
		match self {
			ValueVariant::Monostate => false,
			ValueVariant::String(v) => !v.is_empty(),
			ValueVariant::Double(v) => *v != 0.0 && !v.is_nan(),
			ValueVariant::Int64(v) => *v != 0,
			ValueVariant::Bool(v) => *v,
			ValueVariant::Color(_)
			| ValueVariant::FloatVec(_)
			| ValueVariant::StringVec(_)
			| ValueVariant::FormattedStringVec(_) => true,
		}
	}

	/// Numeric coercion: strings parse as `f64` (0 on failure), booleans map
	/// to 1/0, everything non-numeric is 0.
	pub fn to_number(&self) -> f64 {
		match self {
			ValueVariant::String(v) => v.trim().parse().unwrap_or(0.0),
			ValueVariant::Double(v) => *v,
			ValueVariant::Int64(v) => *v as f64,
			ValueVariant::Bool(v) => {
				if *v {
					1.0
				} else {
					0.0
				}
			}
			_ => 0.0,
		}
	}

	/// String coercion: numbers lose trailing zeros, colors render as
	/// `rgba(...)`, formatted runs concatenate their text.
	pub fn to_string_value(&self) -> String {
		match self {
			ValueVariant::Monostate => String::new(),
			ValueVariant::String(v) => v.clone(),
			ValueVariant::Double(v) => format_double(*v),
			ValueVariant::Int64(v) => v.to_string(),
			ValueVariant::Bool(v) => v.to_string(),
			ValueVariant::Color(v) => v.to_rgba_string(),
			ValueVariant::FloatVec(v) => v.iter().map(|f| format_double(f64::from(*f))).join(","),
			ValueVariant::StringVec(v) => v.iter().join(","),
			ValueVariant::FormattedStringVec(v) => v.iter().map(|entry| entry.text.as_str()).collect(),
		}
	}

	/// Classifies a raw property string into a typed variant: booleans,
	/// integers and floating-point numbers are detected, everything else
	/// stays a string. Numbers with leading zeros are strings.
	pub fn parse_str(value: &str) -> ValueVariant {
		lazy_static! {
			// Requires a decimal point and/or exponent, no leading zeros.
			static ref REG_DOUBLE: Regex =
				Regex::new(r"^-?(?:0|[1-9]\d*)(?:(?:\.\d+)(?:[eE][+-]?\d+)?|[eE][+-]?\d+)$").unwrap();
			static ref REG_INT: Regex = Regex::new(r"^-?(?:0|[1-9]\d*)$").unwrap();
		}

		match value {
			"" => ValueVariant::String(String::new()),
			"true" => ValueVariant::Bool(true),
			"false" => ValueVariant::Bool(false),
			_ => {
				if REG_DOUBLE.is_match(value) {
					ValueVariant::Double(value.parse().unwrap())
				} else if REG_INT.is_match(value) {
					ValueVariant::Int64(value.parse().unwrap())
				} else {
					ValueVariant::String(value.to_owned())
				}
			}
		}
	}

	/// Ordering within the numeric pair (coerced to `Double`) and within
	/// strings; absent for every other combination.
	pub fn partial_cmp_variant(&self, other: &ValueVariant) -> Option<Ordering> {
		if let (Some(lhs), Some(rhs)) = (self.as_number(), other.as_number()) {
			return lhs.partial_cmp(&rhs);
		}
		if let (ValueVariant::String(lhs), ValueVariant::String(rhs)) = (self, other) {
			return Some(lhs.cmp(rhs));
		}
		None
	}
}

/// Formats a double without a trailing `.0` for integral values.
fn format_double(value: f64) -> String {
	if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
		format!("{}", value as i64)
	} else {
		value.to_string()
	}
}

impl PartialEq for ValueVariant {
	fn eq(&self, other: &ValueVariant) -> bool {
		use ValueVariant::*;
		match (self, other) {
			(Monostate, Monostate) => true,
			(String(a), String(b)) => a == b,
			(Bool(a), Bool(b)) => a == b,
			(Color(a), Color(b)) => a == b,
			(FloatVec(a), FloatVec(b)) => a == b,
			(StringVec(a), StringVec(b)) => a == b,
			(FormattedStringVec(a), FormattedStringVec(b)) => a == b,
			// Int64 and Double compare numerically, in either combination.
			(Int64(a), Int64(b)) => a == b,
			(Double(a), Double(b)) => a == b,
			(Int64(a), Double(b)) | (Double(b), Int64(a)) => *a as f64 == *b,
			_ => false,
		}
	}
}

impl Eq for ValueVariant {}

impl Hash for ValueVariant {
	fn hash<H: Hasher>(&self, state: &mut H) {
		use ValueVariant::*;
		match self {
			Monostate => 0u8.hash(state),
			String(v) => {
				1u8.hash(state);
				v.hash(state);
			}
			// Both number variants hash through the coerced double so that
			// numerically equal values hash equally; -0.0 normalises to 0.0.
			Double(_) | Int64(_) => {
				2u8.hash(state);
				let number = self.as_number().unwrap();
				let normalized = if number == 0.0 { 0.0 } else { number };
				normalized.to_bits().hash(state);
			}
			Bool(v) => {
				3u8.hash(state);
				v.hash(state);
			}
			Color(v) => {
				4u8.hash(state);
				v.r.to_bits().hash(state);
				v.g.to_bits().hash(state);
				v.b.to_bits().hash(state);
				v.a.to_bits().hash(state);
			}
			FloatVec(v) => {
				5u8.hash(state);
				for f in v {
					f.to_bits().hash(state);
				}
			}
			StringVec(v) => {
				6u8.hash(state);
				v.hash(state);
			}
			FormattedStringVec(v) => {
				7u8.hash(state);
				for entry in v {
					entry.text.hash(state);
					entry.scale.to_bits().hash(state);
				}
			}
		}
	}
}

impl From<&str> for ValueVariant {
	fn from(value: &str) -> ValueVariant {
		ValueVariant::String(value.to_owned())
	}
}

impl From<String> for ValueVariant {
	fn from(value: String) -> ValueVariant {
		ValueVariant::String(value)
	}
}

impl From<f64> for ValueVariant {
	fn from(value: f64) -> ValueVariant {
		ValueVariant::Double(value)
	}
}

impl From<i64> for ValueVariant {
	fn from(value: i64) -> ValueVariant {
		ValueVariant::Int64(value)
	}
}

impl From<bool> for ValueVariant {
	fn from(value: bool) -> ValueVariant {
		ValueVariant::Bool(value)
	}
}

impl From<Color> for ValueVariant {
	fn from(value: Color) -> ValueVariant {
		ValueVariant::Color(value)
	}
}

impl From<Vec<f32>> for ValueVariant {
	fn from(value: Vec<f32>) -> ValueVariant {
		ValueVariant::FloatVec(value)
	}
}

impl From<Vec<String>> for ValueVariant {
	fn from(value: Vec<String>) -> ValueVariant {
		ValueVariant::StringVec(value)
	}
}

impl From<Vec<FormattedEntry>> for ValueVariant {
	fn from(value: Vec<FormattedEntry>) -> ValueVariant {
		ValueVariant::FormattedStringVec(value)
	}
}
