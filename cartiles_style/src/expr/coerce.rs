//! Typed views on evaluation results.
//!
//! Style properties are consumed as concrete types; [`FromVariant`] carries
//! the conversion ladder: numbers cross between `Int64` and `Double`, colors
//! parse from strings, formatted runs concatenate into strings and the
//! enumerated style values parse from their string spellings. A failed
//! conversion falls back to the caller-supplied default, never to an error.

use super::{ExprArena, NodeId};
use crate::context::EvaluationContext;
use crate::style::types::{
	Anchor, BlendMode, IconTextFit, LineCap, SymbolAlignment, SymbolPlacement, SymbolZOrder, TextJustify,
	TextTransform,
};
use crate::variant::{FormattedEntry, ValueVariant};
use cartiles_core::{Color, Vec2};

/// Conversion from a [`ValueVariant`] into a concrete property type.
pub trait FromVariant: Sized {
	fn from_variant(value: &ValueVariant) -> Option<Self>;
}

impl FromVariant for ValueVariant {
	fn from_variant(value: &ValueVariant) -> Option<ValueVariant> {
		Some(value.clone())
	}
}

impl FromVariant for f64 {
	fn from_variant(value: &ValueVariant) -> Option<f64> {
		value.as_number()
	}
}

impl FromVariant for i64 {
	fn from_variant(value: &ValueVariant) -> Option<i64> {
		match value {
			ValueVariant::Int64(v) => Some(*v),
			ValueVariant::Double(v) => Some(*v as i64),
			_ => None,
		}
	}
}

impl FromVariant for bool {
	fn from_variant(value: &ValueVariant) -> Option<bool> {
		match value {
			ValueVariant::Bool(v) => Some(*v),
			_ => None,
		}
	}
}

impl FromVariant for String {
	fn from_variant(value: &ValueVariant) -> Option<String> {
		match value {
			ValueVariant::String(v) => Some(v.clone()),
			ValueVariant::FormattedStringVec(entries) => {
				Some(entries.iter().map(|entry| entry.text.as_str()).collect())
			}
			_ => None,
		}
	}
}

impl FromVariant for Color {
	fn from_variant(value: &ValueVariant) -> Option<Color> {
		match value {
			ValueVariant::Color(v) => Some(*v),
			ValueVariant::String(text) => Color::parse(text),
			_ => None,
		}
	}
}

impl FromVariant for Vec<f32> {
	fn from_variant(value: &ValueVariant) -> Option<Vec<f32>> {
		match value {
			ValueVariant::FloatVec(v) => Some(v.clone()),
			_ => None,
		}
	}
}

impl FromVariant for Vec<String> {
	fn from_variant(value: &ValueVariant) -> Option<Vec<String>> {
		match value {
			ValueVariant::StringVec(v) => Some(v.clone()),
			_ => None,
		}
	}
}

impl FromVariant for Vec<FormattedEntry> {
	fn from_variant(value: &ValueVariant) -> Option<Vec<FormattedEntry>> {
		match value {
			ValueVariant::FormattedStringVec(v) => Some(v.clone()),
			ValueVariant::String(text) => Some(vec![FormattedEntry::new(text.clone(), 1.0)]),
			_ => None,
		}
	}
}

impl FromVariant for Vec2 {
	fn from_variant(value: &ValueVariant) -> Option<Vec2> {
		match value {
			ValueVariant::FloatVec(v) if v.len() >= 2 => {
				Some(Vec2::new(f64::from(v[0]), f64::from(v[1])))
			}
			_ => None,
		}
	}
}

/// Parses an enumerated style value out of a string variant.
fn from_string_spelling<T>(value: &ValueVariant, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
	match value {
		ValueVariant::String(text) => parse(text),
		_ => None,
	}
}

impl FromVariant for Anchor {
	fn from_variant(value: &ValueVariant) -> Option<Anchor> {
		from_string_spelling(value, Anchor::parse)
	}
}

impl FromVariant for TextJustify {
	fn from_variant(value: &ValueVariant) -> Option<TextJustify> {
		from_string_spelling(value, TextJustify::parse)
	}
}

impl FromVariant for SymbolPlacement {
	fn from_variant(value: &ValueVariant) -> Option<SymbolPlacement> {
		from_string_spelling(value, SymbolPlacement::parse)
	}
}

impl FromVariant for LineCap {
	fn from_variant(value: &ValueVariant) -> Option<LineCap> {
		from_string_spelling(value, LineCap::parse)
	}
}

impl FromVariant for TextTransform {
	fn from_variant(value: &ValueVariant) -> Option<TextTransform> {
		from_string_spelling(value, TextTransform::parse)
	}
}

impl FromVariant for BlendMode {
	fn from_variant(value: &ValueVariant) -> Option<BlendMode> {
		from_string_spelling(value, BlendMode::parse)
	}
}

impl FromVariant for SymbolZOrder {
	fn from_variant(value: &ValueVariant) -> Option<SymbolZOrder> {
		from_string_spelling(value, SymbolZOrder::parse)
	}
}

impl FromVariant for IconTextFit {
	fn from_variant(value: &ValueVariant) -> Option<IconTextFit> {
		from_string_spelling(value, IconTextFit::parse)
	}
}

impl FromVariant for SymbolAlignment {
	fn from_variant(value: &ValueVariant) -> Option<SymbolAlignment> {
		from_string_spelling(value, SymbolAlignment::parse)
	}
}

/// A string vector mapped element-wise; unparseable entries are dropped, an
/// empty result falls back to the default.
impl FromVariant for Vec<Anchor> {
	fn from_variant(value: &ValueVariant) -> Option<Vec<Anchor>> {
		match value {
			ValueVariant::StringVec(items) => {
				let anchors: Vec<Anchor> = items.iter().filter_map(|item| Anchor::parse(item)).collect();
				if anchors.is_empty() { None } else { Some(anchors) }
			}
			_ => None,
		}
	}
}

impl ExprArena {
	/// Evaluates and converts, falling back to `default` on any type
	/// mismatch.
	pub fn evaluate_or<T: FromVariant>(&self, id: NodeId, context: &EvaluationContext, default: T) -> T {
		T::from_variant(&self.evaluate(id, context)).unwrap_or(default)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::Expr;
	use crate::state::FeatureStateManager;

	fn evaluate_static_as<T: FromVariant>(value: ValueVariant, default: T) -> T {
		let mut arena = ExprArena::new();
		let id = arena.add(Expr::Static(value));
		let state = FeatureStateManager::new();
		let context = EvaluationContext::global(0.0, 1.0, &state);
		arena.evaluate_or(id, &context, default)
	}

	#[test]
	fn numbers_cross_between_widths() {
		assert_eq!(evaluate_static_as(ValueVariant::from(3i64), 0.0f64), 3.0);
		assert_eq!(evaluate_static_as(ValueVariant::from(3.7), 0i64), 3);
		assert_eq!(evaluate_static_as(ValueVariant::from("x"), 5.0f64), 5.0);
	}

	#[test]
	fn colors_parse_from_strings() {
		assert_eq!(
			evaluate_static_as(ValueVariant::from("#ff0000"), Color::BLACK),
			Color::new(1.0, 0.0, 0.0, 1.0)
		);
		assert_eq!(
			evaluate_static_as(ValueVariant::from("no-color"), Color::BLACK),
			Color::BLACK
		);
	}

	#[test]
	fn formatted_runs_concatenate_into_strings() {
		let formatted = ValueVariant::from(vec![
			FormattedEntry::new("Ber", 1.0),
			FormattedEntry::new("n", 0.5),
		]);
		assert_eq!(evaluate_static_as(formatted, String::new()), "Bern");
	}

	#[test]
	fn enums_parse_from_spellings() {
		assert_eq!(
			evaluate_static_as(ValueVariant::from("line"), SymbolPlacement::Point),
			SymbolPlacement::Line
		);
		assert_eq!(
			evaluate_static_as(ValueVariant::from("nonsense"), SymbolPlacement::Point),
			SymbolPlacement::Point
		);
		assert_eq!(
			evaluate_static_as(ValueVariant::from("multiply"), BlendMode::Normal),
			BlendMode::Multiply
		);
	}

	#[test]
	fn vec2_from_float_pairs() {
		assert_eq!(
			evaluate_static_as(ValueVariant::FloatVec(vec![1.0, -2.0]), Vec2::default()),
			Vec2::new(1.0, -2.0)
		);
	}

	#[test]
	fn anchor_lists_drop_unparseable_entries() {
		let list = ValueVariant::StringVec(vec!["top".to_owned(), "nope".to_owned()]);
		assert_eq!(
			evaluate_static_as(list, vec![Anchor::Center]),
			vec![Anchor::Top]
		);
		let empty = ValueVariant::StringVec(vec!["nope".to_owned()]);
		assert_eq!(
			evaluate_static_as(empty, vec![Anchor::Center]),
			vec![Anchor::Center]
		);
	}
}
