//! Parser from the Mapbox-style JSON expression dialect into the IR.
//!
//! Array expressions are recognised by their string head; the legacy
//! `{"stops": [...]}` object form reduces to an `Interpolated` node with base
//! 1.0. Parsing is diagnostic: an unrecognised construct logs a warning and
//! yields `None` instead of failing the document.

use super::{CompareOp, Expr, ExprArena, LogOp, MathOp, NodeId};
use crate::variant::ValueVariant;
use cartiles_core::interner::{KEY_TYPE, KEY_ZOOM, Key};
use cartiles_core::json::{JsonArray, JsonValue};
use cartiles_core::Color;
use log::warn;

/// Parses one expression into `arena`, returning its root.
pub fn parse_expression(arena: &mut ExprArena, json: &JsonValue) -> Option<NodeId> {
	match json {
		JsonValue::Array(array) if !array.is_empty() => parse_array_expression(arena, array)
			.or_else(|| {
				warn!("style expression not handled: {}", json.stringify());
				None
			}),
		JsonValue::Object(object) => {
			if let Ok(Some(stops)) = object.get_array("stops") {
				parse_legacy_stops(arena, stops)
			} else {
				warn!("style expression not handled: {}", json.stringify());
				None
			}
		}
		JsonValue::Null => None,
		JsonValue::Array(_) => {
			warn!("style expression not handled: []");
			None
		}
		primitive => Some(arena.add(Expr::Static(variant_of(primitive)))),
	}
}

fn parse_array_expression(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	let Some(head) = expression_head(array) else {
		// No string head: a plain value array, or a bundle of expressions.
		return parse_value_array(arena, array);
	};

	match head.as_str() {
		"literal" => Some(arena.add(Expr::Static(variant_of(array.get(1)?)))),
		"get" => parse_get(arena, array),
		"has" => Some(arena.add(Expr::HasProperty(string_key(array.get(1)?)?))),
		"!has" => Some(arena.add(Expr::HasNotProperty(string_key(array.get(1)?)?))),
		"in" | "!in" => parse_in_filter(arena, array, head == "in"),
		"==" | "!=" | "<" | "<=" | ">" | ">=" => {
			let lhs = parse_expression(arena, array.get(1)?)?;
			let rhs = parse_expression(arena, array.get(2)?)?;
			Some(arena.add(Expr::Compare {
				lhs,
				rhs,
				op: compare_op(&head),
			}))
		}
		"all" => {
			let children = parse_children(arena, array, 1);
			Some(arena.add(Expr::All(children)))
		}
		"any" => {
			let children = parse_children(arena, array, 1);
			Some(arena.add(Expr::Any(children)))
		}
		"boolean" => {
			let children = parse_children(arena, array, 1);
			Some(arena.add(Expr::Boolean(children)))
		}
		"case" => parse_case(arena, array),
		"match" => parse_match(arena, array),
		"to-string" => {
			let child = parse_expression(arena, array.get(1)?)?;
			Some(arena.add(Expr::ToString(child)))
		}
		"to-number" => {
			let child = parse_expression(arena, array.get(1)?)?;
			Some(arena.add(Expr::ToNumber(child)))
		}
		"to-boolean" => {
			let child = parse_expression(arena, array.get(1)?)?;
			Some(arena.add(Expr::ToBoolean(child)))
		}
		"step" => parse_step(arena, array),
		"interpolate" => parse_interpolate(arena, array),
		"format" => parse_format(arena, array),
		"concat" => parse_concat(arena, array),
		"length" => {
			let child = parse_expression(arena, array.get(1)?)?;
			Some(arena.add(Expr::Length(child)))
		}
		"number-format" => parse_number_format(arena, array),
		"!" => {
			let child = parse_expression(arena, array.get(1)?)?;
			Some(arena.add(Expr::LogOp {
				op: LogOp::Not,
				lhs: child,
				rhs: None,
			}))
		}
		"-" | "+" | "*" | "/" | "%" | "^" => parse_math(arena, array, &head),
		"geometry-type" => Some(arena.add(Expr::GetProperty(KEY_TYPE))),
		"zoom" => Some(arena.add(Expr::GetProperty(KEY_ZOOM))),
		"feature-state" => Some(arena.add(Expr::FeatureState(string_key(array.get(1)?)?))),
		"global-state" => Some(arena.add(Expr::GlobalState(string_key(array.get(1)?)?))),
		"coalesce" => {
			let children = parse_children(arena, array, 1);
			Some(arena.add(Expr::Coalesce(children)))
		}
		_ => parse_value_array(arena, array),
	}
}

/// The lowercased head of an array expression, when its first element is a
/// string naming an operation.
fn expression_head(array: &JsonArray) -> Option<String> {
	match array.get(0)? {
		JsonValue::String(text) => {
			let head = text.to_lowercase();
			if is_known_head(&head) { Some(head) } else { None }
		}
		_ => None,
	}
}

fn is_known_head(head: &str) -> bool {
	matches!(
		head,
		"literal"
			| "get" | "has"
			| "!has" | "in"
			| "!in" | "=="
			| "!=" | "<"
			| "<=" | ">"
			| ">=" | "all"
			| "any" | "boolean"
			| "case" | "match"
			| "to-string"
			| "to-number"
			| "to-boolean"
			| "step" | "interpolate"
			| "format" | "concat"
			| "length" | "number-format"
			| "!" | "-"
			| "+" | "*"
			| "/" | "%"
			| "^" | "geometry-type"
			| "zoom" | "feature-state"
			| "global-state"
			| "coalesce"
	)
}

fn string_key(json: &JsonValue) -> Option<Key> {
	match json {
		JsonValue::String(text) => Some(Key::intern(text)),
		_ => None,
	}
}

fn parse_get(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	match array.get(1)? {
		JsonValue::String(key) => Some(arena.add(Expr::GetProperty(Key::intern(key)))),
		JsonValue::Array(inner)
			if inner.get(0).and_then(|head| head.as_str().ok()) == Some("geometry-type") =>
		{
			Some(arena.add(Expr::GetProperty(KEY_TYPE)))
		}
		_ => None,
	}
}

/// `["in", key, v...]`, `["in", key, ["literal", [...]]]` or a dynamically
/// evaluated candidate list.
fn parse_in_filter(arena: &mut ExprArena, array: &JsonArray, positive: bool) -> Option<NodeId> {
	let key = match array.get(1)? {
		JsonValue::String(text) => Key::intern(text),
		JsonValue::Array(inner) => {
			if inner.get(0).and_then(|head| head.as_str().ok()) == Some("get") {
				string_key(inner.get(1)?)?
			} else {
				return None;
			}
		}
		_ => return None,
	};

	let mut values = Vec::new();
	let mut dynamic = None;

	match array.get(2) {
		Some(JsonValue::Array(candidates)) => {
			let head = candidates.get(0).and_then(|value| value.as_str().ok());
			if head == Some("literal") {
				if let Some(JsonValue::Array(items)) = candidates.get(1) {
					values.extend(items.iter().map(variant_of));
				} else {
					values.push(variant_of(candidates.get(1)?));
				}
			} else if head.is_some_and(is_known_head) {
				dynamic = Some(parse_expression(arena, array.get(2)?)?);
			} else {
				values.extend(candidates.iter().map(variant_of));
			}
		}
		Some(_) => {
			for index in 2..array.len() {
				values.push(variant_of(array.get(index)?));
			}
		}
		None => {}
	}

	let expr = if positive {
		Expr::InFilter { key, values, dynamic }
	} else {
		Expr::NotInFilter { key, values, dynamic }
	};
	Some(arena.add(expr))
}

fn parse_children(arena: &mut ExprArena, array: &JsonArray, from: usize) -> Vec<NodeId> {
	(from..array.len())
		.filter_map(|index| parse_expression(arena, array.get(index).unwrap()))
		.collect()
}

fn parse_case(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	if array.len() < 2 {
		return None;
	}
	let mut cases = Vec::new();
	let mut index = 1;
	while index + 1 < array.len() {
		let condition = parse_expression(arena, array.get(index)?);
		let value = parse_expression(arena, array.get(index + 1)?);
		if let (Some(condition), Some(value)) = (condition, value) {
			cases.push((condition, value));
		}
		index += 2;
	}
	let default = parse_expression(arena, array.get(array.len() - 1)?)?;
	Some(arena.add(Expr::Case { cases, default }))
}

/// `["match", input, label-or-labels, value, ..., default]`. A match over a
/// plain property lookup specialises to `PropertyFilter`.
fn parse_match(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	if array.len() < 4 {
		return None;
	}
	let input = parse_expression(arena, array.get(1)?)?;

	let mut mapping = Vec::new();
	let mut index = 2;
	while index + 1 < array.len() - 1 {
		let value = parse_expression(arena, array.get(index + 1)?)?;
		match array.get(index)? {
			JsonValue::Array(labels) => {
				for label in labels {
					mapping.push((variant_of(label), value));
				}
			}
			label => mapping.push((variant_of(label), value)),
		}
		index += 2;
	}
	let default = parse_expression(arena, array.get(array.len() - 1)?)?;

	if let Expr::GetProperty(key) = arena.get(input) {
		let key = *key;
		if key != KEY_ZOOM {
			return Some(arena.add(Expr::PropertyFilter { key, mapping, default }));
		}
	}
	Some(arena.add(Expr::Match { input, mapping, default }))
}

fn parse_step(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	if array.len() < 3 {
		return None;
	}
	let input = parse_expression(arena, array.get(1)?)?;
	let default = parse_expression(arena, array.get(2)?)?;
	let mut stops = Vec::new();
	let mut index = 3;
	while index + 1 < array.len() {
		let stop = parse_expression(arena, array.get(index)?);
		let value = parse_expression(arena, array.get(index + 1)?);
		if let (Some(stop), Some(value)) = (stop, value) {
			stops.push((stop, value));
		}
		index += 2;
	}
	Some(arena.add(Expr::Step { input, stops, default }))
}

/// `["interpolate", ["linear" | "exponential" base | "cubic-bezier" x1 y1 x2 y2],
/// ["zoom"], stop, value, ...]`; the interpolation is keyed by the context
/// zoom.
fn parse_interpolate(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	let JsonValue::Array(method) = array.get(1)? else {
		return None;
	};
	let method_name = method.get(0)?.as_str().ok()?;

	let mut stops = Vec::new();
	let mut index = 3;
	while index + 1 < array.len() {
		let stop = array.get(index)?.as_number().ok()?;
		let value = parse_expression(arena, array.get(index + 1)?)?;
		stops.push((stop, value));
		index += 2;
	}

	match method_name {
		"linear" => Some(arena.add_interpolated(1.0, stops)),
		"exponential" => {
			let base = method.get(1).and_then(|base| base.as_number().ok()).unwrap_or(1.0);
			Some(arena.add_interpolated(base, stops))
		}
		"cubic-bezier" if method.len() == 5 => {
			let x1 = method.get(1)?.as_number().ok()?;
			let y1 = method.get(2)?.as_number().ok()?;
			let x2 = method.get(3)?.as_number().ok()?;
			let y2 = method.get(4)?.as_number().ok()?;
			Some(arena.add_bezier_interpolated(x1, y1, x2, y2, stops))
		}
		_ => None,
	}
}

/// `{"stops": [[stop, value], ...]}`, the legacy object form.
fn parse_legacy_stops(arena: &mut ExprArena, stops_json: &JsonArray) -> Option<NodeId> {
	let mut stops = Vec::new();
	for stop in stops_json {
		let JsonValue::Array(pair) = stop else {
			return None;
		};
		let position = pair.get(0)?.as_number().ok()?;
		let value = parse_expression(arena, pair.get(1)?)?;
		stops.push((position, value));
	}
	Some(arena.add_interpolated(1.0, stops))
}

/// `["format", value, {options}, value, {options}, ...]`; the only read
/// option is `font-scale`.
fn parse_format(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	let mut entries = Vec::new();
	let mut index = 1;
	while index < array.len() {
		let value = parse_expression(arena, array.get(index)?)?;
		let mut scale = 1.0f32;
		if let Some(JsonValue::Object(options)) = array.get(index + 1) {
			if let Ok(Some(font_scale)) = options.get_number("font-scale") {
				scale = font_scale as f32;
			}
		}
		entries.push((value, scale));
		index += 2;
	}
	Some(arena.add(Expr::Format(entries)))
}

fn parse_concat(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	let mut entries = Vec::new();
	for index in 1..array.len() {
		let value = parse_expression(arena, array.get(index)?)?;
		entries.push((value, 1.0f32));
	}
	Some(arena.add(Expr::Format(entries)))
}

/// `["number-format", value, {"min-fraction-digits": n, "max-fraction-digits": n}]`.
fn parse_number_format(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	let value = parse_expression(arena, array.get(1)?)?;
	let mut min_fraction_digits = 0;
	let mut max_fraction_digits = 0;
	if let Some(JsonValue::Object(options)) = array.get(2) {
		if let Ok(Some(min)) = options.get_number("min-fraction-digits") {
			min_fraction_digits = min as usize;
		}
		if let Ok(Some(max)) = options.get_number("max-fraction-digits") {
			max_fraction_digits = max as usize;
		}
	}
	Some(arena.add(Expr::NumberFormat {
		value,
		min_fraction_digits,
		max_fraction_digits,
	}))
}

fn parse_math(arena: &mut ExprArena, array: &JsonArray, head: &str) -> Option<NodeId> {
	let op = match head {
		"-" => MathOp::Minus,
		"+" => MathOp::Plus,
		"*" => MathOp::Multiply,
		"/" => MathOp::Divide,
		"%" => MathOp::Modulo,
		"^" => MathOp::Power,
		_ => return None,
	};
	let lhs = parse_expression(arena, array.get(1)?)?;
	let rhs = match array.get(2) {
		Some(json) => Some(parse_expression(arena, json)?),
		None => None,
	};
	if rhs.is_none() && op != MathOp::Minus {
		return None;
	}
	Some(arena.add(Expr::Math { lhs, rhs, op }))
}

/// A headless array: a homogeneous value vector becomes a literal, an array
/// of sub-expressions becomes an `Array` node. Anything else is unhandled.
fn parse_value_array(arena: &mut ExprArena, array: &JsonArray) -> Option<NodeId> {
	let all_numbers = array.iter().all(|item| matches!(item, JsonValue::Number(_)));
	let all_strings = array.iter().all(|item| matches!(item, JsonValue::String(_)));
	if all_numbers || all_strings {
		return Some(arena.add(Expr::Static(variant_of_array(array))));
	}

	if array.iter().all(|item| matches!(item, JsonValue::Array(_))) {
		let children: Vec<NodeId> = array.iter().filter_map(|item| parse_expression(arena, item)).collect();
		if children.len() == array.len() {
			return Some(arena.add(Expr::Array(children)));
		}
	}
	None
}

/// A literal JSON value as a [`ValueVariant`]. Strings that spell a CSS color
/// become colors.
pub fn variant_of(json: &JsonValue) -> ValueVariant {
	match json {
		JsonValue::Number(value) => number_variant(*value),
		JsonValue::Boolean(value) => ValueVariant::Bool(*value),
		JsonValue::String(text) => match Color::parse(text) {
			Some(color) => ValueVariant::Color(color),
			None => ValueVariant::String(text.clone()),
		},
		JsonValue::Array(array) => {
			if array.get(0).and_then(|head| head.as_str().ok()) == Some("literal") {
				if let Some(inner) = array.get(1) {
					return variant_of(inner);
				}
			}
			variant_of_array(array)
		}
		_ => ValueVariant::Monostate,
	}
}

fn variant_of_array(array: &JsonArray) -> ValueVariant {
	match array.get(0) {
		Some(JsonValue::Number(_)) => ValueVariant::FloatVec(
			array
				.iter()
				.filter_map(|item| item.as_number().ok().map(|number| number as f32))
				.collect(),
		),
		Some(JsonValue::String(_)) => ValueVariant::StringVec(
			array
				.iter()
				.filter_map(|item| item.as_str().ok().map(str::to_owned))
				.collect(),
		),
		_ => ValueVariant::Monostate,
	}
}

/// JSON numbers without a fractional part become `Int64`, everything else
/// `Double`.
fn number_variant(value: f64) -> ValueVariant {
	if value.fract() == 0.0 && value.is_finite() && value.abs() <= 9e15 {
		ValueVariant::Int64(value as i64)
	} else {
		ValueVariant::Double(value)
	}
}

fn compare_op(head: &str) -> CompareOp {
	match head {
		"==" => CompareOp::Equal,
		"!=" => CompareOp::NotEqual,
		"<" => CompareOp::Less,
		"<=" => CompareOp::LessEqual,
		">" => CompareOp::Greater,
		_ => CompareOp::GreaterEqual,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::EvaluationContext;
	use crate::feature::{FeatureContext, GeomType};
	use crate::state::FeatureStateManager;
	use approx::assert_abs_diff_eq;

	fn parse(arena: &mut ExprArena, text: &str) -> NodeId {
		let json = JsonValue::parse_str(text).unwrap();
		parse_expression(arena, &json).expect("expression should parse")
	}

	fn feature(entries: Vec<(&str, ValueVariant)>) -> FeatureContext {
		FeatureContext::new(
			GeomType::LineString,
			entries.into_iter().map(|(k, v)| (Key::intern(k), v)).collect(),
			Some(1),
		)
	}

	#[test]
	fn match_with_mixed_labels() {
		let mut arena = ExprArena::new();
		let id = parse(
			&mut arena,
			r#"["match", ["to-string", ["get", "width"]], "10", 6, "9", 5, ["8","7","6"], 4, 3]"#,
		);
		let state = FeatureStateManager::new();
		let f = feature(vec![("width", ValueVariant::from(8i64))]);
		let value = arena.evaluate(id, &EvaluationContext::new(0.0, 1.0, &f, &state));
		assert_eq!(value, ValueVariant::Int64(4));
	}

	#[test]
	fn match_on_property_specialises_to_a_filter() {
		let mut arena = ExprArena::new();
		let id = parse(&mut arena, r#"["match", ["get", "class"], "river", 1, 2]"#);
		assert!(matches!(arena.get(id), Expr::PropertyFilter { .. }));

		let state = FeatureStateManager::new();
		let river = feature(vec![("class", ValueVariant::from("river"))]);
		assert_eq!(
			arena.evaluate(id, &EvaluationContext::new(0.0, 1.0, &river, &state)),
			ValueVariant::Int64(1)
		);
		let road = feature(vec![("class", ValueVariant::from("road"))]);
		assert_eq!(
			arena.evaluate(id, &EvaluationContext::new(0.0, 1.0, &road, &state)),
			ValueVariant::Int64(2)
		);
	}

	#[test]
	fn interpolate_exponential() {
		let mut arena = ExprArena::new();
		let id = parse(
			&mut arena,
			r#"["interpolate", ["exponential", 1.5], ["zoom"], 13, 0.3, 15, 0.7]"#,
		);
		let state = FeatureStateManager::new();
		let f = feature(vec![]);
		let value = arena.evaluate(id, &EvaluationContext::new(14.0, 1.0, &f, &state));
		match value {
			ValueVariant::Double(v) => assert_abs_diff_eq!(v, 0.46, epsilon = 0.01),
			other => unreachable!("{other:?}"),
		}
	}

	#[test]
	fn legacy_stops_object() {
		let mut arena = ExprArena::new();
		let id = parse(
			&mut arena,
			r#"{"stops": [[12, "rgba(240, 60, 60, 1)"], [15, "rgba(240, 80, 85, 1)"]]}"#,
		);
		assert!(matches!(arena.get(id), Expr::Interpolated { base, .. } if *base == 1.0));
		let state = FeatureStateManager::new();
		let f = feature(vec![]);
		match arena.evaluate(id, &EvaluationContext::new(12.0, 1.0, &f, &state)) {
			ValueVariant::Color(color) => assert_abs_diff_eq!(color.r, 240.0 / 255.0, epsilon = 1e-6),
			other => unreachable!("{other:?}"),
		}
	}

	#[test]
	fn case_expression() {
		let mut arena = ExprArena::new();
		let id = parse(&mut arena, r#"["case", ["has", "name"], 1, 0]"#);
		let state = FeatureStateManager::new();
		assert_eq!(
			arena.evaluate(
				id,
				&EvaluationContext::new(0.0, 1.0, &feature(vec![("name", ValueVariant::from("X"))]), &state)
			),
			ValueVariant::Int64(1)
		);
		assert_eq!(
			arena.evaluate(id, &EvaluationContext::new(0.0, 1.0, &feature(vec![]), &state)),
			ValueVariant::Int64(0)
		);
	}

	#[test]
	fn legacy_in_filter() {
		let mut arena = ExprArena::new();
		let id = parse(&mut arena, r#"["in", "admin_level", 2, 4]"#);
		let state = FeatureStateManager::new();
		assert_eq!(
			arena.evaluate(
				id,
				&EvaluationContext::new(0.0, 1.0, &feature(vec![("admin_level", ValueVariant::from(2i64))]), &state)
			),
			ValueVariant::Bool(true)
		);
		assert_eq!(
			arena.evaluate(
				id,
				&EvaluationContext::new(0.0, 1.0, &feature(vec![("admin_level", ValueVariant::from(3i64))]), &state)
			),
			ValueVariant::Bool(false)
		);
	}

	#[test]
	fn in_filter_with_literal_list() {
		let mut arena = ExprArena::new();
		let id = parse(
			&mut arena,
			r#"["in", ["get", "subclass"], ["literal", ["allotments", "forest", "park"]]]"#,
		);
		let state = FeatureStateManager::new();
		assert_eq!(
			arena.evaluate(
				id,
				&EvaluationContext::new(0.0, 1.0, &feature(vec![("subclass", ValueVariant::from("forest"))]), &state)
			),
			ValueVariant::Bool(true)
		);
	}

	#[test]
	fn not_and_comparison() {
		let mut arena = ExprArena::new();
		let id = parse(&mut arena, r#"["!", ["has", "population"]]"#);
		let state = FeatureStateManager::new();
		assert_eq!(
			arena.evaluate(id, &EvaluationContext::new(0.0, 1.0, &feature(vec![]), &state)),
			ValueVariant::Bool(true)
		);

		let compare = parse(&mut arena, r#"["!=", ["get", "brunnel"], "tunnel"]"#);
		assert_eq!(
			arena.evaluate(
				compare,
				&EvaluationContext::new(0.0, 1.0, &feature(vec![("brunnel", ValueVariant::from("bridge"))]), &state)
			),
			ValueVariant::Bool(true)
		);
	}

	#[test]
	fn number_format_of_parsed_number() {
		let mut arena = ExprArena::new();
		let id = parse(
			&mut arena,
			r#"["number-format", ["to-number", ["literal", "-3.14159"]], {"min-fraction-digits": 1, "max-fraction-digits": 3}]"#,
		);
		let state = FeatureStateManager::new();
		assert_eq!(
			arena.evaluate(id, &EvaluationContext::new(0.0, 1.0, &feature(vec![]), &state)),
			ValueVariant::from("-3.142")
		);
	}

	#[test]
	fn geometry_type_and_zoom_heads() {
		let mut arena = ExprArena::new();
		let geometry = parse(&mut arena, r#"["geometry-type"]"#);
		let state = FeatureStateManager::new();
		assert_eq!(
			arena.evaluate(geometry, &EvaluationContext::new(0.0, 1.0, &feature(vec![]), &state)),
			ValueVariant::from("LineString")
		);

		let zoom = parse(&mut arena, r#"["zoom"]"#);
		assert_eq!(
			arena.evaluate(zoom, &EvaluationContext::new(11.5, 1.0, &feature(vec![]), &state)),
			ValueVariant::Double(11.5)
		);
	}

	#[test]
	fn modulo_on_property() {
		let mut arena = ExprArena::new();
		let id = parse(&mut arena, r#"["%", ["to-number", ["get", "ele"]], 100]"#);
		let state = FeatureStateManager::new();
		assert_eq!(
			arena.evaluate(
				id,
				&EvaluationContext::new(0.0, 1.0, &feature(vec![("ele", ValueVariant::from(2362i64))]), &state)
			),
			ValueVariant::Double(62.0)
		);
	}

	#[test]
	fn color_literals() {
		let mut arena = ExprArena::new();
		let id = parse(&mut arena, r##"["literal", "#0000ff"]"##);
		assert!(matches!(arena.get(id), Expr::Static(ValueVariant::Color(_))));
	}

	#[test]
	fn unknown_head_yields_none() {
		let mut arena = ExprArena::new();
		let json = JsonValue::parse_str(r#"["frobnicate", 1, 2]"#).unwrap();
		assert!(parse_expression(&mut arena, &json).is_none());
	}

	#[test]
	fn format_with_font_scale() {
		let mut arena = ExprArena::new();
		let id = parse(
			&mut arena,
			r#"["format", ["get", "name"], {}, "\n", {}, ["get", "ele"], {"font-scale": 0.75}]"#,
		);
		let state = FeatureStateManager::new();
		let f = feature(vec![
			("name", ValueVariant::from("Niesen")),
			("ele", ValueVariant::from(2362i64)),
		]);
		match arena.evaluate(id, &EvaluationContext::new(0.0, 1.0, &f, &state)) {
			ValueVariant::FormattedStringVec(entries) => {
				assert_eq!(entries.len(), 3);
				assert_eq!(entries[0].text, "Niesen");
				assert_eq!(entries[2].text, "2362");
				assert_abs_diff_eq!(entries[2].scale, 0.75, epsilon = 1e-6);
			}
			other => unreachable!("{other:?}"),
		}
	}
}
