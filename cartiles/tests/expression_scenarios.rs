//! End-to-end scenarios for the expression language, driven through the
//! public API: parse from style JSON, evaluate against features, check the
//! memoising evaluators.

use cartiles::style::expr::parser::parse_expression;
use cartiles::style::expr::{ExprArena, ExprHandle};
use cartiles::style::{
	EvaluationContext, FeatureContext, FeatureStateManager, FeatureValueEvaluator, GeomType, ValueEvaluator,
	ValueVariant,
};
use cartiles::core::interner::Key;
use cartiles::core::json::JsonValue;
use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn expression(text: &str) -> ExprHandle {
	let _ = env_logger::builder().is_test(true).try_init();
	let mut arena = ExprArena::new();
	let json = JsonValue::parse_str(text).unwrap();
	let root = parse_expression(&mut arena, &json).expect("expression should parse");
	ExprHandle::new(Arc::new(arena), root)
}

fn feature(entries: Vec<(&str, ValueVariant)>) -> FeatureContext {
	FeatureContext::new(
		GeomType::LineString,
		entries.into_iter().map(|(k, v)| (Key::intern(k), v)).collect(),
		Some(1),
	)
}

#[test]
fn match_over_stringified_width() {
	// ["match", ["to-string", ["get", "width"]], "10", 6, "9", 5, ["8","7","6"], 4, 3]
	let expr = expression(r#"["match", ["to-string", ["get", "width"]], "10", 6, "9", 5, ["8","7","6"], 4, 3]"#);
	let state = FeatureStateManager::new();

	let cases = [(8i64, 4i64), (10, 6), (9, 5), (7, 4), (11, 3)];
	for (width, expected) in cases {
		let f = feature(vec![("width", ValueVariant::from(width))]);
		let context = EvaluationContext::new(0.0, 1.0, &f, &state);
		assert_eq!(expr.evaluate(&context), ValueVariant::Int64(expected), "width {width}");
	}
}

#[test]
fn exponential_zoom_interpolation() {
	let expr = expression(r#"["interpolate", ["exponential", 1.5], ["zoom"], 13, 0.3, 15, 0.7]"#);
	let state = FeatureStateManager::new();
	let f = feature(vec![]);

	let context = EvaluationContext::new(14.0, 1.0, &f, &state);
	let expected = 0.3 + (0.7 - 0.3) * ((1.5f64.powf(1.0) - 1.0) / (1.5f64.powf(2.0) - 1.0));
	assert_abs_diff_eq!(expr.evaluate_or(&context, 0.0), expected, epsilon = 1e-12);
	assert_abs_diff_eq!(expr.evaluate_or(&context, 0.0), 0.46, epsilon = 0.01);

	// Endpoints are exact.
	assert_eq!(
		expr.evaluate_or(&EvaluationContext::new(13.0, 1.0, &f, &state), 0.0),
		0.3
	);
	assert_eq!(
		expr.evaluate_or(&EvaluationContext::new(15.0, 1.0, &f, &state), 0.0),
		0.7
	);
}

#[test]
fn case_over_property_presence() {
	let expr = expression(r#"["case", ["has", "name"], 1, 0]"#);
	let state = FeatureStateManager::new();

	let named = feature(vec![("name", ValueVariant::from("X"))]);
	let unnamed = feature(vec![]);
	assert_eq!(
		expr.evaluate(&EvaluationContext::new(0.0, 1.0, &named, &state)),
		ValueVariant::Int64(1)
	);
	assert_eq!(
		expr.evaluate(&EvaluationContext::new(0.0, 1.0, &unnamed, &state)),
		ValueVariant::Int64(0)
	);
}

#[test]
fn class_membership_filter() {
	let expr = expression(r#"["in", "class", "park", "forest"]"#);
	let state = FeatureStateManager::new();

	let park = feature(vec![("class", ValueVariant::from("park"))]);
	let river = feature(vec![("class", ValueVariant::from("river"))]);
	assert_eq!(
		expr.evaluate(&EvaluationContext::new(0.0, 1.0, &park, &state)),
		ValueVariant::Bool(true)
	);
	assert_eq!(
		expr.evaluate(&EvaluationContext::new(0.0, 1.0, &river, &state)),
		ValueVariant::Bool(false)
	);
}

#[test]
fn number_format_of_a_parsed_string() {
	let expr = expression(
		r#"["number-format", ["to-number", ["literal", "-3.14159"]], {"min-fraction-digits": 1, "max-fraction-digits": 3}]"#,
	);
	let state = FeatureStateManager::new();
	let f = feature(vec![]);
	assert_eq!(
		expr.evaluate(&EvaluationContext::new(0.0, 1.0, &f, &state)),
		ValueVariant::from("-3.142")
	);
}

#[test]
fn format_length_and_number_format_round_trips() {
	let state = FeatureStateManager::new();
	let f = feature(vec![]);
	let context = EvaluationContext::new(0.0, 1.0, &f, &state);

	let format = expression(r#"["length", ["format", "abc", {}, "de", {}]]"#);
	assert_eq!(format.evaluate(&context), ValueVariant::Int64(2));

	let number = expression(r#"["to-string", ["number-format", 123.456, {"min-fraction-digits": 2, "max-fraction-digits": 2}]]"#);
	assert_eq!(number.evaluate(&context), ValueVariant::from("123.46"));
}

#[test]
fn evaluator_matches_fresh_evaluation_for_every_dependency_class() {
	let state = FeatureStateManager::new();
	let expressions = [
		r#"3.25"#,
		r#"["get", "rank"]"#,
		r#"["interpolate", ["linear"], ["zoom"], 4, 1, 9, 12]"#,
		r#"["case", ["boolean", ["feature-state", "selected"]], 2, 1]"#,
	];
	for text in expressions {
		let expr = expression(text);
		let evaluator: ValueEvaluator<f64> = ValueEvaluator::new(Some(expr.clone()));
		for zoom in [2.0, 5.0, 8.0, 5.0] {
			for rank in [1i64, 2, 1] {
				let f = feature(vec![("rank", ValueVariant::from(rank))]);
				let context = EvaluationContext::new(zoom, 1.0, &f, &state);
				assert_eq!(
					evaluator.get_result(&context, &0.5),
					expr.evaluate_or(&context, 0.5),
					"{text} at zoom {zoom}, rank {rank}"
				);
			}
		}
	}
}

#[test]
fn state_generation_invalidates_classified_results() {
	let expr = expression(r#"["case", ["boolean", ["feature-state", "selected"]], 2, 1]"#);
	let evaluator: FeatureValueEvaluator<f64> = FeatureValueEvaluator::new(Some(expr));
	let state = FeatureStateManager::new();
	let f = feature(vec![]);

	let context = EvaluationContext::new(10.0, 1.0, &f, &state);
	let result = evaluator.get_result(&context, &0.0);
	assert_eq!(result.value, 1.0);
	assert!(!result.is_reevaluation_needed(10.0, state.current_state_id()));

	state.set_feature_state(f.identifier, Key::intern("selected"), ValueVariant::from(true));
	assert!(result.is_reevaluation_needed(10.0, state.current_state_id()));

	let updated = evaluator.get_result(&context, &0.0);
	assert_eq!(updated.value, 2.0);
}

#[test]
fn interner_round_trips_through_expressions() {
	let first = Key::intern("surface");
	let second = Key::intern("surface");
	assert_eq!(first, second);
	assert_eq!(first.as_str(), "surface");

	// An expression over the same property shares the handle.
	let expr = expression(r#"["get", "surface"]"#);
	assert!(expr.used_keys().contains_property_key(first));
}

#[test]
fn shared_subtrees_compare_equal_across_documents() {
	let a = expression(r#"["==", ["get", "class"], "park"]"#);
	let b = expression(r#"["==", ["get", "class"], "park"]"#);
	let c = expression(r#"["==", ["get", "class"], "lake"]"#);
	assert!(a.equals(&b));
	assert!(!a.equals(&c));
}
