//! Evaluation of [`Expr`](super::Expr) trees.
//!
//! One dispatcher walks the arena; type mismatches degrade to defaults or
//! monostate, never to errors. Interpolation follows the exponential model
//! `f = (base^(x-a) - 1) / (base^(b-a) - 1)` with precomputed range factors.

use super::{CompareOp, Expr, ExprArena, MathOp, NodeId};
use crate::context::EvaluationContext;
use crate::variant::{FormattedEntry, ValueVariant};
use cartiles_core::Color;
use cartiles_core::interner::{KEY_ZOOM, Key};
use std::cmp::Ordering;

impl ExprArena {
	/// Evaluates the subtree under `id` against `context`.
	pub fn evaluate(&self, id: NodeId, context: &EvaluationContext) -> ValueVariant {
		use Expr::*;
		match self.get(id) {
			Static(value) => self.evaluate_static(value, context),
			GetProperty(key) => {
				if *key == KEY_ZOOM {
					return ValueVariant::Double(context.zoom);
				}
				match context.feature {
					Some(feature) => feature.get(*key),
					None => ValueVariant::Monostate,
				}
			}
			HasProperty(key) => {
				ValueVariant::Bool(context.feature.is_some_and(|feature| feature.contains(*key)))
			}
			HasNotProperty(key) => {
				ValueVariant::Bool(!context.feature.is_some_and(|feature| feature.contains(*key)))
			}
			FeatureState(key) => match context.feature {
				Some(feature) => context.state.get_feature_value(feature.identifier, *key),
				None => ValueVariant::Monostate,
			},
			GlobalState(key) => context.state.get_global_state(*key),
			Compare { lhs, rhs, op } => {
				self.evaluate_compare(self.evaluate(*lhs, context), self.evaluate(*rhs, context), *op)
			}
			InFilter { key, values, dynamic } => {
				ValueVariant::Bool(self.evaluate_in(*key, values, *dynamic, context))
			}
			NotInFilter { key, values, dynamic } => {
				ValueVariant::Bool(!self.evaluate_in(*key, values, *dynamic, context))
			}
			LogOp { op, lhs, rhs } => {
				let truthy = |id: NodeId| self.evaluate(id, context).to_boolean();
				ValueVariant::Bool(match op {
					super::LogOp::And => truthy(*lhs) && rhs.map(truthy).unwrap_or(false),
					super::LogOp::Or => truthy(*lhs) || rhs.map(truthy).unwrap_or(false),
					super::LogOp::Not => !truthy(*lhs),
				})
			}
			All(children) => {
				ValueVariant::Bool(children.iter().all(|child| self.evaluate(*child, context).to_boolean()))
			}
			Any(children) => {
				ValueVariant::Bool(children.iter().any(|child| self.evaluate(*child, context).to_boolean()))
			}
			Boolean(children) => {
				for child in children {
					if let ValueVariant::Bool(value) = self.evaluate(*child, context) {
						return ValueVariant::Bool(value);
					}
				}
				ValueVariant::Bool(false)
			}
			Case { cases, default } => {
				for (condition, value) in cases {
					if self.evaluate(*condition, context).to_boolean() {
						return self.evaluate(*value, context);
					}
				}
				self.evaluate(*default, context)
			}
			Match { input, mapping, default } => {
				let value = self.evaluate(*input, context);
				for (candidate, result) in mapping {
					if *candidate == value {
						return self.evaluate(*result, context);
					}
				}
				self.evaluate(*default, context)
			}
			PropertyFilter { key, mapping, default } => {
				if let Some(feature) = context.feature {
					let value = feature.get(*key);
					if !value.is_monostate() {
						for (candidate, result) in mapping {
							if *candidate == value {
								return self.evaluate(*result, context);
							}
						}
					}
				}
				self.evaluate(*default, context)
			}
			Step { input, stops, default } => {
				let value = self.evaluate(*input, context);
				for (index, (stop, _)) in stops.iter().enumerate() {
					let stop_value = self.evaluate(*stop, context);
					if compare_variants(&stop_value, &value, CompareOp::Greater) == Some(true) {
						return if index == 0 {
							self.evaluate(*default, context)
						} else {
							self.evaluate(stops[index - 1].1, context)
						};
					}
				}
				match stops.last() {
					Some((_, value)) => self.evaluate(*value, context),
					None => self.evaluate(*default, context),
				}
			}
			Interpolated {
				base,
				stops,
				range_factors,
				fast_stops,
			} => {
				if stops.is_empty() {
					return ValueVariant::Monostate;
				}
				if let Some(fast) = fast_stops {
					return evaluate_fast_interpolation(*base, fast, range_factors, context.zoom);
				}
				let last = stops.len() - 1;
				for i in 0..last {
					let (next_stop, next_value) = stops[i + 1];
					if next_stop >= context.zoom {
						let (prev_stop, prev_value) = stops[i];
						let factor = interpolation_factor(*base, range_factors[i], context.zoom, prev_stop);
						return interpolate_variants(
							factor,
							&self.evaluate(prev_value, context),
							&self.evaluate(next_value, context),
						);
					}
				}
				self.evaluate(stops[last].1, context)
			}
			BezierInterpolated { bezier, stops } => {
				if stops.is_empty() {
					return ValueVariant::Monostate;
				}
				let last = stops.len() - 1;
				for i in 0..last {
					let (next_stop, next_value) = stops[i + 1];
					if next_stop >= context.zoom {
						let (prev_stop, prev_value) = stops[i];
						let t = 1.0 - (next_stop - context.zoom) / (next_stop - prev_stop);
						let factor = bezier.solve(t, 1e-6);
						return interpolate_variants(
							factor,
							&self.evaluate(prev_value, context),
							&self.evaluate(next_value, context),
						);
					}
				}
				let index = if context.zoom <= stops[0].0 { 0 } else { last };
				self.evaluate(stops[index].1, context)
			}
			Math { lhs, rhs, op } => {
				let lhs_value = self.evaluate_or(*lhs, context, 0.0f64);
				let rhs_value = rhs.map(|rhs| self.evaluate_or(rhs, context, 0.0f64));
				ValueVariant::Double(match op {
					MathOp::Minus => match rhs_value {
						Some(rhs_value) => lhs_value - rhs_value,
						None => -lhs_value,
					},
					MathOp::Plus => lhs_value + rhs_value.unwrap_or(0.0),
					MathOp::Multiply => lhs_value * rhs_value.unwrap_or(0.0),
					MathOp::Divide => lhs_value / rhs_value.unwrap_or(0.0),
					MathOp::Modulo => lhs_value % rhs_value.unwrap_or(0.0),
					MathOp::Power => lhs_value.powf(rhs_value.unwrap_or(0.0)),
				})
			}
			Length(child) => ValueVariant::Int64(match self.evaluate(*child, context) {
				ValueVariant::String(text) => text.len() as i64,
				ValueVariant::FloatVec(items) => items.len() as i64,
				ValueVariant::StringVec(items) => items.len() as i64,
				ValueVariant::FormattedStringVec(items) => items.len() as i64,
				_ => 0,
			}),
			Coalesce(children) => {
				for child in children {
					let value = self.evaluate(*child, context);
					if !value.is_monostate() {
						return value;
					}
				}
				ValueVariant::Monostate
			}
			Array(children) => {
				let mut floats = Vec::with_capacity(children.len());
				let mut strings = Vec::with_capacity(children.len());
				for child in children {
					match self.evaluate(*child, context) {
						ValueVariant::Double(value) => floats.push(value as f32),
						ValueVariant::Int64(value) => floats.push(value as f32),
						ValueVariant::String(value) => strings.push(value),
						_ => {}
					}
				}
				if floats.len() == children.len() {
					ValueVariant::FloatVec(floats)
				} else if strings.len() == children.len() {
					ValueVariant::StringVec(strings)
				} else {
					ValueVariant::Monostate
				}
			}
			Format(entries) => ValueVariant::FormattedStringVec(
				entries
					.iter()
					.map(|(value, scale)| {
						FormattedEntry::new(self.evaluate(*value, context).to_string_value(), *scale)
					})
					.collect(),
			),
			NumberFormat {
				value,
				min_fraction_digits,
				max_fraction_digits,
			} => {
				let evaluated = self.evaluate(*value, context);
				let number = match &evaluated {
					ValueVariant::Double(_) | ValueVariant::Int64(_) => evaluated.as_number(),
					ValueVariant::String(text) => text.trim().parse().ok(),
					_ => None,
				};
				match number {
					Some(number) => {
						ValueVariant::String(number_format(number, *min_fraction_digits, *max_fraction_digits))
					}
					None => ValueVariant::Monostate,
				}
			}
			ToString(child) => ValueVariant::String(self.evaluate(*child, context).to_string_value()),
			ToNumber(child) => ValueVariant::Double(self.evaluate(*child, context).to_number()),
			ToBoolean(child) => ValueVariant::Bool(self.evaluate(*child, context).to_boolean()),
			Scale { value, factor } => match self.evaluate(*value, context).as_number() {
				Some(number) => ValueVariant::Double(number * factor),
				None => ValueVariant::Double(0.0),
			},
		}
	}

	/// String literals double as property templates: a direct lookup by the
	/// full string first, `{key}` substitution otherwise. A leading `"zoom"`
	/// in a string vector diverts to the context zoom.
	fn evaluate_static(&self, value: &ValueVariant, context: &EvaluationContext) -> ValueVariant {
		match value {
			ValueVariant::String(text) => {
				if let Some(feature) = context.feature {
					let direct = feature.get(Key::intern(text));
					if !direct.is_monostate() {
						return direct;
					}
				}
				ValueVariant::String(substitute_templates(text, context))
			}
			ValueVariant::StringVec(items) if items.first().is_some_and(|first| first == "zoom") => {
				ValueVariant::Double(context.zoom)
			}
			other => other.clone(),
		}
	}

	fn evaluate_compare(&self, lhs: ValueVariant, rhs: ValueVariant, op: CompareOp) -> ValueVariant {
		// Absent values only answer equality questions; ordering stays absent
		// so that enclosing nodes fall back to their defaults.
		if lhs.is_monostate() || rhs.is_monostate() {
			let both_absent = lhs.is_monostate() && rhs.is_monostate();
			return match op {
				CompareOp::Equal => ValueVariant::Bool(both_absent),
				CompareOp::NotEqual => ValueVariant::Bool(!both_absent),
				_ => ValueVariant::Monostate,
			};
		}

		if matches!(op, CompareOp::Equal | CompareOp::NotEqual) {
			if let Some(equal) = color_string_equality(&lhs, &rhs) {
				return ValueVariant::Bool(if op == CompareOp::Equal { equal } else { !equal });
			}
		}

		match compare_variants(&lhs, &rhs, op) {
			Some(result) => ValueVariant::Bool(result),
			None => ValueVariant::Monostate,
		}
	}

	fn evaluate_in(
		&self,
		key: Key,
		values: &[ValueVariant],
		dynamic: Option<NodeId>,
		context: &EvaluationContext,
	) -> bool {
		let value = match context.feature {
			Some(feature) => feature.get(key),
			None => ValueVariant::Monostate,
		};
		if values.contains(&value) {
			return true;
		}

		let Some(dynamic) = dynamic else {
			return false;
		};
		match (&value, self.evaluate(dynamic, context)) {
			(ValueVariant::String(text), ValueVariant::StringVec(candidates)) => {
				candidates.iter().any(|candidate| candidate == text)
			}
			(ValueVariant::Double(_) | ValueVariant::Int64(_), ValueVariant::FloatVec(candidates)) => {
				let number = value.as_number().unwrap();
				candidates.iter().any(|candidate| f64::from(*candidate) == number)
			}
			_ => false,
		}
	}
}

/// `1 / (base^(b-a) - 1)` for one stop interval; the linear case reduces to
/// `1 / (b-a)`.
pub(super) fn range_factor(base: f64, b: f64, a: f64) -> f64 {
	let range = b - a;
	if base == 1.0 {
		1.0 / range
	} else {
		1.0 / (base.powf(range) - 1.0)
	}
}

pub(super) fn interpolation_factor(base: f64, range_factor: f64, x: f64, a: f64) -> f64 {
	let progress = (x - a).max(0.0);
	if base == 1.0 {
		range_factor * progress
	} else {
		range_factor * (base.powf(progress) - 1.0)
	}
}

fn evaluate_fast_interpolation(base: f64, stops: &[(f64, f64)], range_factors: &[f64], zoom: f64) -> ValueVariant {
	let last = stops.len() - 1;
	for i in 0..last {
		let (next_stop, next_value) = stops[i + 1];
		if next_stop >= zoom {
			let (prev_stop, prev_value) = stops[i];
			let factor = interpolation_factor(base, range_factors[i], zoom, prev_stop);
			return ValueVariant::Double(prev_value + (next_value - prev_value) * factor);
		}
	}
	ValueVariant::Double(stops[last].1)
}

/// Interpolates between two variants: linear on numbers and color channels,
/// element-wise on float vectors, step-at-half for everything else.
pub(super) fn interpolate_variants(factor: f64, base: &ValueVariant, top: &ValueVariant) -> ValueVariant {
	use ValueVariant::*;
	match (base, top) {
		(Double(_) | Int64(_), Double(_) | Int64(_)) => {
			let base = base.as_number().unwrap();
			let top = top.as_number().unwrap();
			Double(base + (top - base) * factor)
		}
		(FloatVec(base), FloatVec(top)) if base.len() == top.len() => FloatVec(
			base
				.iter()
				.zip(top)
				.map(|(b, t)| b + (t - b) * factor as f32)
				.collect(),
		),
		(Color(base), Color(top)) => Color(cartiles_core::Color::new(
			base.r + (top.r - base.r) * factor as f32,
			base.g + (top.g - base.g) * factor as f32,
			base.b + (top.b - base.b) * factor as f32,
			base.a + (top.a - base.a) * factor as f32,
		)),
		_ => {
			if factor < 0.5 {
				base.clone()
			} else {
				top.clone()
			}
		}
	}
}

/// Comparison under the variant coercion rules; `None` when the two types
/// have no ordering.
pub(super) fn compare_variants(lhs: &ValueVariant, rhs: &ValueVariant, op: CompareOp) -> Option<bool> {
	match op {
		CompareOp::Equal => Some(lhs == rhs),
		CompareOp::NotEqual => Some(lhs != rhs),
		CompareOp::Less => lhs.partial_cmp_variant(rhs).map(|ord| ord == Ordering::Less),
		CompareOp::LessEqual => lhs.partial_cmp_variant(rhs).map(|ord| ord != Ordering::Greater),
		CompareOp::Greater => lhs.partial_cmp_variant(rhs).map(|ord| ord == Ordering::Greater),
		CompareOp::GreaterEqual => lhs.partial_cmp_variant(rhs).map(|ord| ord != Ordering::Less),
	}
}

/// Equality of a color against a string parsed as a color, in either order.
fn color_string_equality(lhs: &ValueVariant, rhs: &ValueVariant) -> Option<bool> {
	match (lhs, rhs) {
		(ValueVariant::Color(color), ValueVariant::String(text))
		| (ValueVariant::String(text), ValueVariant::Color(color)) => {
			Color::parse(text).map(|parsed| parsed == *color)
		}
		_ => None,
	}
}

/// The `{key}` placeholders of a template string. A backslash before the
/// brace escapes it.
pub(super) fn template_keys(text: &str) -> Vec<String> {
	let mut keys = Vec::new();
	let bytes = text.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'{' && (i == 0 || bytes[i - 1] != b'\\') {
			if let Some(close) = find_closing_brace(bytes, i + 1) {
				keys.push(text[i + 1..close].to_owned());
				i = close + 1;
				continue;
			}
		}
		i += 1;
	}
	keys
}

fn find_closing_brace(bytes: &[u8], from: usize) -> Option<usize> {
	(from..bytes.len()).find(|&i| bytes[i] == b'}' && bytes[i - 1] != b'\\')
}

fn substitute_templates(text: &str, context: &EvaluationContext) -> String {
	let mut result = String::with_capacity(text.len());
	let bytes = text.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'{' && (i == 0 || bytes[i - 1] != b'\\') {
			if let Some(close) = find_closing_brace(bytes, i + 1) {
				let key = &text[i + 1..close];
				let replacement = match context.feature {
					Some(feature) => feature.get(Key::intern(key)).to_string_value(),
					None => String::new(),
				};
				result.push_str(&replacement);
				i = close + 1;
				continue;
			}
		}
		result.push(char::from(bytes[i]));
		i += 1;
	}
	result
}

/// Rounds to `max_fraction_digits`, then strips trailing zeros down to
/// `min_fraction_digits`, locale-free.
pub fn number_format(value: f64, min_fraction_digits: usize, max_fraction_digits: usize) -> String {
	let mut result = format!("{value:.max_fraction_digits$}");
	if let Some(dot) = result.find('.') {
		let mut keep = result.len() - dot - 1;
		while keep > min_fraction_digits && result.as_bytes()[dot + keep] == b'0' {
			keep -= 1;
		}
		result.truncate(if keep == 0 { dot } else { dot + 1 + keep });
	} else if min_fraction_digits > 0 {
		result.push('.');
		result.push_str(&"0".repeat(min_fraction_digits));
	}
	result
}
