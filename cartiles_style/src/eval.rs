//! Memoising wrappers around expression roots.
//!
//! At build time an evaluator classifies its expression by the keys it reads:
//! constant, zoom-dependent, state-dependent, or fully dynamic. Per call it
//! either serves a memoised value or evaluates freshly, and
//! [`FeatureValueEvaluator`] additionally tags the result with the minimum
//! dependency class a caller needs to re-check before reusing it across
//! frames.

use crate::context::EvaluationContext;
use crate::expr::{ExprHandle, FromVariant};
use crate::used_keys::UsedKeys;
use cartiles_core::{ZoomEvaluation, ZoomRange};
use lru::LruCache;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Bound of one evaluator's memo map.
const CACHE_CAPACITY: usize = 256;

/// When a cached result must be recomputed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReevaluationPolicy {
	/// The value can never change.
	Never,
	/// Stale once the frame zoom moves relative to the recorded range.
	Zoom(ZoomEvaluation),
	/// Stale once the state generation moves past the recorded one.
	State(u64),
	ZoomAndState(ZoomEvaluation, u64),
	/// Always stale.
	Always,
}

/// A value together with its reevaluation policy.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationResult<T> {
	pub value: T,
	policy: ReevaluationPolicy,
}

impl<T> EvaluationResult<T> {
	pub fn constant(value: T) -> EvaluationResult<T> {
		EvaluationResult {
			value,
			policy: ReevaluationPolicy::Never,
		}
	}

	pub fn always(value: T) -> EvaluationResult<T> {
		EvaluationResult {
			value,
			policy: ReevaluationPolicy::Always,
		}
	}

	pub fn zoom_only(value: T, evaluated_zoom: f64, range: ZoomRange) -> EvaluationResult<T> {
		EvaluationResult {
			value,
			policy: ReevaluationPolicy::Zoom(ZoomEvaluation::new(evaluated_zoom, range)),
		}
	}

	pub fn state_only(value: T, state_id: u64) -> EvaluationResult<T> {
		EvaluationResult {
			value,
			policy: ReevaluationPolicy::State(state_id),
		}
	}

	pub fn zoom_and_state(value: T, evaluated_zoom: f64, range: ZoomRange, state_id: u64) -> EvaluationResult<T> {
		EvaluationResult {
			value,
			policy: ReevaluationPolicy::ZoomAndState(ZoomEvaluation::new(evaluated_zoom, range), state_id),
		}
	}

	pub fn policy(&self) -> ReevaluationPolicy {
		self.policy
	}

	/// Whether the cached value may be stale for the given frame.
	pub fn is_reevaluation_needed(&self, current_zoom: f64, current_state_id: u64) -> bool {
		match &self.policy {
			ReevaluationPolicy::Never => false,
			ReevaluationPolicy::Zoom(evaluation) => evaluation.needs_reevaluation(current_zoom),
			ReevaluationPolicy::State(state_id) => *state_id != current_state_id,
			ReevaluationPolicy::ZoomAndState(evaluation, state_id) => {
				*state_id != current_state_id || evaluation.needs_reevaluation(current_zoom)
			}
			ReevaluationPolicy::Always => true,
		}
	}

	/// Forces the next check to re-evaluate.
	pub fn invalidate(&mut self) {
		self.policy = ReevaluationPolicy::Always;
	}
}

struct DependencyFlags {
	is_static: bool,
	is_zoom_dependent: bool,
	is_state_dependent: bool,
	only_global_state_dependent: bool,
	is_projection: bool,
}

impl DependencyFlags {
	fn of(expr: Option<&ExprHandle>, used_keys: &UsedKeys) -> DependencyFlags {
		DependencyFlags {
			is_static: used_keys.is_empty(),
			is_zoom_dependent: used_keys.is_zoom_dependent(),
			is_state_dependent: used_keys.is_state_dependent(),
			only_global_state_dependent: used_keys.only_global_state_dependent(),
			is_projection: expr.is_some_and(ExprHandle::is_property_projection),
		}
	}
}

/// A caching evaluator for one style property.
///
/// Results are memoised in a bounded map keyed by the hash of every context
/// value the expression reads (plus the zoom for zoom-dependent expressions).
/// The cache is shared across threads behind a mutex.
pub struct ValueEvaluator<T> {
	expr: Option<ExprHandle>,
	used_keys: UsedKeys,
	flags: DependencyFlags,
	static_value: Mutex<Option<T>>,
	/// Single-slot memo for expressions reading only global state, keyed by
	/// the state generation.
	global_value: Mutex<Option<(u64, T)>>,
	cache: Mutex<LruCache<u64, T>>,
}

impl<T: FromVariant + Clone> ValueEvaluator<T> {
	pub fn new(expr: Option<ExprHandle>) -> ValueEvaluator<T> {
		let used_keys = expr.as_ref().map(ExprHandle::used_keys).unwrap_or_default();
		let flags = DependencyFlags::of(expr.as_ref(), &used_keys);
		ValueEvaluator {
			expr,
			used_keys,
			flags,
			static_value: Mutex::new(None),
			global_value: Mutex::new(None),
			cache: Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap())),
		}
	}

	pub fn expr(&self) -> Option<&ExprHandle> {
		self.expr.as_ref()
	}

	pub fn used_keys(&self) -> &UsedKeys {
		&self.used_keys
	}

	/// Replaces the expression and drops all memoised results.
	pub fn update_expression(&mut self, expr: Option<ExprHandle>) {
		self.used_keys = expr.as_ref().map(ExprHandle::used_keys).unwrap_or_default();
		self.flags = DependencyFlags::of(expr.as_ref(), &self.used_keys);
		self.expr = expr;
		self.static_value.get_mut().unwrap().take();
		self.global_value.get_mut().unwrap().take();
		self.cache.get_mut().unwrap().clear();
	}

	pub fn get_result(&self, context: &EvaluationContext, default: &T) -> T {
		let Some(expr) = &self.expr else {
			return default.clone();
		};

		if self.flags.is_static {
			let mut static_value = self.static_value.lock().unwrap();
			return static_value
				.get_or_insert_with(|| expr.evaluate_or(context, default.clone()))
				.clone();
		}

		// Plain projections are cheaper to evaluate than to cache.
		if self.flags.is_projection {
			return expr.evaluate_or(context, default.clone());
		}

		// Globals-only expressions share one value per state generation.
		if self.flags.only_global_state_dependent && !self.flags.is_zoom_dependent {
			let generation = context.state.current_state_id();
			let mut global_value = self.global_value.lock().unwrap();
			if let Some((cached_generation, value)) = global_value.as_ref() {
				if *cached_generation == generation {
					return value.clone();
				}
			}
			let result = expr.evaluate_or(context, default.clone());
			*global_value = Some((generation, result.clone()));
			return result;
		}

		let key = self.cache_key(context);
		let mut cache = self.cache.lock().unwrap();
		if let Some(hit) = cache.get(&key) {
			return hit.clone();
		}
		let result = expr.evaluate_or(context, default.clone());
		cache.put(key, result.clone());
		result
	}

	fn cache_key(&self, context: &EvaluationContext) -> u64 {
		let value_hash = self.used_keys.context_hash(context);
		if self.flags.is_zoom_dependent {
			let mut hasher = std::collections::hash_map::DefaultHasher::new();
			value_hash.hash(&mut hasher);
			context.zoom.to_bits().hash(&mut hasher);
			hasher.finish()
		} else {
			value_hash
		}
	}
}

impl<T: FromVariant + Clone> Clone for ValueEvaluator<T> {
	fn clone(&self) -> ValueEvaluator<T> {
		ValueEvaluator::new(self.expr.clone())
	}
}

/// An uncached evaluator whose results carry their dependency class, for
/// callers that memoise per object (symbol layout, raster styles).
pub struct FeatureValueEvaluator<T> {
	expr: Option<ExprHandle>,
	used_keys: UsedKeys,
	flags: DependencyFlags,
	zoom_range: ZoomRange,
	static_value: Mutex<Option<T>>,
}

impl<T: FromVariant + Clone> FeatureValueEvaluator<T> {
	pub fn new(expr: Option<ExprHandle>) -> FeatureValueEvaluator<T> {
		let used_keys = expr.as_ref().map(ExprHandle::used_keys).unwrap_or_default();
		let flags = DependencyFlags::of(expr.as_ref(), &used_keys);
		let zoom_range = match (&expr, flags.is_zoom_dependent) {
			(Some(expr), true) => expr.zoom_range(),
			_ => ZoomRange::full(),
		};
		FeatureValueEvaluator {
			expr,
			used_keys,
			flags,
			zoom_range,
			static_value: Mutex::new(None),
		}
	}

	pub fn expr(&self) -> Option<&ExprHandle> {
		self.expr.as_ref()
	}

	pub fn used_keys(&self) -> &UsedKeys {
		&self.used_keys
	}

	pub fn is_zoom_dependent(&self) -> bool {
		self.flags.is_zoom_dependent
	}

	pub fn update_expression(&mut self, expr: Option<ExprHandle>) {
		self.used_keys = expr.as_ref().map(ExprHandle::used_keys).unwrap_or_default();
		self.flags = DependencyFlags::of(expr.as_ref(), &self.used_keys);
		self.zoom_range = match (&expr, self.flags.is_zoom_dependent) {
			(Some(expr), true) => expr.zoom_range(),
			_ => ZoomRange::full(),
		};
		self.expr = expr;
		self.static_value.get_mut().unwrap().take();
	}

	pub fn get_result(&self, context: &EvaluationContext, default: &T) -> EvaluationResult<T> {
		let Some(expr) = &self.expr else {
			return EvaluationResult::constant(default.clone());
		};

		if self.flags.is_static {
			let mut static_value = self.static_value.lock().unwrap();
			let value = static_value
				.get_or_insert_with(|| expr.evaluate_or(context, default.clone()))
				.clone();
			return EvaluationResult::constant(value);
		}

		let zoom_dependent = self.flags.is_zoom_dependent;
		let state_dependent = self.flags.is_state_dependent;

		// Property-only expressions cannot change for a fixed feature.
		if !zoom_dependent && !state_dependent {
			return EvaluationResult::constant(expr.evaluate_or(context, default.clone()));
		}

		if zoom_dependent && self.zoom_range.is_full() {
			return EvaluationResult::always(expr.evaluate_or(context, default.clone()));
		}

		let value = expr.evaluate_or(context, default.clone());
		match (zoom_dependent, state_dependent) {
			(true, true) => EvaluationResult::zoom_and_state(
				value,
				context.zoom,
				self.zoom_range,
				context.state.current_state_id(),
			),
			(false, true) => EvaluationResult::state_only(value, context.state.current_state_id()),
			_ => EvaluationResult::zoom_only(value, context.zoom, self.zoom_range),
		}
	}
}

impl<T: FromVariant + Clone> Clone for FeatureValueEvaluator<T> {
	fn clone(&self) -> FeatureValueEvaluator<T> {
		FeatureValueEvaluator::new(self.expr.clone())
	}
}
