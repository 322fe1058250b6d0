//! The style-expression IR.
//!
//! Expressions live as [`Expr`] nodes in an [`ExprArena`], addressed by
//! [`NodeId`]. The arena hash-conses on insertion, so identical subtrees
//! share one node; within an arena, equal ids imply equal expressions and
//! equality checks can bail on identity. An [`ExprHandle`] bundles a shared
//! arena with a root id, which is the form the rest of the engine passes
//! around.

mod coerce;
mod eval;
pub mod parser;

pub use coerce::FromVariant;
pub use eval::number_format;

use crate::context::EvaluationContext;
use crate::used_keys::UsedKeys;
use crate::variant::ValueVariant;
use cartiles_core::interner::{KEY_ZOOM, Key};
use cartiles_core::{UnitBezier, ZoomRange};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Index of a node inside its [`ExprArena`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
	pub fn index(&self) -> usize {
		self.0 as usize
	}
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
	Equal,
	NotEqual,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MathOp {
	Minus,
	Plus,
	Multiply,
	Divide,
	Modulo,
	Power,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LogOp {
	And,
	Or,
	Not,
}

/// One expression node. Child expressions are referenced by [`NodeId`].
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
	/// A literal. Strings double as property templates: a direct property
	/// lookup first, then `{key}` substitution.
	Static(ValueVariant),
	GetProperty(Key),
	HasProperty(Key),
	HasNotProperty(Key),
	FeatureState(Key),
	GlobalState(Key),
	Compare {
		lhs: NodeId,
		rhs: NodeId,
		op: CompareOp,
	},
	InFilter {
		key: Key,
		values: Vec<ValueVariant>,
		dynamic: Option<NodeId>,
	},
	NotInFilter {
		key: Key,
		values: Vec<ValueVariant>,
		dynamic: Option<NodeId>,
	},
	LogOp {
		op: LogOp,
		lhs: NodeId,
		rhs: Option<NodeId>,
	},
	All(Vec<NodeId>),
	Any(Vec<NodeId>),
	/// First child evaluating to a `Bool` wins, `false` otherwise.
	Boolean(Vec<NodeId>),
	Case {
		cases: Vec<(NodeId, NodeId)>,
		default: NodeId,
	},
	Match {
		input: NodeId,
		mapping: Vec<(ValueVariant, NodeId)>,
		default: NodeId,
	},
	/// `Match` specialised to a plain property lookup, skipping the input
	/// node entirely.
	PropertyFilter {
		key: Key,
		mapping: Vec<(ValueVariant, NodeId)>,
		default: NodeId,
	},
	Step {
		input: NodeId,
		stops: Vec<(NodeId, NodeId)>,
		default: NodeId,
	},
	Interpolated {
		base: f64,
		stops: Vec<(f64, NodeId)>,
		/// `1 / (base^(b-a) - 1)` per interval, precomputed at build time.
		range_factors: Vec<f64>,
		/// Flat stop/value pairs when every stop value is a static number.
		fast_stops: Option<Vec<(f64, f64)>>,
	},
	BezierInterpolated {
		bezier: UnitBezier,
		stops: Vec<(f64, NodeId)>,
	},
	Math {
		lhs: NodeId,
		rhs: Option<NodeId>,
		op: MathOp,
	},
	Length(NodeId),
	Coalesce(Vec<NodeId>),
	Array(Vec<NodeId>),
	Format(Vec<(NodeId, f32)>),
	NumberFormat {
		value: NodeId,
		min_fraction_digits: usize,
		max_fraction_digits: usize,
	},
	ToString(NodeId),
	ToNumber(NodeId),
	ToBoolean(NodeId),
	Scale {
		value: NodeId,
		factor: f64,
	},
}

impl Hash for Expr {
	fn hash<H: Hasher>(&self, state: &mut H) {
		use Expr::*;
		core::mem::discriminant(self).hash(state);
		match self {
			Static(v) => v.hash(state),
			GetProperty(k) | HasProperty(k) | HasNotProperty(k) | FeatureState(k) | GlobalState(k) => k.hash(state),
			Compare { lhs, rhs, op } => (lhs, rhs, op).hash(state),
			InFilter { key, values, dynamic } | NotInFilter { key, values, dynamic } => {
				(key, values, dynamic).hash(state);
			}
			LogOp { op, lhs, rhs } => (op, lhs, rhs).hash(state),
			All(children) | Any(children) | Boolean(children) | Coalesce(children) | Array(children) => {
				children.hash(state);
			}
			Case { cases, default } => (cases, default).hash(state),
			Match { input, mapping, default } => {
				input.hash(state);
				mapping.hash(state);
				default.hash(state);
			}
			PropertyFilter { key, mapping, default } => {
				key.hash(state);
				mapping.hash(state);
				default.hash(state);
			}
			Step { input, stops, default } => (input, stops, default).hash(state),
			Interpolated { base, stops, .. } => {
				base.to_bits().hash(state);
				for (stop, value) in stops {
					stop.to_bits().hash(state);
					value.hash(state);
				}
			}
			BezierInterpolated { bezier, stops } => {
				for coefficient in bezier.coefficients() {
					coefficient.to_bits().hash(state);
				}
				for (stop, value) in stops {
					stop.to_bits().hash(state);
					value.hash(state);
				}
			}
			Math { lhs, rhs, op } => (lhs, rhs, op).hash(state),
			Length(child) | ToString(child) | ToNumber(child) | ToBoolean(child) => child.hash(state),
			NumberFormat {
				value,
				min_fraction_digits,
				max_fraction_digits,
			} => (value, min_fraction_digits, max_fraction_digits).hash(state),
			Format(entries) => {
				for (value, scale) in entries {
					value.hash(state);
					scale.to_bits().hash(state);
				}
			}
			Scale { value, factor } => {
				value.hash(state);
				factor.to_bits().hash(state);
			}
		}
	}
}

/// Owns expression nodes; immutable once parsing finished.
#[derive(Debug, Default)]
pub struct ExprArena {
	nodes: Vec<Expr>,
	dedup: HashMap<u64, Vec<NodeId>>,
}

impl ExprArena {
	pub fn new() -> ExprArena {
		ExprArena::default()
	}

	/// Inserts a node, returning the id of an existing identical node when
	/// possible. Children must already live in this arena, so equal subtrees
	/// reduce to equal child ids.
	pub fn add(&mut self, expr: Expr) -> NodeId {
		let mut hasher = std::collections::hash_map::DefaultHasher::new();
		expr.hash(&mut hasher);
		let fingerprint = hasher.finish();

		if let Some(candidates) = self.dedup.get(&fingerprint) {
			for candidate in candidates {
				if self.nodes[candidate.index()] == expr {
					return *candidate;
				}
			}
		}

		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(expr);
		self.dedup.entry(fingerprint).or_default().push(id);
		id
	}

	/// Builds an `Interpolated` node, precomputing the per-interval range
	/// factors and the flat fast path when every stop value is a static
	/// number.
	pub fn add_interpolated(&mut self, base: f64, stops: Vec<(f64, NodeId)>) -> NodeId {
		let range_factors = stops
			.windows(2)
			.map(|pair| eval::range_factor(base, pair[1].0, pair[0].0))
			.collect();

		let static_numbers: Option<Vec<(f64, f64)>> = stops
			.iter()
			.map(|(stop, value)| match &self.nodes[value.index()] {
				Expr::Static(ValueVariant::Double(v)) => Some((*stop, *v)),
				Expr::Static(ValueVariant::Int64(v)) => Some((*stop, *v as f64)),
				_ => None,
			})
			.collect();

		self.add(Expr::Interpolated {
			base,
			stops,
			range_factors,
			fast_stops: static_numbers,
		})
	}

	pub fn add_bezier_interpolated(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stops: Vec<(f64, NodeId)>) -> NodeId {
		self.add(Expr::BezierInterpolated {
			bezier: UnitBezier::new(x1, y1, x2, y2),
			stops,
		})
	}

	pub fn get(&self, id: NodeId) -> &Expr {
		&self.nodes[id.index()]
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// The keys the subtree under `id` reads.
	pub fn used_keys(&self, id: NodeId) -> UsedKeys {
		use Expr::*;
		let mut keys = UsedKeys::new();
		match self.get(id) {
			Static(value) => match value {
				ValueVariant::String(text) => {
					// The whole string may name a property, and so may every
					// brace placeholder inside it.
					keys.property_keys.insert(Key::intern(text));
					for template_key in eval::template_keys(text) {
						keys.property_keys.insert(Key::intern(&template_key));
					}
				}
				ValueVariant::StringVec(items) if items.first().is_some_and(|first| first == "zoom") => {
					keys.property_keys.insert(KEY_ZOOM);
				}
				_ => {}
			},
			GetProperty(key) | HasProperty(key) | HasNotProperty(key) => {
				keys.property_keys.insert(*key);
			}
			PropertyFilter { key, mapping, default } => {
				keys.property_keys.insert(*key);
				for (_, value) in mapping {
					keys.include(&self.used_keys(*value));
				}
				keys.include(&self.used_keys(*default));
			}
			FeatureState(key) => {
				keys.feature_state_keys.insert(*key);
			}
			GlobalState(key) => {
				keys.global_state_keys.insert(*key);
			}
			InFilter { key, dynamic, .. } | NotInFilter { key, dynamic, .. } => {
				keys.property_keys.insert(*key);
				if let Some(dynamic) = dynamic {
					keys.include(&self.used_keys(*dynamic));
				}
			}
			Interpolated { stops, .. } | BezierInterpolated { stops, .. } => {
				keys.property_keys.insert(KEY_ZOOM);
				for (_, value) in stops {
					keys.include(&self.used_keys(*value));
				}
			}
			_ => {
				for child in self.children(id) {
					keys.include(&self.used_keys(child));
				}
			}
		}
		keys
	}

	/// True for subtrees that only project property values; evaluators skip
	/// caching for these.
	pub fn is_property_projection(&self, id: NodeId) -> bool {
		match self.get(id) {
			Expr::Static(_) | Expr::GetProperty(_) => true,
			Expr::Coalesce(children) | Expr::Array(children) => {
				children.iter().all(|child| self.is_property_projection(*child))
			}
			_ => false,
		}
	}

	/// The zoom interval over which the subtree can change its result. Zoom
	/// reads outside a piecewise curve force the full range.
	pub fn zoom_range(&self, id: NodeId) -> ZoomRange {
		let mut range = ZoomRange::default();
		self.collect_zoom_range(id, &mut range);
		if range.min_zoom > range.max_zoom {
			ZoomRange::full()
		} else {
			range
		}
	}

	fn collect_zoom_range(&self, id: NodeId, range: &mut ZoomRange) {
		use Expr::*;
		match self.get(id) {
			GetProperty(key) if *key == KEY_ZOOM => {
				range.merge_range(ZoomRange::full());
			}
			Static(ValueVariant::StringVec(items)) if items.first().is_some_and(|first| first == "zoom") => {
				range.merge_range(ZoomRange::full());
			}
			Interpolated { stops, .. } | BezierInterpolated { stops, .. } => {
				if let (Some(first), Some(last)) = (stops.first(), stops.last()) {
					range.merge(first.0, last.0);
				}
				for (_, value) in stops {
					self.collect_zoom_range(*value, range);
				}
			}
			Step { input, stops, default } => {
				let zoom_keyed = self.used_keys(*input).is_zoom_dependent();
				let static_stops: Option<Vec<f64>> = stops
					.iter()
					.map(|(stop, _)| match self.get(*stop) {
						Static(value) => value.as_number(),
						_ => None,
					})
					.collect();
				match (zoom_keyed, static_stops) {
					(true, Some(positions)) if !positions.is_empty() => {
						range.merge(positions[0], positions[positions.len() - 1]);
					}
					(true, _) => range.merge_range(ZoomRange::full()),
					(false, _) => self.collect_zoom_range(*input, range),
				}
				for (_, value) in stops {
					self.collect_zoom_range(*value, range);
				}
				self.collect_zoom_range(*default, range);
			}
			_ => {
				for child in self.children(id) {
					self.collect_zoom_range(child, range);
				}
			}
		}
	}

	/// Direct children of a node, in evaluation order.
	fn children(&self, id: NodeId) -> Vec<NodeId> {
		use Expr::*;
		match self.get(id) {
			Static(_) | GetProperty(_) | HasProperty(_) | HasNotProperty(_) | FeatureState(_) | GlobalState(_) => {
				Vec::new()
			}
			Compare { lhs, rhs, .. } => vec![*lhs, *rhs],
			InFilter { dynamic, .. } | NotInFilter { dynamic, .. } => dynamic.iter().copied().collect(),
			LogOp { lhs, rhs, .. } => std::iter::once(*lhs).chain(rhs.iter().copied()).collect(),
			All(children) | Any(children) | Boolean(children) | Coalesce(children) | Array(children) => {
				children.clone()
			}
			Case { cases, default } => cases
				.iter()
				.flat_map(|(condition, value)| [*condition, *value])
				.chain(std::iter::once(*default))
				.collect(),
			Match { input, mapping, default } => std::iter::once(*input)
				.chain(mapping.iter().map(|(_, value)| *value))
				.chain(std::iter::once(*default))
				.collect(),
			PropertyFilter { mapping, default, .. } => mapping
				.iter()
				.map(|(_, value)| *value)
				.chain(std::iter::once(*default))
				.collect(),
			Step { input, stops, default } => std::iter::once(*input)
				.chain(stops.iter().flat_map(|(stop, value)| [*stop, *value]))
				.chain(std::iter::once(*default))
				.collect(),
			Interpolated { stops, .. } | BezierInterpolated { stops, .. } => {
				stops.iter().map(|(_, value)| *value).collect()
			}
			Math { lhs, rhs, .. } => std::iter::once(*lhs).chain(rhs.iter().copied()).collect(),
			Length(child) | ToString(child) | ToNumber(child) | ToBoolean(child) => vec![*child],
			NumberFormat { value, .. } | Scale { value, .. } => vec![*value],
			Format(entries) => entries.iter().map(|(value, _)| *value).collect(),
		}
	}

	/// Structural equality across arenas. Within one arena equal ids suffice,
	/// thanks to hash-consing.
	pub fn structural_equals(&self, id: NodeId, other: &ExprArena, other_id: NodeId) -> bool {
		if std::ptr::eq(self, other) {
			return id == other_id;
		}
		use Expr::*;
		let same_children = |a: &[NodeId], b: &[NodeId]| {
			a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.structural_equals(*x, other, *y))
		};
		match (self.get(id), other.get(other_id)) {
			(Static(a), Static(b)) => a == b,
			(GetProperty(a), GetProperty(b))
			| (HasProperty(a), HasProperty(b))
			| (HasNotProperty(a), HasNotProperty(b))
			| (FeatureState(a), FeatureState(b))
			| (GlobalState(a), GlobalState(b)) => a == b,
			(
				Compare { op: op_a, .. },
				Compare { op: op_b, .. },
			) if op_a == op_b => same_children(&self.children(id), &other.children(other_id)),
			(
				InFilter {
					key: key_a,
					values: values_a,
					..
				},
				InFilter {
					key: key_b,
					values: values_b,
					..
				},
			)
			| (
				NotInFilter {
					key: key_a,
					values: values_a,
					..
				},
				NotInFilter {
					key: key_b,
					values: values_b,
					..
				},
			) => key_a == key_b && values_a == values_b && same_children(&self.children(id), &other.children(other_id)),
			(LogOp { op: op_a, .. }, LogOp { op: op_b, .. }) if op_a == op_b => {
				same_children(&self.children(id), &other.children(other_id))
			}
			(All(_), All(_))
			| (Any(_), Any(_))
			| (Boolean(_), Boolean(_))
			| (Coalesce(_), Coalesce(_))
			| (Array(_), Array(_))
			| (Case { .. }, Case { .. })
			| (Step { .. }, Step { .. }) => same_children(&self.children(id), &other.children(other_id)),
			(
				Match {
					mapping: mapping_a, ..
				},
				Match {
					mapping: mapping_b, ..
				},
			) => {
				mapping_a.len() == mapping_b.len()
					&& mapping_a.iter().zip(mapping_b).all(|(a, b)| a.0 == b.0)
					&& same_children(&self.children(id), &other.children(other_id))
			}
			(
				PropertyFilter {
					key: key_a,
					mapping: mapping_a,
					..
				},
				PropertyFilter {
					key: key_b,
					mapping: mapping_b,
					..
				},
			) => {
				key_a == key_b
					&& mapping_a.len() == mapping_b.len()
					&& mapping_a.iter().zip(mapping_b).all(|(a, b)| a.0 == b.0)
					&& same_children(&self.children(id), &other.children(other_id))
			}
			(
				Interpolated {
					base: base_a,
					stops: stops_a,
					..
				},
				Interpolated {
					base: base_b,
					stops: stops_b,
					..
				},
			) => {
				base_a == base_b
					&& stops_a.len() == stops_b.len()
					&& stops_a.iter().zip(stops_b).all(|(a, b)| a.0 == b.0)
					&& same_children(&self.children(id), &other.children(other_id))
			}
			(
				BezierInterpolated {
					bezier: bezier_a,
					stops: stops_a,
				},
				BezierInterpolated {
					bezier: bezier_b,
					stops: stops_b,
				},
			) => {
				bezier_a == bezier_b
					&& stops_a.len() == stops_b.len()
					&& stops_a.iter().zip(stops_b).all(|(a, b)| a.0 == b.0)
					&& same_children(&self.children(id), &other.children(other_id))
			}
			(Math { op: op_a, .. }, Math { op: op_b, .. }) if op_a == op_b => {
				same_children(&self.children(id), &other.children(other_id))
			}
			(Length(_), Length(_)) | (ToString(_), ToString(_)) | (ToNumber(_), ToNumber(_)) | (ToBoolean(_), ToBoolean(_)) => {
				same_children(&self.children(id), &other.children(other_id))
			}
			(
				NumberFormat {
					min_fraction_digits: min_a,
					max_fraction_digits: max_a,
					..
				},
				NumberFormat {
					min_fraction_digits: min_b,
					max_fraction_digits: max_b,
					..
				},
			) => min_a == min_b && max_a == max_b && same_children(&self.children(id), &other.children(other_id)),
			(Format(entries_a), Format(entries_b)) => {
				entries_a.len() == entries_b.len()
					&& entries_a.iter().zip(entries_b).all(|(a, b)| a.1 == b.1)
					&& same_children(&self.children(id), &other.children(other_id))
			}
			(Scale { factor: factor_a, .. }, Scale { factor: factor_b, .. }) => {
				factor_a == factor_b && same_children(&self.children(id), &other.children(other_id))
			}
			_ => false,
		}
	}
}

/// A shared, owning reference to one expression root.
#[derive(Clone, Debug)]
pub struct ExprHandle {
	arena: Arc<ExprArena>,
	root: NodeId,
}

impl ExprHandle {
	pub fn new(arena: Arc<ExprArena>, root: NodeId) -> ExprHandle {
		ExprHandle { arena, root }
	}

	pub fn root(&self) -> NodeId {
		self.root
	}

	pub fn arena(&self) -> &ExprArena {
		&self.arena
	}

	pub fn evaluate(&self, context: &EvaluationContext) -> ValueVariant {
		self.arena.evaluate(self.root, context)
	}

	pub fn evaluate_or<T: FromVariant>(&self, context: &EvaluationContext, default: T) -> T {
		self.arena.evaluate_or(self.root, context, default)
	}

	pub fn used_keys(&self) -> UsedKeys {
		self.arena.used_keys(self.root)
	}

	pub fn zoom_range(&self) -> ZoomRange {
		self.arena.zoom_range(self.root)
	}

	pub fn is_property_projection(&self) -> bool {
		self.arena.is_property_projection(self.root)
	}

	pub fn equals(&self, other: &ExprHandle) -> bool {
		if Arc::ptr_eq(&self.arena, &other.arena) {
			return self.root == other.root;
		}
		self.arena.structural_equals(self.root, &other.arena, other.root)
	}
}
