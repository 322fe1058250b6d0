//! The set of keys an expression subtree reads.
//!
//! Three disjoint sets are tracked: feature properties, feature-state keys
//! and global-state keys. The union drives the memoisation class of an
//! evaluator, and hashing the referenced context values produces the cache
//! key for one evaluation.

use crate::context::EvaluationContext;
use cartiles_core::interner::{KEY_ZOOM, Key};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// Keys read by an expression subtree, by source.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UsedKeys {
	pub property_keys: BTreeSet<Key>,
	pub feature_state_keys: BTreeSet<Key>,
	pub global_state_keys: BTreeSet<Key>,
}

impl UsedKeys {
	pub fn new() -> UsedKeys {
		UsedKeys::default()
	}

	pub fn with_property_keys(keys: impl IntoIterator<Item = Key>) -> UsedKeys {
		UsedKeys {
			property_keys: keys.into_iter().collect(),
			..UsedKeys::default()
		}
	}

	pub fn with_feature_state_key(key: Key) -> UsedKeys {
		let mut keys = UsedKeys::new();
		keys.feature_state_keys.insert(key);
		keys
	}

	pub fn with_global_state_key(key: Key) -> UsedKeys {
		let mut keys = UsedKeys::new();
		keys.global_state_keys.insert(key);
		keys
	}

	/// Set union; associative and idempotent.
	pub fn include(&mut self, other: &UsedKeys) {
		self.property_keys.extend(other.property_keys.iter().copied());
		self
			.feature_state_keys
			.extend(other.feature_state_keys.iter().copied());
		self.global_state_keys.extend(other.global_state_keys.iter().copied());
	}

	pub fn is_empty(&self) -> bool {
		self.property_keys.is_empty() && self.feature_state_keys.is_empty() && self.global_state_keys.is_empty()
	}

	pub fn contains_property_key(&self, key: Key) -> bool {
		self.property_keys.contains(&key)
	}

	pub fn is_zoom_dependent(&self) -> bool {
		self.property_keys.contains(&KEY_ZOOM)
	}

	pub fn is_state_dependent(&self) -> bool {
		!self.feature_state_keys.is_empty() || !self.global_state_keys.is_empty()
	}

	pub fn is_global_state_dependent(&self) -> bool {
		!self.global_state_keys.is_empty()
	}

	pub fn only_global_state_dependent(&self) -> bool {
		self.feature_state_keys.is_empty() && !self.global_state_keys.is_empty()
	}

	/// True if every key of `other` is contained in `self`.
	pub fn covers(&self, other: &UsedKeys) -> bool {
		other.property_keys.is_subset(&self.property_keys)
			&& other.feature_state_keys.is_subset(&self.feature_state_keys)
			&& other.global_state_keys.is_subset(&self.global_state_keys)
	}

	/// Hashes every referenced value of `context` in stable order, producing
	/// the cache key for one evaluation.
	pub fn context_hash(&self, context: &EvaluationContext) -> u64 {
		let mut hasher = std::collections::hash_map::DefaultHasher::new();

		if let Some(feature) = context.feature {
			for (key, value) in feature.properties() {
				if self.contains_property_key(*key) {
					value.hash(&mut hasher);
				}
			}
			if !self.feature_state_keys.is_empty() {
				for key in &self.feature_state_keys {
					context.state.get_feature_value(feature.identifier, *key).hash(&mut hasher);
				}
			}
		}
		for key in &self.global_state_keys {
			context.state.get_global_state(*key).hash(&mut hasher);
		}

		hasher.finish()
	}
}
