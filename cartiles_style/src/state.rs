//! Mutable feature and global state, external to the style document.
//!
//! Mutations bump a monotonically increasing generation counter
//! ([`FeatureStateManager::current_state_id`]); evaluator caches use it as an
//! invalidation key, so readers observing an old counter may serve a cached
//! result.

use crate::variant::ValueVariant;
use cartiles_core::interner::Key;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct StateMaps {
	feature_states: HashMap<u64, HashMap<Key, ValueVariant>>,
	global_state: HashMap<Key, ValueVariant>,
}

/// Holds per-feature state and process-wide global state.
#[derive(Default)]
pub struct FeatureStateManager {
	maps: Mutex<StateMaps>,
	generation: AtomicU64,
}

impl FeatureStateManager {
	pub fn new() -> FeatureStateManager {
		FeatureStateManager::default()
	}

	/// The generation counter; changes whenever any state is mutated.
	pub fn current_state_id(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// True while no feature state and no global state exists.
	pub fn is_empty(&self) -> bool {
		let maps = self.maps.lock().unwrap();
		maps.feature_states.is_empty() && maps.global_state.is_empty()
	}

	pub fn set_feature_state(&self, feature_id: u64, key: Key, value: ValueVariant) {
		self
			.maps
			.lock()
			.unwrap()
			.feature_states
			.entry(feature_id)
			.or_default()
			.insert(key, value);
		self.generation.fetch_add(1, Ordering::AcqRel);
	}

	pub fn get_feature_value(&self, feature_id: u64, key: Key) -> ValueVariant {
		self
			.maps
			.lock()
			.unwrap()
			.feature_states
			.get(&feature_id)
			.and_then(|state| state.get(&key))
			.cloned()
			.unwrap_or(ValueVariant::Monostate)
	}

	/// The complete state map of one feature.
	pub fn get_feature_state(&self, feature_id: u64) -> HashMap<Key, ValueVariant> {
		self
			.maps
			.lock()
			.unwrap()
			.feature_states
			.get(&feature_id)
			.cloned()
			.unwrap_or_default()
	}

	pub fn set_global_state(&self, key: Key, value: ValueVariant) {
		self.maps.lock().unwrap().global_state.insert(key, value);
		self.generation.fetch_add(1, Ordering::AcqRel);
	}

	pub fn get_global_state(&self, key: Key) -> ValueVariant {
		self
			.maps
			.lock()
			.unwrap()
			.global_state
			.get(&key)
			.cloned()
			.unwrap_or(ValueVariant::Monostate)
	}

	pub fn clear(&self) {
		let mut maps = self.maps.lock().unwrap();
		maps.feature_states.clear();
		maps.global_state.clear();
		drop(maps);
		self.generation.fetch_add(1, Ordering::AcqRel);
	}
}
