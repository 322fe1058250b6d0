//! Per-feature evaluation inputs.
//!
//! A [`FeatureContext`] carries one decoded vector-tile feature: its geometry
//! type, its identifier and its property list. Two synthetic properties are
//! always present, `$id` and `$type`. Property keys are interned handles, the
//! list is scanned linearly (features carry a handful of properties).

use crate::variant::ValueVariant;
use cartiles_core::interner::{KEY_ID, KEY_TYPE, Key};
use std::hash::{Hash, Hasher};

/// Geometry type of a vector-tile feature.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum GeomType {
	#[default]
	Unknown,
	Point,
	LineString,
	Polygon,
}

impl GeomType {
	pub fn as_str(&self) -> &'static str {
		match self {
			GeomType::Unknown => "Unknown",
			GeomType::Point => "Point",
			GeomType::LineString => "LineString",
			GeomType::Polygon => "Polygon",
		}
	}
}

impl From<u64> for GeomType {
	fn from(value: u64) -> GeomType {
		match value {
			1 => GeomType::Point,
			2 => GeomType::LineString,
			3 => GeomType::Polygon,
			_ => GeomType::Unknown,
		}
	}
}

/// One feature and its properties, as handed to every evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureContext {
	pub identifier: u64,
	pub geom_type: GeomType,
	properties: Vec<(Key, ValueVariant)>,
}

impl FeatureContext {
	/// Builds a context from a decoded feature. Without a tile-encoded id the
	/// identifier is a stable hash of the property list.
	pub fn new(geom_type: GeomType, mut properties: Vec<(Key, ValueVariant)>, id: Option<u64>) -> FeatureContext {
		let identifier = id.unwrap_or_else(|| hash_properties(&properties));
		properties.push((KEY_ID, ValueVariant::Int64(identifier as i64)));
		properties.push((KEY_TYPE, ValueVariant::from(geom_type.as_str())));
		FeatureContext {
			identifier,
			geom_type,
			properties,
		}
	}

	pub fn empty() -> FeatureContext {
		FeatureContext::new(GeomType::Unknown, Vec::new(), Some(0))
	}

	pub fn contains(&self, key: Key) -> bool {
		self.properties.iter().any(|(k, _)| *k == key)
	}

	/// The property value for `key`, or monostate when absent.
	pub fn get(&self, key: Key) -> ValueVariant {
		self
			.properties
			.iter()
			.find(|(k, _)| *k == key)
			.map(|(_, v)| v.clone())
			.unwrap_or(ValueVariant::Monostate)
	}

	pub fn properties(&self) -> &[(Key, ValueVariant)] {
		&self.properties
	}

	/// Exported snapshot for interaction callbacks.
	pub fn feature_info(&self) -> FeatureInfo {
		FeatureInfo {
			identifier: self.identifier.to_string(),
			properties: self
				.properties
				.iter()
				.map(|(key, value)| (key.as_str().to_owned(), value.clone()))
				.collect(),
		}
	}
}

fn hash_properties(properties: &[(Key, ValueVariant)]) -> u64 {
	let mut hasher = std::collections::hash_map::DefaultHasher::new();
	for (key, value) in properties {
		key.as_str().hash(&mut hasher);
		value.hash(&mut hasher);
	}
	hasher.finish()
}

/// Identifier and properties of a feature, as exposed to click handlers.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureInfo {
	pub identifier: String,
	pub properties: Vec<(String, ValueVariant)>,
}
