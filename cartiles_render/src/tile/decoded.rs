//! Decoded vector-tile features, as handed over by the wire decoder.
//!
//! The decoder is an external collaborator; this module receives its output
//! as plain data with tile-local integer coordinates in `[0, extent]` and
//! converts them into world space through the tile's bounds.

use cartiles_core::interner::Key;
use cartiles_core::{RectCoord, Vec2};
use cartiles_style::{FeatureContext, GeomType, ValueVariant};

/// Geometry of one feature in tile-local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureGeometry {
	Points(Vec<Vec2>),
	Lines(Vec<Vec<Vec2>>),
	/// Each polygon is an exterior ring followed by its holes.
	Polygons(Vec<PolygonRings>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolygonRings {
	pub exterior: Vec<Vec2>,
	pub holes: Vec<Vec<Vec2>>,
}

/// One decoded feature, before styling.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFeature {
	pub geom_type: GeomType,
	pub id: Option<u64>,
	pub properties: Vec<(Key, ValueVariant)>,
	pub geometry: FeatureGeometry,
	/// The decoder's coordinate extent, commonly 4096.
	pub extent: f64,
}

impl DecodedFeature {
	/// The evaluation-side view of this feature.
	pub fn feature_context(&self) -> FeatureContext {
		FeatureContext::new(self.geom_type, self.properties.clone(), self.id)
	}

	/// Converts the tile-local geometry into world space within `bounds`.
	pub fn project(&self, bounds: &RectCoord) -> FeatureGeometry {
		let project_point = |point: &Vec2| {
			let coord = bounds.project(*point, self.extent);
			Vec2::new(coord.x, coord.y)
		};
		let project_ring = |ring: &Vec<Vec2>| ring.iter().map(project_point).collect::<Vec<Vec2>>();
		match &self.geometry {
			FeatureGeometry::Points(points) => FeatureGeometry::Points(points.iter().map(project_point).collect()),
			FeatureGeometry::Lines(lines) => FeatureGeometry::Lines(lines.iter().map(project_ring).collect()),
			FeatureGeometry::Polygons(polygons) => FeatureGeometry::Polygons(
				polygons
					.iter()
					.map(|polygon| PolygonRings {
						exterior: project_ring(&polygon.exterior),
						holes: polygon.holes.iter().map(project_ring).collect(),
					})
					.collect(),
			),
		}
	}
}
