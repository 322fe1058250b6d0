//! The per-feature symbol object.

use crate::collision::{CollisionCircle, CollisionGrid, CollisionRect, CollisionResult, Obb2};
use cartiles_core::{Quad2, Vec2};
use cartiles_style::style::types::SymbolPlacement;
use cartiles_style::{FeatureContext, FeatureInfo, FormattedEntry};

/// Two cached collision verdicts within this zoom distance are considered
/// the same placement.
const COLLISION_ZOOM_SNAP: f64 = 0.1;

/// One drawable quad of a symbol: a box of `width × height` pixels around an
/// anchor offset, scaled into world units per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SymbolQuad {
	/// Offset of the box center from the symbol coordinate, in pixels.
	pub offset: Vec2,
	pub width: f64,
	pub height: f64,
	/// Rotation relative to the map, radians.
	pub rotation: f64,
}

impl SymbolQuad {
	pub fn new(offset: Vec2, width: f64, height: f64, rotation: f64) -> SymbolQuad {
		SymbolQuad {
			offset,
			width,
			height,
			rotation,
		}
	}

	pub fn centered(width: f64, height: f64) -> SymbolQuad {
		SymbolQuad::new(Vec2::default(), width, height, 0.0)
	}

	/// The world-space quad at the given coordinate. `scale_factor` converts
	/// pixels to world units, `map_rotation` rotates viewport-aligned parts
	/// with the camera.
	fn world_quad(&self, coordinate: Vec2, scale_factor: f64, map_rotation: f64) -> Quad2 {
		let width = self.width * scale_factor;
		let height = self.height * scale_factor;
		let center = coordinate + self.offset * scale_factor;
		let origin = Vec2::new(center.x - width * 0.5, center.y - height * 0.5);
		Quad2::from_rect_rotated(origin, width, height, self.rotation + map_rotation)
	}
}

/// A 9-slice icon: the quad plus the stretchable bands of its sprite, in
/// sprite-local fractions.
#[derive(Clone, Debug, PartialEq)]
pub struct StretchIcon {
	pub quad: SymbolQuad,
	pub stretch_x: Vec<(f32, f32)>,
	pub stretch_y: Vec<(f32, f32)>,
}

/// A label, possibly placed along a line.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolLabel {
	pub text: Vec<FormattedEntry>,
	pub quad: SymbolQuad,
	pub placement: SymbolPlacement,
	/// Anchor points along the feature line for line placement, world space.
	pub line_points: Vec<Vec2>,
}

impl SymbolLabel {
	pub fn full_text(&self) -> String {
		self.text.iter().map(|entry| entry.text.as_str()).collect()
	}
}

/// One feature's symbol: icon, stretched icon and label with cached boxes and
/// a per-zoom collision memo.
pub struct SymbolObject {
	pub feature: FeatureContext,
	pub coordinate: Vec2,
	pub sort_key: f64,
	/// Position of the symbol within its tile, for deterministic ordering.
	pub tile_index: usize,
	icon: Option<SymbolQuad>,
	stretch_icon: Option<StretchIcon>,
	label: Option<SymbolLabel>,
	part_obbs: Vec<Obb2>,
	last_update: Option<(f64, f64)>,
	collision_memo: Vec<(f64, bool)>,
	visible: bool,
	hide_from_collision: bool,
}

impl SymbolObject {
	pub fn new(feature: FeatureContext, coordinate: Vec2, sort_key: f64, tile_index: usize) -> SymbolObject {
		SymbolObject {
			feature,
			coordinate,
			sort_key,
			tile_index,
			icon: None,
			stretch_icon: None,
			label: None,
			part_obbs: Vec::new(),
			last_update: None,
			collision_memo: Vec::new(),
			visible: false,
			hide_from_collision: false,
		}
	}

	pub fn set_icon(&mut self, icon: SymbolQuad) {
		self.icon = Some(icon);
		self.last_update = None;
	}

	pub fn set_stretch_icon(&mut self, stretch_icon: StretchIcon) {
		self.stretch_icon = Some(stretch_icon);
		self.last_update = None;
	}

	pub fn set_label(&mut self, label: SymbolLabel) {
		self.label = Some(label);
		self.last_update = None;
	}

	pub fn label(&self) -> Option<&SymbolLabel> {
		self.label.as_ref()
	}

	pub fn is_visible(&self) -> bool {
		self.visible
	}

	pub fn set_visible(&mut self, visible: bool) {
		self.visible = visible;
	}

	/// Excludes the symbol from collision; it is not drawn and occupies no
	/// grid space.
	pub fn set_hide_from_collision(&mut self, hide: bool) {
		self.hide_from_collision = hide;
		if hide {
			self.visible = false;
		}
	}

	/// Recomputes the world-space boxes for the current frame parameters.
	pub fn update(&mut self, _zoom: f64, scale_factor: f64, map_rotation: f64) {
		if self.last_update == Some((scale_factor, map_rotation)) {
			return;
		}
		self.last_update = Some((scale_factor, map_rotation));
		self.part_obbs.clear();
		if let Some(icon) = &self.icon {
			self
				.part_obbs
				.push(Obb2::new(&icon.world_quad(self.coordinate, scale_factor, map_rotation)));
		}
		if let Some(stretch_icon) = &self.stretch_icon {
			self.part_obbs.push(Obb2::new(&stretch_icon.quad.world_quad(
				self.coordinate,
				scale_factor,
				map_rotation,
			)));
		}
		if let Some(label) = &self.label {
			self
				.part_obbs
				.push(Obb2::new(&label.quad.world_quad(self.coordinate, scale_factor, map_rotation)));
		}
	}

	/// The axis-aligned box around every part, in world space.
	pub fn bounding_rect(&self) -> Option<CollisionRect> {
		let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
		let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
		for obb in &self.part_obbs {
			for corner in obb.corners() {
				min.x = min.x.min(corner.x);
				min.y = min.y.min(corner.y);
				max.x = max.x.max(corner.x);
				max.y = max.y.max(corner.y);
			}
		}
		(min.x <= max.x).then(|| CollisionRect::new(min.x, min.y, max.x - min.x, max.y - min.y))
	}

	/// Collision circles along the label line for map-aligned line labels.
	pub fn bounding_circles(&self, scale_factor: f64) -> Option<Vec<CollisionCircle>> {
		let label = self.label.as_ref()?;
		if label.placement == SymbolPlacement::Point || label.line_points.is_empty() {
			return None;
		}
		let radius = label.quad.height * scale_factor * 0.5;
		Some(
			label
				.line_points
				.iter()
				.map(|point| CollisionCircle::new(*point, radius))
				.collect(),
		)
	}

	/// The memoised collision verdict nearest to `zoom`, within the snap
	/// distance.
	fn cached_collision(&self, zoom: f64) -> Option<bool> {
		let index = self
			.collision_memo
			.partition_point(|(cached_zoom, _)| *cached_zoom < zoom);
		let mut best: Option<(f64, bool)> = None;
		for candidate in [index.checked_sub(1), Some(index)].into_iter().flatten() {
			if let Some((cached_zoom, collides)) = self.collision_memo.get(candidate) {
				let distance = (cached_zoom - zoom).abs();
				if distance <= COLLISION_ZOOM_SNAP && best.is_none_or(|(d, _)| distance < d) {
					best = Some((distance, *collides));
				}
			}
		}
		best.map(|(_, collides)| collides)
	}

	fn record_collision(&mut self, zoom: f64, collides: bool) {
		let index = self
			.collision_memo
			.partition_point(|(cached_zoom, _)| *cached_zoom < zoom);
		self.collision_memo.insert(index, (zoom, collides));
	}

	/// Runs collision detection at the given zoom, preferring a memoised
	/// verdict within 0.1 zoom. Updates visibility and returns it.
	pub fn collision_detection(&mut self, zoom: f64, scale_factor: f64, grid: &mut CollisionGrid) -> bool {
		if self.hide_from_collision {
			self.visible = false;
			return false;
		}

		let collides = match self.cached_collision(zoom) {
			Some(collides) => collides,
			None => {
				let result = match self.bounding_circles(scale_factor) {
					Some(circles) => grid.try_insert_circles(&circles),
					None => match self.bounding_rect() {
						Some(rect) => grid.try_insert_rect(&rect),
						None => CollisionResult::Collides,
					},
				};
				let collides = result == CollisionResult::Collides;
				self.record_collision(zoom, collides);
				collides
			}
		};

		self.visible = !collides;
		self.visible
	}

	/// Drops every memoised collision verdict, e.g. after a style change.
	pub fn clear_collision_memo(&mut self) {
		self.collision_memo.clear();
	}

	pub fn hit_test(&self, click_obb: &Obb2) -> bool {
		self.part_obbs.iter().any(|obb| obb.overlaps(click_obb))
	}

	pub fn feature_info(&self) -> FeatureInfo {
		self.feature.feature_info()
	}
}
