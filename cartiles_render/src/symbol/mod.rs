//! Symbol objects and their placement.
//!
//! A symbol bundles up to three drawable parts for one feature: a plain
//! icon, a 9-slice stretched icon and a label. Each carries an oriented
//! bounding box recomputed per frame; collision verdicts are memoised per
//! zoom.

mod object;
mod placement;

pub use object::{StretchIcon, SymbolLabel, SymbolObject, SymbolQuad};
pub use placement::{Placement, centroid, line_placements, midpoint_placement};

use crate::collision::Obb2;
use cartiles_core::{Coord, Quad2, Vec2};
use cartiles_style::FeatureInfo;

/// Resolves a click against visible symbols, topmost first.
///
/// The click becomes a tiny box in world space; symbols are tested in
/// reverse render order and the first hit wins.
pub fn resolve_click(symbols: &[SymbolObject], click: Vec2, half_size: f64) -> Option<(Coord, FeatureInfo)> {
	let click_obb = Obb2::new(&Quad2::from_rect_rotated(
		Vec2::new(click.x - half_size, click.y - half_size),
		half_size * 2.0,
		half_size * 2.0,
		0.0,
	));
	symbols
		.iter()
		.rev()
		.find(|symbol| symbol.is_visible() && symbol.hit_test(&click_obb))
		.map(|symbol| (Coord::from(symbol.coordinate), symbol.feature_info()))
}
