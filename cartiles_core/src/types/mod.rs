//! Plain-data primitives: vectors, coordinates, colors, zoom ranges and the
//! unit bezier used by interpolation expressions.

mod color;
mod coord;
mod rect_coord;
mod unit_bezier;
mod vec2;
mod zoom_range;

pub use color::Color;
pub use coord::{Coord, TileCoord};
pub use rect_coord::RectCoord;
pub use unit_bezier::UnitBezier;
pub use vec2::{Quad2, Vec2};
pub use zoom_range::{ZoomEvaluation, ZoomRange};
