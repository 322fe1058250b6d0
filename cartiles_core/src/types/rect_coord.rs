use crate::types::{Coord, Vec2};

/// An axis-aligned rectangle in world space, anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectCoord {
	pub top_left: Coord,
	pub width: f64,
	pub height: f64,
}

impl RectCoord {
	pub const fn new(top_left: Coord, width: f64, height: f64) -> RectCoord {
		RectCoord {
			top_left,
			width,
			height,
		}
	}

	pub fn center(&self) -> Coord {
		Coord::new(
			self.top_left.x + self.width * 0.5,
			self.top_left.y + self.height * 0.5,
		)
	}

	/// Maps a tile-local position in `[0, extent]` into this rectangle.
	pub fn project(&self, local: Vec2, extent: f64) -> Coord {
		Coord::new(
			self.top_left.x + local.x / extent * self.width,
			self.top_left.y + local.y / extent * self.height,
		)
	}

	pub fn contains(&self, coord: Coord) -> bool {
		coord.x >= self.top_left.x
			&& coord.x <= self.top_left.x + self.width
			&& coord.y >= self.top_left.y
			&& coord.y <= self.top_left.y + self.height
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn project_tile_local() {
		let rect = RectCoord::new(Coord::new(100.0, 200.0), 256.0, 256.0);
		assert_eq!(rect.project(Vec2::new(0.0, 0.0), 4096.0), Coord::new(100.0, 200.0));
		assert_eq!(
			rect.project(Vec2::new(4096.0, 2048.0), 4096.0),
			Coord::new(356.0, 328.0)
		);
	}

	#[test]
	fn containment() {
		let rect = RectCoord::new(Coord::new(0.0, 0.0), 10.0, 10.0);
		assert!(rect.contains(Coord::new(10.0, 10.0)));
		assert!(!rect.contains(Coord::new(10.1, 5.0)));
	}
}
