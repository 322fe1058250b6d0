//! World coordinates and tile addresses.
//!
//! A [`Coord`] is a position in the renderer's world space. A [`TileCoord`]
//! addresses one tile of the pyramid by `(zoom, x, y)`; together with a tile
//! extent it converts tile-local integer coordinates into world space.

use crate::types::{RectCoord, Vec2};
use anyhow::{Result, ensure};
use std::fmt::{self, Debug};

/// A position in world space.
#[derive(Clone, Copy, Default, PartialEq)]
pub struct Coord {
	pub x: f64,
	pub y: f64,
}

impl Coord {
	pub const fn new(x: f64, y: f64) -> Coord {
		Coord { x, y }
	}

	pub fn as_vec2(&self) -> Vec2 {
		Vec2::new(self.x, self.y)
	}
}

impl From<Vec2> for Coord {
	fn from(v: Vec2) -> Coord {
		Coord::new(v.x, v.y)
	}
}

impl Debug for Coord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("Coord({}, {})", self.x, self.y))
	}
}

/// Address of one tile in the pyramid.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct TileCoord {
	pub x: u32,
	pub y: u32,
	pub zoom: u8,
}

impl TileCoord {
	pub fn new(zoom: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(zoom <= 31, "zoom ({zoom}) must be <= 31");
		Ok(TileCoord { x, y, zoom })
	}

	pub fn is_valid(&self) -> bool {
		let max = 2u32.pow(u32::from(self.zoom));
		self.x < max && self.y < max
	}

	/// The world-space rectangle this tile covers for the given world size of
	/// the pyramid root.
	pub fn bounds(&self, world_size: f64) -> RectCoord {
		let tile_size = world_size / f64::from(2u32.pow(u32::from(self.zoom)));
		RectCoord::new(
			Coord::new(f64::from(self.x) * tile_size, f64::from(self.y) * tile_size),
			tile_size,
			tile_size,
		)
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("TileCoord({}, [{}, {}])", self.zoom, self.x, self.y))
	}
}
