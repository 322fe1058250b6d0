use cartiles_core::TileCoord;
use std::fmt::{self, Debug};

/// Identity of one loaded tile. The version advances every time the tile is
/// re-requested, so late arrivals for an older version can be discarded.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct VersionedTileInfo {
	pub coord: TileCoord,
	pub version: u64,
}

impl VersionedTileInfo {
	pub fn new(coord: TileCoord, version: u64) -> VersionedTileInfo {
		VersionedTileInfo { coord, version }
	}
}

impl Debug for VersionedTileInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!(
			"VersionedTileInfo({}/{}/{} v{})",
			self.coord.zoom, self.coord.x, self.coord.y, self.version
		))
	}
}

/// Result of loading one tile, reported by the loader.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TileStatus {
	Ok,
	ErrorNetwork,
	ErrorTimeout,
	ErrorOther,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn versions_distinguish_reloads() {
		let coord = TileCoord::new(10, 5, 5).unwrap();
		let a = VersionedTileInfo::new(coord, 1);
		let b = VersionedTileInfo::new(coord, 2);
		assert_ne!(a, b);
		assert_eq!(a, VersionedTileInfo::new(coord, 1));
		assert_eq!(format!("{a:?}"), "VersionedTileInfo(10/5/5 v1)");
	}
}
