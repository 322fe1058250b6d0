//! Cross-tile readiness coordination.
//!
//! Every source data manager registers here and reports the tiles it is
//! still working on. When the last registered manager finishes its current
//! tile set, one "source ready" edge fires; symbol placement waits for that
//! edge so labels never flicker over a partially loaded tile set.

use super::VersionedTileInfo;
use std::collections::{HashMap, HashSet};

/// Handle of one registered manager.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ManagerId(u64);

/// Tallies pending tiles per registered manager and fires the ready edge.
#[derive(Default)]
pub struct ReadyManager {
	managers: HashMap<ManagerId, HashSet<VersionedTileInfo>>,
	next_id: u64,
	was_ready: bool,
	ready_edge: bool,
}

impl ReadyManager {
	pub fn new() -> ReadyManager {
		ReadyManager::default()
	}

	pub fn register(&mut self) -> ManagerId {
		let id = ManagerId(self.next_id);
		self.next_id += 1;
		self.managers.insert(id, HashSet::new());
		// A fresh manager has nothing pending; the edge state restarts.
		self.was_ready = self.is_ready();
		id
	}

	pub fn unregister(&mut self, id: ManagerId) {
		self.managers.remove(&id);
		self.update_edge();
	}

	/// Replaces the set of tiles `id` is still working on.
	pub fn set_pending(&mut self, id: ManagerId, tiles: impl IntoIterator<Item = VersionedTileInfo>) {
		if let Some(pending) = self.managers.get_mut(&id) {
			pending.clear();
			pending.extend(tiles);
		}
		self.update_edge();
	}

	/// Marks one tile of `id` as finished.
	pub fn mark_done(&mut self, id: ManagerId, info: VersionedTileInfo) {
		if let Some(pending) = self.managers.get_mut(&id) {
			pending.remove(&info);
		}
		self.update_edge();
	}

	/// Bulk removal, sent when tiles are torn down.
	pub fn remove_tiles(&mut self, id: ManagerId, infos: &[VersionedTileInfo]) {
		if let Some(pending) = self.managers.get_mut(&id) {
			for info in infos {
				pending.remove(info);
			}
		}
		self.update_edge();
	}

	/// True while no registered manager has pending tiles.
	pub fn is_ready(&self) -> bool {
		self.managers.values().all(HashSet::is_empty)
	}

	/// Consumes the ready edge: true exactly once per transition into the
	/// ready state.
	pub fn take_ready_edge(&mut self) -> bool {
		std::mem::take(&mut self.ready_edge)
	}

	fn update_edge(&mut self) {
		let ready = self.is_ready();
		if ready && !self.was_ready {
			self.ready_edge = true;
		}
		self.was_ready = ready;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use cartiles_core::TileCoord;

	fn info(x: u32, version: u64) -> VersionedTileInfo {
		VersionedTileInfo::new(TileCoord::new(10, x, 0).unwrap(), version)
	}

	#[test]
	fn edge_fires_when_the_last_manager_finishes() {
		let mut ready = ReadyManager::new();
		let a = ready.register();
		let b = ready.register();

		ready.set_pending(a, [info(0, 1), info(1, 1)]);
		ready.set_pending(b, [info(2, 1)]);
		assert!(!ready.is_ready());
		assert!(!ready.take_ready_edge());

		ready.mark_done(a, info(0, 1));
		ready.mark_done(a, info(1, 1));
		assert!(!ready.is_ready());

		ready.mark_done(b, info(2, 1));
		assert!(ready.is_ready());
		assert!(ready.take_ready_edge());
		// The edge is consumed.
		assert!(!ready.take_ready_edge());
	}

	#[test]
	fn edge_fires_once_per_transition() {
		let mut ready = ReadyManager::new();
		let a = ready.register();
		ready.set_pending(a, [info(0, 1)]);
		ready.mark_done(a, info(0, 1));
		assert!(ready.take_ready_edge());

		ready.set_pending(a, [info(1, 1)]);
		ready.remove_tiles(a, &[info(1, 1)]);
		assert!(ready.take_ready_edge());
	}

	#[test]
	fn unregistering_a_stalled_manager_releases_the_edge() {
		let mut ready = ReadyManager::new();
		let a = ready.register();
		let b = ready.register();
		ready.set_pending(a, [info(0, 1)]);
		ready.set_pending(b, [info(1, 1)]);
		ready.mark_done(a, info(0, 1));
		assert!(!ready.is_ready());
		ready.unregister(b);
		assert!(ready.take_ready_edge());
	}
}
