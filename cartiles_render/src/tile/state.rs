//! The per-source tile state machine.
//!
//! Workers submit tile updates through a mailbox channel; the render thread
//! drains it and drives each tile through an explicit transition table:
//! `PendingSetup` until the readiness control set empties, then `Ready`,
//! parked as `Cached` or promoted to `Visible` with the viewport, and
//! finally `Removed`. Within one tile the upload order is masks, then
//! geometry, then textures; violations are logged, not fatal.

use super::{ManagerId, ReadyManager, TileRenderDescription, TileStatus, VersionedTileInfo, sort_for_frame};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// Lifecycle state of one tile.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TileState {
	/// Graphics objects exist but are not yet uploaded / complete.
	PendingSetup,
	/// Complete, neither cached nor rendered yet.
	Ready,
	/// Complete and held back; produces no render passes.
	Cached,
	/// Complete and contributing to the frame.
	Visible,
	/// Being torn down.
	Removed,
}

/// A tile diff submitted from a worker.
#[derive(Clone, Debug)]
pub enum TileUpdateMessage {
	/// Decoded tile data arrived; the control set lists the sub-layer
	/// indices that must produce render objects before the tile is complete.
	Loaded {
		info: VersionedTileInfo,
		ready_control: BTreeSet<usize>,
	},
	/// One sub-layer finished producing its render objects.
	SubLayerReady {
		info: VersionedTileInfo,
		layer_index: usize,
	},
	/// The loader gave up on the tile.
	Failed {
		info: VersionedTileInfo,
		status: TileStatus,
	},
}

struct TileEntry {
	state: TileState,
	ready_control: BTreeSet<usize>,
	masks_uploaded: bool,
	geometry_uploaded: bool,
	textures_uploaded: bool,
	requested_visible: bool,
	descriptions: Vec<TileRenderDescription>,
}

impl TileEntry {
	fn new(ready_control: BTreeSet<usize>) -> TileEntry {
		TileEntry {
			state: TileState::PendingSetup,
			ready_control,
			masks_uploaded: false,
			geometry_uploaded: false,
			textures_uploaded: false,
			requested_visible: false,
			descriptions: Vec::new(),
		}
	}
}

/// Owns the tiles of one data source. Mutated only from the render thread;
/// workers talk to it through [`SourceTileManager::mailbox`].
pub struct SourceTileManager {
	source: String,
	manager_id: ManagerId,
	tiles: HashMap<VersionedTileInfo, TileEntry>,
	sender: Sender<TileUpdateMessage>,
	receiver: Receiver<TileUpdateMessage>,
}

impl SourceTileManager {
	pub fn new(source: &str, ready: &mut ReadyManager) -> SourceTileManager {
		let (sender, receiver) = unbounded();
		SourceTileManager {
			source: source.to_owned(),
			manager_id: ready.register(),
			tiles: HashMap::new(),
			sender,
			receiver,
		}
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn manager_id(&self) -> ManagerId {
		self.manager_id
	}

	/// The worker-side handle for submitting tile diffs.
	pub fn mailbox(&self) -> Sender<TileUpdateMessage> {
		self.sender.clone()
	}

	pub fn tile_state(&self, info: &VersionedTileInfo) -> Option<TileState> {
		self.tiles.get(info).map(|entry| entry.state)
	}

	pub fn tile_count(&self) -> usize {
		self.tiles.len()
	}

	/// Drains the mailbox and applies every update. Late arrivals for a
	/// version older than the one already tracked are discarded.
	pub fn process_updates(&mut self, ready: &mut ReadyManager) {
		while let Ok(message) = self.receiver.try_recv() {
			match message {
				TileUpdateMessage::Loaded { info, ready_control } => self.on_loaded(info, ready_control, ready),
				TileUpdateMessage::SubLayerReady { info, layer_index } => {
					self.on_sub_layer_ready(info, layer_index, ready);
				}
				TileUpdateMessage::Failed { info, status } => {
					warn!("{}: tile {info:?} failed with {status:?}", self.source);
					self.remove_tile(&info, ready);
				}
			}
		}
	}

	fn newest_version_of(&self, info: &VersionedTileInfo) -> Option<u64> {
		self
			.tiles
			.keys()
			.filter(|existing| existing.coord == info.coord)
			.map(|existing| existing.version)
			.max()
	}

	fn on_loaded(&mut self, info: VersionedTileInfo, ready_control: BTreeSet<usize>, ready: &mut ReadyManager) {
		if let Some(newest) = self.newest_version_of(&info) {
			if newest > info.version {
				debug!("{}: discarding late tile {info:?}", self.source);
				return;
			}
		}
		ready.set_pending(
			self.manager_id,
			self.pending_infos().into_iter().chain(std::iter::once(info)),
		);
		let entry = self.tiles.entry(info).or_insert_with(|| TileEntry::new(BTreeSet::new()));
		*entry = TileEntry::new(ready_control);
		Self::try_promote(&info, entry, self.manager_id, ready);
	}

	fn on_sub_layer_ready(&mut self, info: VersionedTileInfo, layer_index: usize, ready: &mut ReadyManager) {
		let Some(entry) = self.tiles.get_mut(&info) else {
			debug!("{}: sub-layer update for unknown tile {info:?}", self.source);
			return;
		};
		entry.ready_control.remove(&layer_index);
		Self::try_promote(&info, entry, self.manager_id, ready);
	}

	fn pending_infos(&self) -> Vec<VersionedTileInfo> {
		self
			.tiles
			.iter()
			.filter(|(_, entry)| entry.state == TileState::PendingSetup)
			.map(|(info, _)| *info)
			.collect()
	}

	fn try_promote(info: &VersionedTileInfo, entry: &mut TileEntry, manager_id: ManagerId, ready: &mut ReadyManager) {
		if entry.state != TileState::PendingSetup || !entry.ready_control.is_empty() {
			return;
		}
		entry.state = if entry.requested_visible {
			TileState::Visible
		} else {
			TileState::Cached
		};
		ready.mark_done(manager_id, *info);
	}

	/// Records the mask upload of the tile. Must precede geometry.
	pub fn mark_masks_uploaded(&mut self, info: &VersionedTileInfo) {
		if let Some(entry) = self.tiles.get_mut(info) {
			entry.masks_uploaded = true;
		}
	}

	/// Records the geometry upload. Mask first, geometry second.
	pub fn mark_geometry_uploaded(&mut self, info: &VersionedTileInfo) {
		if let Some(entry) = self.tiles.get_mut(info) {
			if !entry.masks_uploaded {
				warn!("{}: geometry uploaded before masks for {info:?}", self.source);
			}
			entry.geometry_uploaded = true;
		}
	}

	/// Records the texture upload, the last of the three.
	pub fn mark_textures_uploaded(&mut self, info: &VersionedTileInfo) {
		if let Some(entry) = self.tiles.get_mut(info) {
			if !entry.geometry_uploaded {
				warn!("{}: textures uploaded before geometry for {info:?}", self.source);
			}
			entry.textures_uploaded = true;
		}
	}

	/// Stores the pre-generated per-sub-layer render descriptions.
	pub fn set_render_descriptions(&mut self, info: &VersionedTileInfo, descriptions: Vec<TileRenderDescription>) {
		if let Some(entry) = self.tiles.get_mut(info) {
			entry.descriptions = descriptions;
		}
	}

	/// The viewport requests this tile; complete tiles promote immediately,
	/// pending tiles promote once their control set empties.
	pub fn set_visible(&mut self, info: &VersionedTileInfo) {
		if let Some(entry) = self.tiles.get_mut(info) {
			entry.requested_visible = true;
			match entry.state {
				TileState::Ready | TileState::Cached => entry.state = TileState::Visible,
				TileState::PendingSetup | TileState::Visible => {}
				TileState::Removed => warn!("{}: set_visible on removed tile {info:?}", self.source),
			}
		}
	}

	/// The viewport no longer needs the tile; it stays built in the cache.
	pub fn set_cached(&mut self, info: &VersionedTileInfo) {
		if let Some(entry) = self.tiles.get_mut(info) {
			entry.requested_visible = false;
			if matches!(entry.state, TileState::Ready | TileState::Visible) {
				entry.state = TileState::Cached;
			}
		}
	}

	/// Tears the tile down and notifies the ready manager.
	pub fn remove_tile(&mut self, info: &VersionedTileInfo, ready: &mut ReadyManager) {
		if let Some(mut entry) = self.tiles.remove(info) {
			entry.state = TileState::Removed;
			entry.descriptions.clear();
		}
		ready.remove_tiles(self.manager_id, &[*info]);
	}

	/// Drops every tile, e.g. on source teardown.
	pub fn clear(&mut self, ready: &mut ReadyManager) {
		let infos: Vec<VersionedTileInfo> = self.tiles.keys().copied().collect();
		self.tiles.clear();
		ready.remove_tiles(self.manager_id, &infos);
	}

	/// Collects the render descriptions of all visible tiles, sorted by
	/// `(render_pass_index, layer_index)`.
	pub fn frame_render_descriptions(&self) -> Vec<TileRenderDescription> {
		let mut descriptions: Vec<TileRenderDescription> = self
			.tiles
			.values()
			.filter(|entry| entry.state == TileState::Visible)
			.flat_map(|entry| entry.descriptions.iter().cloned())
			.collect();
		sort_for_frame(&mut descriptions);
		descriptions
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tile::RenderObject;
	use cartiles_core::TileCoord;

	fn info(x: u32, version: u64) -> VersionedTileInfo {
		VersionedTileInfo::new(TileCoord::new(10, x, 0).unwrap(), version)
	}

	fn description(layer_index: usize, render_pass_index: u32) -> TileRenderDescription {
		TileRenderDescription {
			layer_index,
			source_hash: 7,
			zoom_id: 10,
			render_objects: vec![RenderObject::new(layer_index as u64)],
			mask: None,
			modifies_mask: false,
			self_masked: false,
			render_pass_index,
		}
	}

	#[test]
	fn control_set_gates_readiness() {
		let mut ready = ReadyManager::new();
		let mut manager = SourceTileManager::new("composite", &mut ready);
		let tile = info(1, 1);

		let mailbox = manager.mailbox();
		mailbox
			.send(TileUpdateMessage::Loaded {
				info: tile,
				ready_control: BTreeSet::from([0, 2]),
			})
			.unwrap();
		manager.process_updates(&mut ready);
		assert_eq!(manager.tile_state(&tile), Some(TileState::PendingSetup));
		assert!(!ready.is_ready());

		mailbox
			.send(TileUpdateMessage::SubLayerReady {
				info: tile,
				layer_index: 0,
			})
			.unwrap();
		manager.process_updates(&mut ready);
		assert_eq!(manager.tile_state(&tile), Some(TileState::PendingSetup));

		mailbox
			.send(TileUpdateMessage::SubLayerReady {
				info: tile,
				layer_index: 2,
			})
			.unwrap();
		manager.process_updates(&mut ready);
		assert_eq!(manager.tile_state(&tile), Some(TileState::Cached));
		assert!(ready.take_ready_edge());
	}

	#[test]
	fn visibility_requests_apply_on_promotion() {
		let mut ready = ReadyManager::new();
		let mut manager = SourceTileManager::new("composite", &mut ready);
		let tile = info(1, 1);

		manager
			.mailbox()
			.send(TileUpdateMessage::Loaded {
				info: tile,
				ready_control: BTreeSet::from([0]),
			})
			.unwrap();
		manager.process_updates(&mut ready);
		manager.set_visible(&tile);

		manager
			.mailbox()
			.send(TileUpdateMessage::SubLayerReady {
				info: tile,
				layer_index: 0,
			})
			.unwrap();
		manager.process_updates(&mut ready);
		assert_eq!(manager.tile_state(&tile), Some(TileState::Visible));

		manager.set_cached(&tile);
		assert_eq!(manager.tile_state(&tile), Some(TileState::Cached));
		manager.set_visible(&tile);
		assert_eq!(manager.tile_state(&tile), Some(TileState::Visible));
	}

	#[test]
	fn late_arrivals_for_older_versions_are_discarded() {
		let mut ready = ReadyManager::new();
		let mut manager = SourceTileManager::new("composite", &mut ready);

		manager
			.mailbox()
			.send(TileUpdateMessage::Loaded {
				info: info(1, 2),
				ready_control: BTreeSet::new(),
			})
			.unwrap();
		manager
			.mailbox()
			.send(TileUpdateMessage::Loaded {
				info: info(1, 1),
				ready_control: BTreeSet::from([0]),
			})
			.unwrap();
		manager.process_updates(&mut ready);
		assert_eq!(manager.tile_count(), 1);
		assert_eq!(manager.tile_state(&info(1, 2)), Some(TileState::Cached));
		assert_eq!(manager.tile_state(&info(1, 1)), None);
	}

	#[test]
	fn failed_tiles_are_dropped() {
		let mut ready = ReadyManager::new();
		let mut manager = SourceTileManager::new("composite", &mut ready);
		let tile = info(3, 1);

		manager
			.mailbox()
			.send(TileUpdateMessage::Loaded {
				info: tile,
				ready_control: BTreeSet::from([0]),
			})
			.unwrap();
		manager.process_updates(&mut ready);
		assert!(!ready.is_ready());

		manager
			.mailbox()
			.send(TileUpdateMessage::Failed {
				info: tile,
				status: TileStatus::ErrorTimeout,
			})
			.unwrap();
		manager.process_updates(&mut ready);
		assert_eq!(manager.tile_state(&tile), None);
		assert!(ready.is_ready());
	}

	#[test]
	fn only_visible_tiles_contribute_render_descriptions() {
		let mut ready = ReadyManager::new();
		let mut manager = SourceTileManager::new("composite", &mut ready);
		let visible = info(1, 1);
		let cached = info(2, 1);

		for tile in [visible, cached] {
			manager
				.mailbox()
				.send(TileUpdateMessage::Loaded {
					info: tile,
					ready_control: BTreeSet::new(),
				})
				.unwrap();
		}
		manager.process_updates(&mut ready);
		manager.set_render_descriptions(&visible, vec![description(3, 1), description(1, 0)]);
		manager.set_render_descriptions(&cached, vec![description(0, 0)]);
		manager.set_visible(&visible);

		let frame = manager.frame_render_descriptions();
		assert_eq!(frame.len(), 2);
		assert_eq!(frame[0].layer_index, 1);
		assert_eq!(frame[1].layer_index, 3);
	}
}
