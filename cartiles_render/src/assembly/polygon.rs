//! Polygon tessellation and batching.
//!
//! Polygons are triangulated by ear-cutting and packed into batches with
//! 16-bit indices. Batches group features by their style hash so that every
//! polygon sharing a style animates together and the style table uploads once
//! per batch; a batch splits when the next feature would push its vertex
//! count past the 16-bit limit.

use super::MAX_BATCH_VERTICES;
use cartiles_core::Vec2;
use log::warn;

/// One uploadable batch: interleaved `x, y` vertices and triangle indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonBatch {
	pub style_hash: u64,
	pub vertices: Vec<f32>,
	pub indices: Vec<u16>,
}

impl PolygonBatch {
	fn new(style_hash: u64) -> PolygonBatch {
		PolygonBatch {
			style_hash,
			..PolygonBatch::default()
		}
	}

	pub fn vertex_count(&self) -> usize {
		self.vertices.len() / 2
	}

	pub fn triangle_count(&self) -> usize {
		self.indices.len() / 3
	}
}

/// Accumulates the polygons of one tile into batches.
#[derive(Default)]
pub struct PolygonAssembler {
	batches: Vec<PolygonBatch>,
}

impl PolygonAssembler {
	pub fn new() -> PolygonAssembler {
		PolygonAssembler::default()
	}

	/// Triangulates one polygon (an exterior ring plus holes) and appends it
	/// to a batch of the same style. Untriangulatable or oversized features
	/// are logged and dropped.
	pub fn add_polygon(&mut self, style_hash: u64, exterior: &[Vec2], holes: &[Vec<Vec2>]) {
		let mut coordinates: Vec<f64> = Vec::with_capacity((exterior.len() + holes.iter().map(Vec::len).sum::<usize>()) * 2);
		let mut hole_indices = Vec::with_capacity(holes.len());
		for point in exterior {
			coordinates.push(point.x);
			coordinates.push(point.y);
		}
		for hole in holes {
			hole_indices.push(coordinates.len() / 2);
			for point in hole {
				coordinates.push(point.x);
				coordinates.push(point.y);
			}
		}

		let vertex_count = coordinates.len() / 2;
		if vertex_count > MAX_BATCH_VERTICES {
			warn!("dropping polygon with {vertex_count} vertices, above the 16-bit index limit");
			return;
		}

		let triangles = match earcutr::earcut(&coordinates, &hole_indices, 2) {
			Ok(triangles) => triangles,
			Err(error) => {
				warn!("dropping untriangulatable polygon: {error:?}");
				return;
			}
		};
		if triangles.is_empty() {
			return;
		}

		let batch = self.batch_for(style_hash, vertex_count);
		let base = batch.vertex_count() as u16;
		batch.vertices.extend(coordinates.iter().map(|value| *value as f32));
		batch.indices.extend(triangles.iter().map(|index| base + *index as u16));
	}

	/// The open batch for `style_hash` with room for `vertex_count` more
	/// vertices; a full batch is sealed and a fresh one started.
	fn batch_for(&mut self, style_hash: u64, vertex_count: usize) -> &mut PolygonBatch {
		let fits = |batch: &PolygonBatch| {
			batch.style_hash == style_hash && batch.vertex_count() + vertex_count <= MAX_BATCH_VERTICES
		};
		let index = match self.batches.iter().position(fits) {
			Some(index) => index,
			None => {
				self.batches.push(PolygonBatch::new(style_hash));
				self.batches.len() - 1
			}
		};
		&mut self.batches[index]
	}

	pub fn finish(self) -> Vec<PolygonBatch> {
		self.batches
	}
}
