//! Line extrusion and batching.
//!
//! Each polyline segment extrudes into a quad of two triangles; batches use
//! 16-bit indices and split like polygon batches, grouped by style hash.

use super::MAX_BATCH_VERTICES;
use cartiles_core::Vec2;
use log::warn;

/// One uploadable line batch: interleaved `x, y` vertices and indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineBatch {
	pub style_hash: u64,
	pub vertices: Vec<f32>,
	pub indices: Vec<u16>,
}

impl LineBatch {
	fn new(style_hash: u64) -> LineBatch {
		LineBatch {
			style_hash,
			..LineBatch::default()
		}
	}

	pub fn vertex_count(&self) -> usize {
		self.vertices.len() / 2
	}
}

/// Accumulates the polylines of one tile into batches.
#[derive(Default)]
pub struct LineAssembler {
	batches: Vec<LineBatch>,
}

impl LineAssembler {
	pub fn new() -> LineAssembler {
		LineAssembler::default()
	}

	/// Extrudes one polyline with the given half-width and appends it to a
	/// batch of the same style.
	pub fn add_polyline(&mut self, style_hash: u64, points: &[Vec2], half_width: f64) {
		if points.len() < 2 {
			return;
		}
		let vertex_count = (points.len() - 1) * 4;
		if vertex_count > MAX_BATCH_VERTICES {
			warn!("dropping polyline with {vertex_count} extruded vertices, above the 16-bit index limit");
			return;
		}

		let batch = self.batch_for(style_hash, vertex_count);
		for pair in points.windows(2) {
			let direction = pair[1] - pair[0];
			let length = direction.length();
			if length == 0.0 {
				continue;
			}
			let normal = Vec2::new(-direction.y / length, direction.x / length) * half_width;
			let base = batch.vertex_count() as u16;
			for corner in [
				pair[0] + normal,
				pair[0] - normal,
				pair[1] - normal,
				pair[1] + normal,
			] {
				batch.vertices.push(corner.x as f32);
				batch.vertices.push(corner.y as f32);
			}
			batch
				.indices
				.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
		}
	}

	fn batch_for(&mut self, style_hash: u64, vertex_count: usize) -> &mut LineBatch {
		let fits = |batch: &LineBatch| {
			batch.style_hash == style_hash && batch.vertex_count() + vertex_count <= MAX_BATCH_VERTICES
		};
		let index = match self.batches.iter().position(fits) {
			Some(index) => index,
			None => {
				self.batches.push(LineBatch::new(style_hash));
				self.batches.len() - 1
			}
		};
		&mut self.batches[index]
	}

	pub fn finish(self) -> Vec<LineBatch> {
		self.batches
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn one_segment_extrudes_to_a_quad() {
		let mut assembler = LineAssembler::new();
		assembler.add_polyline(1, &[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)], 2.0);
		let batches = assembler.finish();
		assert_eq!(batches.len(), 1);
		assert_eq!(batches[0].vertex_count(), 4);
		assert_eq!(batches[0].indices.len(), 6);
		// The normal offsets the quad by the half-width.
		assert_eq!(batches[0].vertices[1], 2.0);
		assert_eq!(batches[0].vertices[3], -2.0);
	}

	#[test]
	fn zero_length_segments_are_skipped() {
		let mut assembler = LineAssembler::new();
		assembler.add_polyline(
			1,
			&[Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)],
			1.0,
		);
		let batches = assembler.finish();
		assert_eq!(batches[0].vertex_count(), 4);
	}

	#[test]
	fn batches_split_at_the_index_limit() {
		let mut assembler = LineAssembler::new();
		let line: Vec<Vec2> = (0..1001).map(|i| Vec2::new(f64::from(i), 0.0)).collect();
		// 1000 segments × 4 vertices each; 17 lines exceed 65535 vertices.
		for _ in 0..17 {
			assembler.add_polyline(1, &line, 1.0);
		}
		let batches = assembler.finish();
		assert_eq!(batches.len(), 2);
		assert!(batches.iter().all(|batch| batch.vertex_count() <= MAX_BATCH_VERTICES));
	}
}
