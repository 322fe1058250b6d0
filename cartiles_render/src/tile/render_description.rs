//! Per-frame render output.

/// An opaque reference to a GPU object owned by the graphics factory.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RenderObject {
	pub object_id: u64,
}

impl RenderObject {
	pub fn new(object_id: u64) -> RenderObject {
		RenderObject { object_id }
	}
}

/// What one sub-layer of one visible tile contributes to the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TileRenderDescription {
	/// Index of the sub-layer in document order.
	pub layer_index: usize,
	/// Stable hash of the source configuration the tile came from.
	pub source_hash: u64,
	/// Integer zoom the tile data was built for.
	pub zoom_id: u32,
	pub render_objects: Vec<RenderObject>,
	pub mask: Option<RenderObject>,
	pub modifies_mask: bool,
	pub self_masked: bool,
	/// Draw-order override; lower passes draw first.
	pub render_pass_index: u32,
}

/// Sorts a frame's descriptions by `(render_pass_index, layer_index)`.
pub fn sort_for_frame(descriptions: &mut [TileRenderDescription]) {
	descriptions.sort_by_key(|description| (description.render_pass_index, description.layer_index));
}

#[cfg(test)]
mod tests {
	use super::*;

	fn description(render_pass_index: u32, layer_index: usize) -> TileRenderDescription {
		TileRenderDescription {
			layer_index,
			source_hash: 0,
			zoom_id: 10,
			render_objects: vec![RenderObject::new(1)],
			mask: None,
			modifies_mask: false,
			self_masked: false,
			render_pass_index,
		}
	}

	#[test]
	fn frame_order_is_pass_then_layer() {
		let mut descriptions = vec![
			description(1, 0),
			description(0, 5),
			description(0, 2),
			description(2, 1),
		];
		sort_for_frame(&mut descriptions);
		let order: Vec<(u32, usize)> = descriptions
			.iter()
			.map(|d| (d.render_pass_index, d.layer_index))
			.collect();
		assert_eq!(order, vec![(0, 2), (0, 5), (1, 0), (2, 1)]);
	}
}
