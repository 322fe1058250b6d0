//! Raster tiles carry no geometry; per frame they re-evaluate their layer's
//! adjustment parameters into a flat [`RasterStyle`].

use crate::tile::{RenderObject, VersionedTileInfo};
use cartiles_style::EvaluationContext;
use cartiles_style::style::{RasterLayerStyle, RasterStyle};

/// One raster tile and its last evaluated style.
pub struct RasterTileObject {
	pub info: VersionedTileInfo,
	pub texture: RenderObject,
	style: Option<RasterStyle>,
}

impl RasterTileObject {
	pub fn new(info: VersionedTileInfo, texture: RenderObject) -> RasterTileObject {
		RasterTileObject {
			info,
			texture,
			style: None,
		}
	}

	/// Evaluates the layer's raster parameters for this frame. The effective
	/// alpha is the product of the layer alpha and `raster-opacity`.
	pub fn update_style(
		&mut self,
		layer: &RasterLayerStyle,
		context: &EvaluationContext,
		layer_alpha: f64,
	) -> &RasterStyle {
		self.style = Some(layer.evaluate(context, layer_alpha));
		self.style.as_ref().unwrap()
	}

	pub fn style(&self) -> Option<&RasterStyle> {
		self.style.as_ref()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use cartiles_core::TileCoord;
	use cartiles_style::parse_style_document;
	use cartiles_style::{FeatureStateManager, LayerStyle};

	const STYLE: &str = r#"{
		"sources": {"hillshade": {"type": "raster", "tiles": ["https://tiles.example/{z}/{x}/{y}.png"]}},
		"layers": [{
			"id": "hills",
			"type": "raster",
			"source": "hillshade",
			"paint": {
				"raster-opacity": 0.5,
				"raster-contrast": 0.2,
				"raster-saturation": -0.4
			}
		}]
	}"#;

	#[test]
	fn style_combines_layer_alpha_and_opacity() {
		let document = parse_style_document(STYLE).unwrap();
		let LayerStyle::Raster(raster) = &document.layers[0].style else {
			unreachable!();
		};
		let state = FeatureStateManager::new();
		let context = EvaluationContext::global(8.0, 1.0, &state);

		let info = VersionedTileInfo::new(TileCoord::new(8, 1, 1).unwrap(), 1);
		let mut tile = RasterTileObject::new(info, RenderObject::new(42));
		let style = tile.update_style(raster, &context, 0.5);
		assert_eq!(style.opacity, 0.25);
		assert_eq!(style.contrast, 0.2);
		assert_eq!(style.saturation, -0.4);
		assert_eq!(style.gamma, 1.0);
		assert!(tile.style().is_some());
	}
}
