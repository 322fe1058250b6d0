//! Parser for Mapbox-style JSON documents.
//!
//! Produces [`StyleDocument`]: source descriptions plus one
//! [`LayerDescription`] per recognised layer. Parsing is tolerant: unknown
//! layer kinds, unknown keys and broken expressions are logged and skipped,
//! the rest of the document stays usable.

use super::{
	BackgroundLayerStyle, LayerCommon, LayerDescription, LayerStyle, LineLayerStyle, PolygonLayerStyle,
	RasterLayerStyle, SymbolLayerStyle,
};
use crate::eval::{FeatureValueEvaluator, ValueEvaluator};
use crate::expr::parser::parse_expression;
use crate::expr::{ExprArena, ExprHandle, NodeId};
use anyhow::{Context, Result};
use cartiles_core::json::{JsonObject, JsonValue};
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceType {
	Vector,
	Raster,
	GeoJson,
}

/// One entry of the document's `sources` object.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceDescription {
	pub name: String,
	pub source_type: SourceType,
	pub url: Option<String>,
	pub tiles: Vec<String>,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub tile_size: Option<f64>,
}

/// Global transition timing for animatable properties.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transition {
	pub duration_ms: i64,
	pub delay_ms: i64,
}

/// A parsed style document.
pub struct StyleDocument {
	pub name: Option<String>,
	pub sources: Vec<SourceDescription>,
	pub layers: Vec<LayerDescription>,
	pub sprite: Option<String>,
	pub transition: Transition,
}

const KNOWN_DOCUMENT_KEYS: [&str; 8] = [
	"version",
	"name",
	"sources",
	"layers",
	"sprite",
	"glyphs",
	"transition",
	"metadata",
];

/// Parses a style document from JSON text.
pub fn parse_style_document(text: &str) -> Result<StyleDocument> {
	let json = JsonValue::parse_str(text).context("style document is not valid JSON")?;
	let document = json.as_object().context("style document must be an object")?;

	for key in document.keys() {
		if !KNOWN_DOCUMENT_KEYS.contains(&key.as_str()) {
			warn!("ignoring unknown style key {key:?}");
		}
	}

	let mut sources = Vec::new();
	if let Some(sources_object) = document.get_object("sources")? {
		for (name, source_json) in sources_object.iter() {
			match parse_source(name, source_json) {
				Some(source) => sources.push(source),
				None => warn!("ignoring source {name:?}"),
			}
		}
	}

	let mut layers = Vec::new();
	if let Some(layers_array) = document.get_array("layers")? {
		for layer_json in layers_array {
			match layer_json.as_object() {
				Ok(layer_object) => {
					if let Some(layer) = parse_layer(layer_object) {
						layers.push(layer);
					}
				}
				Err(_) => warn!("ignoring non-object layer entry"),
			}
		}
	}

	let transition = match document.get_object("transition")? {
		Some(object) => Transition {
			duration_ms: object.get_number("duration")?.unwrap_or(300.0) as i64,
			delay_ms: object.get_number("delay")?.unwrap_or(0.0) as i64,
		},
		None => Transition {
			duration_ms: 300,
			delay_ms: 0,
		},
	};

	Ok(StyleDocument {
		name: document.get_string("name")?,
		sources,
		layers,
		sprite: document.get_string("sprite")?,
		transition,
	})
}

fn parse_source(name: &str, json: &JsonValue) -> Option<SourceDescription> {
	let object = json.as_object().ok()?;
	let source_type = match object.get_string("type").ok()??.as_str() {
		"vector" => SourceType::Vector,
		"raster" => SourceType::Raster,
		"geojson" => SourceType::GeoJson,
		other => {
			warn!("unknown source type {other:?}");
			return None;
		}
	};
	Some(SourceDescription {
		name: name.to_owned(),
		source_type,
		url: object.get_string("url").ok().flatten(),
		tiles: object.get_string_vec("tiles").ok().flatten().unwrap_or_default(),
		min_zoom: object.get_number("minzoom").ok().flatten().unwrap_or(0.0),
		max_zoom: object.get_number("maxzoom").ok().flatten().unwrap_or(25.0),
		tile_size: object.get_number("tileSize").ok().flatten(),
	})
}

/// Parses properties of one layer into a private arena, then freezes it into
/// the layer's shared handle set.
struct LayerReader<'a> {
	arena: ExprArena,
	paint: Option<&'a JsonObject>,
	layout: Option<&'a JsonObject>,
	metadata: Option<&'a JsonObject>,
}

impl<'a> LayerReader<'a> {
	fn new(layer: &'a JsonObject) -> LayerReader<'a> {
		LayerReader {
			arena: ExprArena::new(),
			paint: layer.get_object("paint").ok().flatten(),
			layout: layer.get_object("layout").ok().flatten(),
			metadata: layer.get_object("metadata").ok().flatten(),
		}
	}

	fn property(&mut self, name: &str) -> Option<NodeId> {
		let json = self
			.paint
			.and_then(|paint| paint.get(name))
			.or_else(|| self.layout.and_then(|layout| layout.get(name)))?;
		parse_expression(&mut self.arena, json)
	}

	fn metadata_expression(&mut self, name: &str) -> Option<NodeId> {
		let json = self.metadata.and_then(|metadata| metadata.get(name))?;
		parse_expression(&mut self.arena, json)
	}

	fn properties(&mut self, names: &[&'static str]) -> HashMap<&'static str, NodeId> {
		let mut nodes = HashMap::new();
		for name in names {
			if let Some(id) = self.property(name) {
				nodes.insert(*name, id);
			}
		}
		nodes
	}
}

fn parse_layer(layer: &JsonObject) -> Option<LayerDescription> {
	let id = layer.get_string("id").ok().flatten().unwrap_or_default();
	let Some(kind) = layer.get_string("type").ok().flatten() else {
		warn!("layer {id:?} has no type");
		return None;
	};

	let mut reader = LayerReader::new(layer);

	let filter = layer.get("filter").and_then(|json| parse_expression(&mut reader.arena, json));
	let interactable = reader.metadata_expression("interactable");
	let blend_mode = reader.metadata_expression("blend-mode");

	let property_names: &[&'static str] = match kind.as_str() {
		"background" => &["background-color", "background-pattern", "background-opacity"],
		"line" => &[
			"line-color",
			"line-opacity",
			"line-width",
			"line-blur",
			"line-offset",
			"line-dasharray",
			"line-cap",
		],
		"fill" => &["fill-color", "fill-opacity", "fill-pattern"],
		"symbol" => &[
			"text-field",
			"text-size",
			"text-color",
			"text-halo-color",
			"text-halo-width",
			"text-opacity",
			"text-font",
			"text-transform",
			"text-offset",
			"text-padding",
			"text-anchor",
			"text-justify",
			"text-rotate",
			"text-allow-overlap",
			"text-optional",
			"text-line-height",
			"text-letter-spacing",
			"text-max-width",
			"symbol-sort-key",
			"symbol-spacing",
			"symbol-placement",
			"symbol-z-order",
			"icon-image",
			"icon-size",
			"icon-anchor",
			"icon-offset",
			"icon-rotate",
			"icon-opacity",
			"icon-padding",
			"icon-allow-overlap",
			"icon-optional",
			"icon-text-fit",
		],
		"raster" => &[
			"raster-opacity",
			"raster-brightness-min",
			"raster-brightness-max",
			"raster-contrast",
			"raster-saturation",
			"raster-gamma",
			"raster-brightness-shift",
		],
		other => {
			warn!("ignoring layer {id:?} of unknown type {other:?}");
			return None;
		}
	};
	let nodes = reader.properties(property_names);

	let visible = match reader.layout.and_then(|layout| layout.get("visibility")) {
		Some(JsonValue::String(visibility)) => visibility != "none",
		_ => true,
	};

	let arena = Arc::new(reader.arena);
	let handle = |id: Option<NodeId>| id.map(|id| ExprHandle::new(Arc::clone(&arena), id));
	let property = |name: &str| nodes.get(name).copied().map(|id| ExprHandle::new(Arc::clone(&arena), id));

	let metadata = layer.get_object("metadata").ok().flatten();
	let common = LayerCommon {
		id,
		source: layer.get_string("source").ok().flatten(),
		source_layer: layer.get_string("source-layer").ok().flatten(),
		min_zoom: layer.get_number("minzoom").ok().flatten().unwrap_or(0.0),
		max_zoom: layer.get_number("maxzoom").ok().flatten().unwrap_or(25.0),
		visible,
		filter: handle(filter),
		render_pass_index: metadata
			.and_then(|metadata| metadata.get_number("render-pass-index").ok().flatten())
			.unwrap_or(0.0) as u32,
		interactable: ValueEvaluator::new(handle(interactable)),
		multiselect: metadata
			.and_then(|metadata| metadata.get_boolean("multiselect").ok().flatten())
			.unwrap_or(false),
		self_masked: metadata
			.and_then(|metadata| metadata.get_boolean("selfMasked").ok().flatten())
			.unwrap_or(false),
	};

	let style = match kind.as_str() {
		"background" => LayerStyle::Background(BackgroundLayerStyle {
			color: ValueEvaluator::new(property("background-color")),
			pattern: ValueEvaluator::new(property("background-pattern")),
			opacity: ValueEvaluator::new(property("background-opacity")),
			blend_mode: ValueEvaluator::new(handle(blend_mode)),
		}),
		"line" => LayerStyle::Line(LineLayerStyle {
			color: ValueEvaluator::new(property("line-color")),
			opacity: ValueEvaluator::new(property("line-opacity")),
			width: ValueEvaluator::new(property("line-width")),
			blur: ValueEvaluator::new(property("line-blur")),
			offset: ValueEvaluator::new(property("line-offset")),
			dash_array: ValueEvaluator::new(property("line-dasharray")),
			cap: ValueEvaluator::new(property("line-cap")),
		}),
		"fill" => LayerStyle::Polygon(PolygonLayerStyle {
			color: ValueEvaluator::new(property("fill-color")),
			opacity: ValueEvaluator::new(property("fill-opacity")),
			pattern: ValueEvaluator::new(property("fill-pattern")),
		}),
		"symbol" => LayerStyle::Symbol(Box::new(SymbolLayerStyle {
			text_field: FeatureValueEvaluator::new(property("text-field")),
			text_size: FeatureValueEvaluator::new(property("text-size")),
			text_color: FeatureValueEvaluator::new(property("text-color")),
			text_halo_color: FeatureValueEvaluator::new(property("text-halo-color")),
			text_halo_width: FeatureValueEvaluator::new(property("text-halo-width")),
			text_opacity: FeatureValueEvaluator::new(property("text-opacity")),
			text_font: FeatureValueEvaluator::new(property("text-font")),
			text_transform: FeatureValueEvaluator::new(property("text-transform")),
			text_offset: FeatureValueEvaluator::new(property("text-offset")),
			text_padding: FeatureValueEvaluator::new(property("text-padding")),
			text_anchor: FeatureValueEvaluator::new(property("text-anchor")),
			text_justify: FeatureValueEvaluator::new(property("text-justify")),
			text_rotate: FeatureValueEvaluator::new(property("text-rotate")),
			text_allow_overlap: FeatureValueEvaluator::new(property("text-allow-overlap")),
			text_optional: FeatureValueEvaluator::new(property("text-optional")),
			text_line_height: FeatureValueEvaluator::new(property("text-line-height")),
			text_letter_spacing: FeatureValueEvaluator::new(property("text-letter-spacing")),
			text_max_width: FeatureValueEvaluator::new(property("text-max-width")),
			symbol_sort_key: FeatureValueEvaluator::new(property("symbol-sort-key")),
			symbol_spacing: FeatureValueEvaluator::new(property("symbol-spacing")),
			symbol_placement: FeatureValueEvaluator::new(property("symbol-placement")),
			symbol_z_order: FeatureValueEvaluator::new(property("symbol-z-order")),
			icon_image: FeatureValueEvaluator::new(property("icon-image")),
			icon_size: FeatureValueEvaluator::new(property("icon-size")),
			icon_anchor: FeatureValueEvaluator::new(property("icon-anchor")),
			icon_offset: FeatureValueEvaluator::new(property("icon-offset")),
			icon_rotate: FeatureValueEvaluator::new(property("icon-rotate")),
			icon_opacity: FeatureValueEvaluator::new(property("icon-opacity")),
			icon_padding: FeatureValueEvaluator::new(property("icon-padding")),
			icon_allow_overlap: FeatureValueEvaluator::new(property("icon-allow-overlap")),
			icon_optional: FeatureValueEvaluator::new(property("icon-optional")),
			icon_text_fit: FeatureValueEvaluator::new(property("icon-text-fit")),
		})),
		"raster" => LayerStyle::Raster(RasterLayerStyle {
			opacity: FeatureValueEvaluator::new(property("raster-opacity")),
			brightness_min: FeatureValueEvaluator::new(property("raster-brightness-min")),
			brightness_max: FeatureValueEvaluator::new(property("raster-brightness-max")),
			contrast: FeatureValueEvaluator::new(property("raster-contrast")),
			saturation: FeatureValueEvaluator::new(property("raster-saturation")),
			gamma: FeatureValueEvaluator::new(property("raster-gamma")),
			brightness_shift: FeatureValueEvaluator::new(property("raster-brightness-shift")),
			blend_mode: FeatureValueEvaluator::new(handle(blend_mode)),
		}),
		_ => unreachable!("kind was validated above"),
	};

	Some(LayerDescription { common, style })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::EvaluationContext;
	use crate::feature::{FeatureContext, GeomType};
	use crate::state::FeatureStateManager;
	use crate::style::types::LineCap;
	use cartiles_core::interner::Key;
	use cartiles_core::Color;
	use pretty_assertions::assert_eq;

	const STYLE: &str = r##"{
		"version": 8,
		"name": "test-style",
		"sources": {
			"composite": {"type": "vector", "url": "https://tiles.example/source.json", "minzoom": 0, "maxzoom": 14},
			"hillshade": {"type": "raster", "tiles": ["https://tiles.example/{z}/{x}/{y}.png"], "tileSize": 256},
			"broken": {"type": "cloud"}
		},
		"sprite": "https://tiles.example/sprite",
		"layers": [
			{
				"id": "land",
				"type": "background",
				"paint": {"background-color": "#f8f4f0"}
			},
			{
				"id": "water",
				"type": "fill",
				"source": "composite",
				"source-layer": "water",
				"filter": ["==", ["get", "class"], "lake"],
				"paint": {"fill-color": "rgb(158, 189, 255)", "fill-opacity": 0.8}
			},
			{
				"id": "roads",
				"type": "line",
				"source": "composite",
				"source-layer": "transportation",
				"minzoom": 5,
				"metadata": {"render-pass-index": 2, "selfMasked": true},
				"paint": {
					"line-color": "#ffffff",
					"line-width": ["interpolate", ["exponential", 1.5], ["zoom"], 13, 1, 18, 24]
				},
				"layout": {"line-cap": "round"}
			},
			{
				"id": "labels",
				"type": "symbol",
				"source": "composite",
				"source-layer": "place",
				"layout": {
					"text-field": "{name}",
					"text-size": ["step", ["zoom"], 11, 8, 13],
					"visibility": "visible"
				},
				"paint": {"text-color": "#333333"}
			},
			{
				"id": "mystery",
				"type": "hologram"
			}
		]
	}"##;

	#[test]
	fn parses_sources_and_skips_broken_ones() {
		let document = parse_style_document(STYLE).unwrap();
		assert_eq!(document.name.as_deref(), Some("test-style"));
		assert_eq!(document.sources.len(), 2);
		let composite = document.sources.iter().find(|s| s.name == "composite").unwrap();
		assert_eq!(composite.source_type, SourceType::Vector);
		assert_eq!(composite.max_zoom, 14.0);
		let hillshade = document.sources.iter().find(|s| s.name == "hillshade").unwrap();
		assert_eq!(hillshade.source_type, SourceType::Raster);
		assert_eq!(hillshade.tile_size, Some(256.0));
		assert_eq!(document.sprite.as_deref(), Some("https://tiles.example/sprite"));
	}

	#[test]
	fn parses_layers_and_skips_unknown_kinds() {
		let document = parse_style_document(STYLE).unwrap();
		assert_eq!(document.layers.len(), 4);
		assert_eq!(document.layers[0].kind(), "background");
		assert_eq!(document.layers[1].kind(), "fill");
		assert_eq!(document.layers[2].kind(), "line");
		assert_eq!(document.layers[3].kind(), "symbol");
	}

	#[test]
	fn layer_metadata_is_honored() {
		let document = parse_style_document(STYLE).unwrap();
		let roads = &document.layers[2];
		assert_eq!(roads.common.render_pass_index, 2);
		assert!(roads.common.self_masked);
		assert_eq!(roads.common.min_zoom, 5.0);
		assert!(!roads.common.multiselect);
	}

	#[test]
	fn filters_and_styles_evaluate() {
		let document = parse_style_document(STYLE).unwrap();
		let state = FeatureStateManager::new();

		let lake = FeatureContext::new(
			GeomType::Polygon,
			vec![(Key::intern("class"), crate::variant::ValueVariant::from("lake"))],
			Some(1),
		);
		let river = FeatureContext::new(
			GeomType::LineString,
			vec![(Key::intern("class"), crate::variant::ValueVariant::from("river"))],
			Some(2),
		);

		let water = &document.layers[1];
		assert!(water.common.matches_filter(&EvaluationContext::new(10.0, 1.0, &lake, &state)));
		assert!(!water.common.matches_filter(&EvaluationContext::new(10.0, 1.0, &river, &state)));

		let LayerStyle::Polygon(fill) = &water.style else {
			unreachable!();
		};
		let context = EvaluationContext::new(10.0, 1.0, &lake, &state);
		assert_eq!(fill.opacity(&context), 0.8);
		assert_eq!(fill.color(&context), Color::parse("rgb(158, 189, 255)").unwrap());
	}

	#[test]
	fn line_width_scales_with_density() {
		let document = parse_style_document(STYLE).unwrap();
		let LayerStyle::Line(line) = &document.layers[2].style else {
			unreachable!();
		};
		let state = FeatureStateManager::new();
		let feature = FeatureContext::empty();
		let base = line.width(&EvaluationContext::new(13.0, 1.0, &feature, &state));
		let dense = line.width(&EvaluationContext::new(13.0, 2.0, &feature, &state));
		assert_eq!(base, 1.0);
		assert_eq!(dense, 2.0);
		assert_eq!(line.cap(&EvaluationContext::new(13.0, 1.0, &feature, &state)), LineCap::Round);
	}

	#[test]
	fn symbol_text_field_templates() {
		let document = parse_style_document(STYLE).unwrap();
		let LayerStyle::Symbol(symbol) = &document.layers[3].style else {
			unreachable!();
		};
		let state = FeatureStateManager::new();
		let feature = FeatureContext::new(
			GeomType::Point,
			vec![(Key::intern("name"), crate::variant::ValueVariant::from("Bern"))],
			Some(1),
		);
		let context = EvaluationContext::new(12.0, 1.0, &feature, &state);
		let text = symbol.text_field(&context);
		assert_eq!(text.value.len(), 1);
		assert_eq!(text.value[0].text, "Bern");

		assert_eq!(symbol.text_size(&context).value, 13.0);
		assert_eq!(symbol.text_size(&EvaluationContext::new(6.0, 1.0, &feature, &state)).value, 11.0);
	}
}
