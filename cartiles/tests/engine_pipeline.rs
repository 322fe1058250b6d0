//! A miniature frame pipeline: parse a style, feed decoded features through
//! layer filters and evaluators, assemble geometry, place symbols through
//! the collision grid and drive tiles to render descriptions.

use cartiles::core::interner::Key;
use cartiles::render::assembly::PolygonAssembler;
use cartiles::render::symbol::{SymbolObject, SymbolQuad, line_placements, resolve_click};
use cartiles::render::tile::{
	DecodedFeature, FeatureGeometry, PolygonRings, ReadyManager, RenderObject, SourceTileManager,
	TileRenderDescription, TileState, TileUpdateMessage,
};
use cartiles::render::{CollisionGrid, CollisionResult};
use cartiles::style::style::LayerStyle;
use cartiles::style::{EvaluationContext, FeatureStateManager, ValueVariant, parse_style_document};
use cartiles::{TileCoord, Vec2, VersionedTileInfo};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

const STYLE: &str = r##"{
	"version": 8,
	"sources": {
		"composite": {"type": "vector", "url": "https://tiles.example/composite.json"}
	},
	"layers": [
		{
			"id": "landuse",
			"type": "fill",
			"source": "composite",
			"source-layer": "landuse",
			"filter": ["in", "class", "park", "forest"],
			"paint": {
				"fill-color": ["match", ["get", "class"], "park", "#a8dab5", "#6b9e78"],
				"fill-opacity": 0.7
			}
		},
		{
			"id": "place-labels",
			"type": "symbol",
			"source": "composite",
			"source-layer": "place",
			"layout": {
				"text-field": "{name}",
				"text-size": ["interpolate", ["linear"], ["zoom"], 6, 11, 12, 16]
			},
			"paint": {"text-color": "#222222"}
		}
	]
}"##;

fn init_logs() {
	let _ = env_logger::builder().is_test(true).try_init();
}

fn landuse_feature(class: &str, id: u64) -> DecodedFeature {
	init_logs();
	DecodedFeature {
		geom_type: cartiles::GeomType::Polygon,
		id: Some(id),
		properties: vec![(Key::intern("class"), ValueVariant::from(class))],
		geometry: FeatureGeometry::Polygons(vec![PolygonRings {
			exterior: vec![
				Vec2::new(0.0, 0.0),
				Vec2::new(1024.0, 0.0),
				Vec2::new(1024.0, 1024.0),
				Vec2::new(0.0, 1024.0),
			],
			holes: vec![],
		}]),
		extent: 4096.0,
	}
}

fn style_hash(values: &[ValueVariant]) -> u64 {
	let mut hasher = std::collections::hash_map::DefaultHasher::new();
	for value in values {
		value.hash(&mut hasher);
	}
	hasher.finish()
}

#[test]
fn polygons_batch_by_evaluated_style() {
	let document = parse_style_document(STYLE).unwrap();
	let landuse = &document.layers[0];
	let LayerStyle::Polygon(fill) = &landuse.style else {
		unreachable!();
	};
	let state = FeatureStateManager::new();

	let features = [
		landuse_feature("park", 1),
		landuse_feature("forest", 2),
		landuse_feature("park", 3),
		landuse_feature("residential", 4),
	];

	let mut assembler = PolygonAssembler::new();
	let tile_bounds = TileCoord::new(14, 8000, 8000).unwrap().bounds(4194304.0);
	let mut accepted = 0;
	for decoded in &features {
		let feature = decoded.feature_context();
		let context = EvaluationContext::new(14.0, 1.0, &feature, &state);
		if !landuse.common.matches_filter(&context) {
			continue;
		}
		accepted += 1;
		let hash = style_hash(&[
			ValueVariant::from(fill.color(&context)),
			ValueVariant::from(fill.opacity(&context)),
		]);
		let FeatureGeometry::Polygons(polygons) = decoded.project(&tile_bounds) else {
			unreachable!();
		};
		for polygon in &polygons {
			assembler.add_polygon(hash, &polygon.exterior, &polygon.holes);
		}
	}

	// The residential polygon fails the filter; park and forest batch apart.
	assert_eq!(accepted, 3);
	let batches = assembler.finish();
	assert_eq!(batches.len(), 2);
	let parks = batches.iter().find(|batch| batch.vertex_count() == 8).unwrap();
	assert_eq!(parks.triangle_count(), 4);
}

#[test]
fn tile_bounds_feed_the_conversion() {
	let bounds = TileCoord::new(14, 8000, 8000).unwrap().bounds(4194304.0);
	let decoded = landuse_feature("park", 1);
	let FeatureGeometry::Polygons(polygons) = decoded.project(&bounds) else {
		unreachable!();
	};
	let exterior = &polygons[0].exterior;
	assert_eq!(exterior[0].x, bounds.top_left.x);
	// 1024 of 4096 is a quarter of the tile.
	assert_eq!(exterior[2].x, bounds.top_left.x + bounds.width / 4.0);
}

#[test]
fn symbols_place_deterministically_and_resolve_clicks() {
	let document = parse_style_document(STYLE).unwrap();
	let LayerStyle::Symbol(symbol_style) = &document.layers[1].style else {
		unreachable!();
	};
	let state = FeatureStateManager::new();

	let places = [("Bern", 100.0, 100.0), ("Köniz", 112.0, 100.0), ("Thun", 300.0, 300.0)];
	let mut symbols = Vec::new();
	for (index, (name, x, y)) in places.iter().enumerate() {
		let feature = cartiles::FeatureContext::new(
			cartiles::GeomType::Point,
			vec![(Key::intern("name"), ValueVariant::from(*name))],
			Some(index as u64),
		);
		let context = EvaluationContext::new(12.0, 1.0, &feature, &state);
		let text_size = symbol_style.text_size(&context).value;
		assert_eq!(text_size, 16.0);

		let label = symbol_style.text_field(&context).value;
		let width = text_size * label.iter().map(|entry| entry.text.chars().count()).sum::<usize>() as f64 * 0.6;
		let mut symbol = SymbolObject::new(feature, Vec2::new(*x, *y), 0.0, index);
		symbol.set_icon(SymbolQuad::centered(width, text_size));
		symbol.update(12.0, 1.0, 0.0);
		symbols.push(symbol);
	}

	let mut grid = CollisionGrid::new(CollisionGrid::ortho_matrix(512.0, 512.0), 512.0, 512.0, 0.0);
	let visible: Vec<bool> = symbols
		.iter_mut()
		.map(|symbol| symbol.collision_detection(12.0, 1.0, &mut grid))
		.collect();
	// The second label overlaps the first and loses; the third is clear.
	assert_eq!(visible, vec![true, false, true]);

	let hit = resolve_click(&symbols, Vec2::new(300.0, 300.0), 2.0).unwrap();
	assert!(hit.1.properties.iter().any(|(k, v)| k == "name" && *v == ValueVariant::from("Thun")));

	// The suppressed label cannot be clicked; the click falls through to the
	// surviving label underneath.
	let fallthrough = resolve_click(&symbols, Vec2::new(112.0, 100.0), 2.0).unwrap();
	assert!(fallthrough
		.1
		.properties
		.iter()
		.any(|(k, v)| k == "name" && *v == ValueVariant::from("Bern")));
}

#[test]
fn line_placement_spacing_converts_pixels_to_tile_units() {
	let line: Vec<Vec2> = (0..=10).map(|i| Vec2::new(f64::from(i) * 50.0, 0.0)).collect();
	// 120 px at dp 1.5 and 1.25 units per pixel.
	let spacing = 120.0 * 1.5 * 1.25;
	let placements = line_placements(&line, spacing);
	assert_eq!(placements.len(), 2);
	assert_eq!(placements[0].position.x, 225.0);
	assert_eq!(placements[1].position.x, 450.0);
}

#[test]
fn tiles_release_symbol_placement_only_when_every_source_is_ready() {
	let mut ready = ReadyManager::new();
	let mut composite = SourceTileManager::new("composite", &mut ready);
	let mut hillshade = SourceTileManager::new("hillshade", &mut ready);

	let tile = VersionedTileInfo::new(TileCoord::new(10, 1, 1).unwrap(), 1);
	for (manager, layers) in [(&mut composite, vec![0usize, 1]), (&mut hillshade, vec![0usize])] {
		manager
			.mailbox()
			.send(TileUpdateMessage::Loaded {
				info: tile,
				ready_control: layers.into_iter().collect::<BTreeSet<usize>>(),
			})
			.unwrap();
		manager.process_updates(&mut ready);
	}
	assert!(!ready.is_ready());

	for layer_index in [0, 1] {
		composite
			.mailbox()
			.send(TileUpdateMessage::SubLayerReady {
				info: tile,
				layer_index,
			})
			.unwrap();
	}
	composite.process_updates(&mut ready);
	assert!(!ready.is_ready(), "hillshade is still pending");

	hillshade
		.mailbox()
		.send(TileUpdateMessage::SubLayerReady {
			info: tile,
			layer_index: 0,
		})
		.unwrap();
	hillshade.process_updates(&mut ready);
	assert!(ready.take_ready_edge(), "the edge releases symbol placement");

	// Upload order and visibility drive the frame output.
	composite.mark_masks_uploaded(&tile);
	composite.mark_geometry_uploaded(&tile);
	composite.mark_textures_uploaded(&tile);
	composite.set_render_descriptions(
		&tile,
		vec![
			TileRenderDescription {
				layer_index: 1,
				source_hash: 1,
				zoom_id: 10,
				render_objects: vec![RenderObject::new(2)],
				mask: Some(RenderObject::new(9)),
				modifies_mask: true,
				self_masked: false,
				render_pass_index: 0,
			},
			TileRenderDescription {
				layer_index: 0,
				source_hash: 1,
				zoom_id: 10,
				render_objects: vec![RenderObject::new(1)],
				mask: None,
				modifies_mask: false,
				self_masked: false,
				render_pass_index: 0,
			},
		],
	);
	assert_eq!(composite.tile_state(&tile), Some(TileState::Cached));
	assert!(composite.frame_render_descriptions().is_empty());

	composite.set_visible(&tile);
	let frame = composite.frame_render_descriptions();
	assert_eq!(frame.len(), 2);
	assert_eq!(frame[0].layer_index, 0);
	assert_eq!(frame[1].layer_index, 1);

	composite.remove_tile(&tile, &mut ready);
	assert_eq!(composite.tile_state(&tile), None);
}

#[test]
fn collision_grid_matches_the_specified_scenario() {
	let mut grid = CollisionGrid::new(CollisionGrid::ortho_matrix(512.0, 512.0), 512.0, 512.0, 0.0);
	assert_eq!(
		grid.try_insert_rect(&cartiles::CollisionRect::new(10.0, 10.0, 20.0, 20.0)),
		CollisionResult::Placed
	);
	assert_eq!(
		grid.try_insert_rect(&cartiles::CollisionRect::new(25.0, 25.0, 20.0, 20.0)),
		CollisionResult::Collides
	);
	assert_eq!(
		grid.try_insert_rect(&cartiles::CollisionRect::new(100.0, 100.0, 10.0, 10.0)),
		CollisionResult::Placed
	);
}
