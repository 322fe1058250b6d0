//! Sprite-sheet and font-atlas metadata.
//!
//! Both are external inputs consumed as JSON; lookups for missing entries
//! degrade gracefully (the symbol is emitted without its icon or with a
//! fallback glyph) and are logged once per name.

use anyhow::{Context, Result};
use cartiles_core::json::{JsonObject, JsonValue};
use log::warn;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// One named sub-rectangle of the sprite image.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteEntry {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	pub pixel_ratio: f64,
	/// Stretchable horizontal bands, sprite-local pixel pairs.
	pub stretch_x: Vec<(f32, f32)>,
	pub stretch_y: Vec<(f32, f32)>,
}

/// The parsed sprite-sheet metadata.
#[derive(Default)]
pub struct SpriteSheet {
	entries: HashMap<String, SpriteEntry>,
	reported_missing: Mutex<HashSet<String>>,
}

impl SpriteSheet {
	/// Parses the sprite JSON: `name → {x, y, width, height, pixelRatio,
	/// stretchX?, stretchY?}`.
	pub fn parse(text: &str) -> Result<SpriteSheet> {
		let json = JsonValue::parse_str(text).context("sprite sheet is not valid JSON")?;
		let object = json.as_object().context("sprite sheet must be an object")?;

		let mut entries = HashMap::new();
		for (name, entry_json) in object.iter() {
			match parse_sprite_entry(entry_json) {
				Some(entry) => {
					entries.insert(name.clone(), entry);
				}
				None => warn!("ignoring malformed sprite entry {name:?}"),
			}
		}
		Ok(SpriteSheet {
			entries,
			reported_missing: Mutex::new(HashSet::new()),
		})
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Looks up a sprite; a miss is logged once per name.
	pub fn get(&self, name: &str) -> Option<&SpriteEntry> {
		let entry = self.entries.get(name);
		if entry.is_none() {
			let mut reported = self.reported_missing.lock().unwrap();
			if reported.insert(name.to_owned()) {
				warn!("sprite {name:?} not found");
			}
		}
		entry
	}
}

fn parse_sprite_entry(json: &JsonValue) -> Option<SpriteEntry> {
	let object = json.as_object().ok()?;
	Some(SpriteEntry {
		x: object.get_number("x").ok()??,
		y: object.get_number("y").ok()??,
		width: object.get_number("width").ok()??,
		height: object.get_number("height").ok()??,
		pixel_ratio: object.get_number("pixelRatio").ok().flatten().unwrap_or(1.0),
		stretch_x: parse_stretch_bands(object, "stretchX"),
		stretch_y: parse_stretch_bands(object, "stretchY"),
	})
}

fn parse_stretch_bands(object: &JsonObject, key: &str) -> Vec<(f32, f32)> {
	let Ok(Some(bands)) = object.get_array(key) else {
		return Vec::new();
	};
	bands
		.iter()
		.filter_map(|band| {
			let pair = band.as_array().ok()?;
			let from = pair.get(0)?.as_number().ok()?;
			let to = pair.get(1)?.as_number().ok()?;
			Some((from as f32, to as f32))
		})
		.collect()
}

/// Metrics of one glyph in the font atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphMetrics {
	pub advance: f64,
	pub width: f64,
	pub height: f64,
	pub left: f64,
	pub top: f64,
}

/// Bitmap-font metadata, loaded by name.
pub struct FontAtlas {
	pub name: String,
	pub line_height: f64,
	pub base: f64,
	glyphs: HashMap<char, GlyphMetrics>,
	fallback: Option<char>,
	reported_missing: Mutex<HashSet<char>>,
}

impl FontAtlas {
	/// Parses the atlas metadata: `{name, lineHeight, base, glyphs: {"A":
	/// {advance, width, height, left, top}, ...}}`.
	pub fn parse(text: &str) -> Result<FontAtlas> {
		let json = JsonValue::parse_str(text).context("font atlas is not valid JSON")?;
		let object = json.as_object().context("font atlas must be an object")?;

		let mut glyphs = HashMap::new();
		if let Some(glyphs_object) = object.get_object("glyphs")? {
			for (text, metrics_json) in glyphs_object.iter() {
				let Some(character) = text.chars().next() else {
					continue;
				};
				match parse_glyph(metrics_json) {
					Some(metrics) => {
						glyphs.insert(character, metrics);
					}
					None => warn!("ignoring malformed glyph {text:?}"),
				}
			}
		}

		let fallback = ['\u{FFFD}', '?', ' '].into_iter().find(|c| glyphs.contains_key(c));
		Ok(FontAtlas {
			name: object.get_string("name")?.unwrap_or_default(),
			line_height: object.get_number("lineHeight")?.unwrap_or(1.2),
			base: object.get_number("base")?.unwrap_or(0.0),
			glyphs,
			fallback,
			reported_missing: Mutex::new(HashSet::new()),
		})
	}

	pub fn glyph_count(&self) -> usize {
		self.glyphs.len()
	}

	/// The metrics of `character`, or the fallback glyph. A miss is logged
	/// once per character.
	pub fn glyph(&self, character: char) -> Option<&GlyphMetrics> {
		if let Some(metrics) = self.glyphs.get(&character) {
			return Some(metrics);
		}
		let mut reported = self.reported_missing.lock().unwrap();
		if reported.insert(character) {
			warn!("font {:?} has no glyph for {character:?}", self.name);
		}
		self.fallback.and_then(|fallback| self.glyphs.get(&fallback))
	}

	/// The advance of a whole text run, with the fallback applied per glyph.
	pub fn measure(&self, text: &str) -> f64 {
		text
			.chars()
			.filter_map(|character| self.glyph(character))
			.map(|metrics| metrics.advance)
			.sum()
	}
}

fn parse_glyph(json: &JsonValue) -> Option<GlyphMetrics> {
	let object = json.as_object().ok()?;
	Some(GlyphMetrics {
		advance: object.get_number("advance").ok()??,
		width: object.get_number("width").ok().flatten().unwrap_or(0.0),
		height: object.get_number("height").ok().flatten().unwrap_or(0.0),
		left: object.get_number("left").ok().flatten().unwrap_or(0.0),
		top: object.get_number("top").ok().flatten().unwrap_or(0.0),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	const SPRITE: &str = r#"{
		"poi": {"x": 0, "y": 0, "width": 20, "height": 20, "pixelRatio": 2},
		"shield": {"x": 20, "y": 0, "width": 30, "height": 20, "stretchX": [[4, 10], [16, 26]], "stretchY": [[4, 16]]},
		"broken": {"x": 1}
	}"#;

	#[test]
	fn parses_entries_and_stretch_bands() {
		let sheet = SpriteSheet::parse(SPRITE).unwrap();
		assert_eq!(sheet.len(), 2);

		let poi = sheet.get("poi").unwrap();
		assert_eq!(poi.pixel_ratio, 2.0);
		assert!(poi.stretch_x.is_empty());

		let shield = sheet.get("shield").unwrap();
		assert_eq!(shield.stretch_x, vec![(4.0, 10.0), (16.0, 26.0)]);
		assert_eq!(shield.stretch_y, vec![(4.0, 16.0)]);
	}

	#[test]
	fn missing_sprites_return_none() {
		let sheet = SpriteSheet::parse(SPRITE).unwrap();
		assert!(sheet.get("no-such-sprite").is_none());
		// A second lookup is silent but still a miss.
		assert!(sheet.get("no-such-sprite").is_none());
	}

	const FONT: &str = r#"{
		"name": "Test Sans",
		"lineHeight": 1.3,
		"base": 0.2,
		"glyphs": {
			"A": {"advance": 10, "width": 9, "height": 12, "left": 0, "top": 0},
			"B": {"advance": 11},
			"?": {"advance": 8}
		}
	}"#;

	#[test]
	fn glyph_lookup_with_fallback() {
		let font = FontAtlas::parse(FONT).unwrap();
		assert_eq!(font.name, "Test Sans");
		assert_eq!(font.glyph_count(), 3);
		assert_eq!(font.glyph('A').unwrap().advance, 10.0);
		// Unknown glyphs fall back to '?'.
		assert_eq!(font.glyph('Z').unwrap().advance, 8.0);
		assert_eq!(font.measure("AB"), 21.0);
		assert_eq!(font.measure("AZ"), 18.0);
	}
}
