//! RGBA color with parsing for the CSS color forms used by map styles:
//! `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`, `hsl()`, `hsla()` and
//! named colors. Parsing is case- and whitespace-insensitive.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::{self, Debug};

/// A color with four channels in `[0, 1]`.
#[derive(Clone, Copy, PartialEq)]
pub struct Color {
	pub r: f32,
	pub g: f32,
	pub b: f32,
	pub a: f32,
}

impl Color {
	pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Color {
		Color { r, g, b, a }
	}

	pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
	pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
	pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

	fn from_bytes(r: u8, g: u8, b: u8, a: f32) -> Color {
		Color::new(
			f32::from(r) / 255.0,
			f32::from(g) / 255.0,
			f32::from(b) / 255.0,
			a,
		)
	}

	/// Multiplies all four channels by `alpha`.
	pub fn with_multiplied_alpha(&self, alpha: f32) -> Color {
		Color::new(self.r, self.g, self.b, self.a * alpha)
	}

	/// Formats the color the way `to-string` expressions expect it.
	pub fn to_rgba_string(&self) -> String {
		format!(
			"rgba({},{},{},{})",
			(self.r * 255.0).round() as u8,
			(self.g * 255.0).round() as u8,
			(self.b * 255.0).round() as u8,
			self.a
		)
	}

	/// Parses a CSS color string. Returns `None` when the input is not a
	/// recognisable color.
	pub fn parse(input: &str) -> Option<Color> {
		let normalized: String = input
			.chars()
			.filter(|c| !c.is_whitespace())
			.map(|c| c.to_ascii_lowercase())
			.collect();
		if normalized.is_empty() {
			return None;
		}

		if let Some(color) = NAMED_COLORS.get(normalized.as_str()) {
			return Some(*color);
		}

		if let Some(hex) = normalized.strip_prefix('#') {
			return parse_hex(hex);
		}

		if let Some(open) = normalized.find('(') {
			if !normalized.ends_with(')') {
				return None;
			}
			let head = &normalized[..open];
			let args: Vec<&str> = normalized[open + 1..normalized.len() - 1].split(',').collect();
			return match head {
				"rgb" if args.len() == 3 => parse_rgb(&args, 1.0),
				"rgba" if args.len() == 4 => parse_rgb(&args[..3], parse_css_float(args[3])?),
				"hsl" if args.len() == 3 => parse_hsl(&args, 1.0),
				"hsla" if args.len() == 4 => parse_hsl(&args[..3], parse_css_float(args[3])?),
				_ => None,
			};
		}

		None
	}
}

impl Debug for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("Color({}, {}, {}, {})", self.r, self.g, self.b, self.a))
	}
}

fn parse_hex(hex: &str) -> Option<Color> {
	let digit = |c: u8| char::from(c).to_digit(16).map(|d| d as u8);
	let bytes = hex.as_bytes();
	match bytes.len() {
		3 => {
			let r = digit(bytes[0])?;
			let g = digit(bytes[1])?;
			let b = digit(bytes[2])?;
			Some(Color::from_bytes(r * 17, g * 17, b * 17, 1.0))
		}
		6 | 8 => {
			let mut channels = [0u8; 4];
			for (i, chunk) in bytes.chunks(2).enumerate() {
				channels[i] = digit(chunk[0])? * 16 + digit(chunk[1])?;
			}
			let alpha = if bytes.len() == 8 {
				f32::from(channels[3]) / 255.0
			} else {
				1.0
			};
			Some(Color::from_bytes(channels[0], channels[1], channels[2], alpha))
		}
		_ => None,
	}
}

fn parse_rgb(args: &[&str], alpha: f32) -> Option<Color> {
	let mut channels = [0u8; 3];
	for (channel, arg) in channels.iter_mut().zip(args) {
		*channel = parse_css_byte(arg)?;
	}
	Some(Color::from_bytes(channels[0], channels[1], channels[2], alpha))
}

fn parse_hsl(args: &[&str], alpha: f32) -> Option<Color> {
	let hue: f64 = args[0].parse().ok()?;
	let hue = (hue.rem_euclid(360.0) / 360.0) as f32;
	let saturation = parse_css_percentage(args[1])?;
	let lightness = parse_css_percentage(args[2])?;

	let m2 = if lightness <= 0.5 {
		lightness * (saturation + 1.0)
	} else {
		lightness + saturation - lightness * saturation
	};
	let m1 = lightness * 2.0 - m2;

	Some(Color::new(
		hue_to_rgb(m1, m2, hue + 1.0 / 3.0),
		hue_to_rgb(m1, m2, hue),
		hue_to_rgb(m1, m2, hue - 1.0 / 3.0),
		alpha,
	))
}

fn hue_to_rgb(m1: f32, m2: f32, mut h: f32) -> f32 {
	if h < 0.0 {
		h += 1.0;
	} else if h > 1.0 {
		h -= 1.0;
	}
	if h * 6.0 < 1.0 {
		return m1 + (m2 - m1) * h * 6.0;
	}
	if h * 2.0 < 1.0 {
		return m2;
	}
	if h * 3.0 < 2.0 {
		return m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0;
	}
	m1
}

/// Parses an integer channel, or a percentage of 255.
fn parse_css_byte(arg: &str) -> Option<u8> {
	if let Some(percentage) = arg.strip_suffix('%') {
		let value: f32 = percentage.parse().ok()?;
		Some((value / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8)
	} else {
		let value: f32 = arg.parse().ok()?;
		Some(value.round().clamp(0.0, 255.0) as u8)
	}
}

/// Parses a float in `[0, 1]`, or a percentage thereof.
fn parse_css_float(arg: &str) -> Option<f32> {
	if let Some(percentage) = arg.strip_suffix('%') {
		let value: f32 = percentage.parse().ok()?;
		Some((value / 100.0).clamp(0.0, 1.0))
	} else {
		let value: f32 = arg.parse().ok()?;
		Some(value.clamp(0.0, 1.0))
	}
}

fn parse_css_percentage(arg: &str) -> Option<f32> {
	let percentage = arg.strip_suffix('%')?;
	let value: f32 = percentage.parse().ok()?;
	Some((value / 100.0).clamp(0.0, 1.0))
}

lazy_static! {
	static ref NAMED_COLORS: HashMap<&'static str, Color> = {
		let c = |r: u8, g: u8, b: u8| Color::from_bytes(r, g, b, 1.0);
		HashMap::from([
			("aliceblue", c(240, 248, 255)),
			("aqua", c(0, 255, 255)),
			("beige", c(245, 245, 220)),
			("black", c(0, 0, 0)),
			("blue", c(0, 0, 255)),
			("brown", c(165, 42, 42)),
			("coral", c(255, 127, 80)),
			("crimson", c(220, 20, 60)),
			("cyan", c(0, 255, 255)),
			("darkblue", c(0, 0, 139)),
			("darkgray", c(169, 169, 169)),
			("darkgreen", c(0, 100, 0)),
			("darkorange", c(255, 140, 0)),
			("darkred", c(139, 0, 0)),
			("dimgray", c(105, 105, 105)),
			("firebrick", c(178, 34, 34)),
			("forestgreen", c(34, 139, 34)),
			("fuchsia", c(255, 0, 255)),
			("gainsboro", c(220, 220, 220)),
			("gold", c(255, 215, 0)),
			("gray", c(128, 128, 128)),
			("green", c(0, 128, 0)),
			("grey", c(128, 128, 128)),
			("hotpink", c(255, 105, 180)),
			("indigo", c(75, 0, 130)),
			("ivory", c(255, 255, 240)),
			("khaki", c(240, 230, 140)),
			("lavender", c(230, 230, 250)),
			("lightblue", c(173, 216, 230)),
			("lightgray", c(211, 211, 211)),
			("lightgreen", c(144, 238, 144)),
			("lightyellow", c(255, 255, 224)),
			("lime", c(0, 255, 0)),
			("magenta", c(255, 0, 255)),
			("maroon", c(128, 0, 0)),
			("midnightblue", c(25, 25, 112)),
			("navy", c(0, 0, 128)),
			("olive", c(128, 128, 0)),
			("orange", c(255, 165, 0)),
			("orangered", c(255, 69, 0)),
			("pink", c(255, 192, 203)),
			("purple", c(128, 0, 128)),
			("red", c(255, 0, 0)),
			("royalblue", c(65, 105, 225)),
			("salmon", c(250, 128, 114)),
			("seagreen", c(46, 139, 87)),
			("sienna", c(160, 82, 45)),
			("silver", c(192, 192, 192)),
			("skyblue", c(135, 206, 235)),
			("slategray", c(112, 128, 144)),
			("snow", c(255, 250, 250)),
			("steelblue", c(70, 130, 180)),
			("tan", c(210, 180, 140)),
			("teal", c(0, 128, 128)),
			("tomato", c(255, 99, 71)),
			("transparent", Color::TRANSPARENT),
			("turquoise", c(64, 224, 208)),
			("violet", c(238, 130, 238)),
			("wheat", c(245, 222, 179)),
			("white", c(255, 255, 255)),
			("whitesmoke", c(245, 245, 245)),
			("yellow", c(255, 255, 0)),
			("yellowgreen", c(154, 205, 50)),
		])
	};
}
