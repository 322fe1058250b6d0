//! Enumerated style values parsed from their Mapbox-style string spellings.

/// Anchor of an icon or label relative to its coordinate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Anchor {
	#[default]
	Center,
	Left,
	Right,
	Top,
	Bottom,
	TopLeft,
	TopRight,
	BottomLeft,
	BottomRight,
}

impl Anchor {
	pub fn parse(value: &str) -> Option<Anchor> {
		Some(match value {
			"center" => Anchor::Center,
			"left" => Anchor::Left,
			"right" => Anchor::Right,
			"top" => Anchor::Top,
			"bottom" => Anchor::Bottom,
			"top-left" => Anchor::TopLeft,
			"top-right" => Anchor::TopRight,
			"bottom-left" => Anchor::BottomLeft,
			"bottom-right" => Anchor::BottomRight,
			_ => return None,
		})
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TextJustify {
	#[default]
	Auto,
	Center,
	Left,
	Right,
}

impl TextJustify {
	pub fn parse(value: &str) -> Option<TextJustify> {
		Some(match value {
			"auto" => TextJustify::Auto,
			"center" => TextJustify::Center,
			"left" => TextJustify::Left,
			"right" => TextJustify::Right,
			_ => return None,
		})
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SymbolPlacement {
	#[default]
	Point,
	Line,
	LineCenter,
}

impl SymbolPlacement {
	pub fn parse(value: &str) -> Option<SymbolPlacement> {
		Some(match value {
			"point" => SymbolPlacement::Point,
			"line" => SymbolPlacement::Line,
			"line-center" => SymbolPlacement::LineCenter,
			_ => return None,
		})
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LineCap {
	#[default]
	Butt,
	Round,
	Square,
}

impl LineCap {
	pub fn parse(value: &str) -> Option<LineCap> {
		Some(match value {
			"butt" => LineCap::Butt,
			"round" => LineCap::Round,
			"square" => LineCap::Square,
			_ => return None,
		})
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TextTransform {
	#[default]
	None,
	Uppercase,
	Lowercase,
}

impl TextTransform {
	pub fn parse(value: &str) -> Option<TextTransform> {
		Some(match value {
			"none" => TextTransform::None,
			"uppercase" => TextTransform::Uppercase,
			"lowercase" => TextTransform::Lowercase,
			_ => return None,
		})
	}

	pub fn apply(&self, text: &str) -> String {
		match self {
			TextTransform::None => text.to_owned(),
			TextTransform::Uppercase => text.to_uppercase(),
			TextTransform::Lowercase => text.to_lowercase(),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BlendMode {
	#[default]
	Normal,
	Multiply,
}

impl BlendMode {
	pub fn parse(value: &str) -> Option<BlendMode> {
		Some(match value {
			"normal" => BlendMode::Normal,
			"multiply" => BlendMode::Multiply,
			_ => return None,
		})
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SymbolZOrder {
	#[default]
	Auto,
	Source,
	ViewportY,
}

impl SymbolZOrder {
	pub fn parse(value: &str) -> Option<SymbolZOrder> {
		Some(match value {
			"auto" => SymbolZOrder::Auto,
			"source" => SymbolZOrder::Source,
			"viewport-y" => SymbolZOrder::ViewportY,
			_ => return None,
		})
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IconTextFit {
	#[default]
	None,
	Width,
	Height,
	Both,
}

impl IconTextFit {
	pub fn parse(value: &str) -> Option<IconTextFit> {
		Some(match value {
			"none" => IconTextFit::None,
			"width" => IconTextFit::Width,
			"height" => IconTextFit::Height,
			"both" => IconTextFit::Both,
			_ => return None,
		})
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SymbolAlignment {
	#[default]
	Auto,
	Map,
	Viewport,
}

impl SymbolAlignment {
	pub fn parse(value: &str) -> Option<SymbolAlignment> {
		Some(match value {
			"auto" => SymbolAlignment::Auto,
			"map" => SymbolAlignment::Map,
			"viewport" => SymbolAlignment::Viewport,
			_ => return None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parsing_round_trip() {
		assert_eq!(Anchor::parse("bottom-left"), Some(Anchor::BottomLeft));
		assert_eq!(Anchor::parse("middle"), None);
		assert_eq!(SymbolPlacement::parse("line-center"), Some(SymbolPlacement::LineCenter));
		assert_eq!(LineCap::parse("round"), Some(LineCap::Round));
		assert_eq!(BlendMode::parse("multiply"), Some(BlendMode::Multiply));
		assert_eq!(SymbolZOrder::parse("viewport-y"), Some(SymbolZOrder::ViewportY));
		assert_eq!(IconTextFit::parse("both"), Some(IconTextFit::Both));
		assert_eq!(SymbolAlignment::parse("viewport"), Some(SymbolAlignment::Viewport));
	}

	#[test]
	fn text_transform_application() {
		assert_eq!(TextTransform::Uppercase.apply("Bern"), "BERN");
		assert_eq!(TextTransform::None.apply("Bern"), "Bern");
	}
}
