//! Per-layer style bundles.
//!
//! A parsed style document yields one [`LayerDescription`] per layer, holding
//! the layer-kind-specific bundle of typed evaluators over a shared
//! expression arena. Background, line and polygon bundles memoise through
//! [`ValueEvaluator`]; symbol and raster bundles hand out classified results
//! through [`FeatureValueEvaluator`] so their callers can memoise per object.

pub mod document;
pub mod types;

use crate::context::EvaluationContext;
use crate::eval::{EvaluationResult, FeatureValueEvaluator, ValueEvaluator};
use crate::expr::ExprHandle;
use crate::used_keys::UsedKeys;
use crate::variant::FormattedEntry;
use cartiles_core::{Color, Vec2};
use self::types::{
	Anchor, BlendMode, IconTextFit, LineCap, SymbolPlacement, SymbolZOrder, TextJustify, TextTransform,
};

/// Fields shared by every layer kind.
pub struct LayerCommon {
	pub id: String,
	pub source: Option<String>,
	pub source_layer: Option<String>,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub visible: bool,
	pub filter: Option<ExprHandle>,
	/// Draw-order override on top of document order; lower draws first.
	pub render_pass_index: u32,
	pub interactable: ValueEvaluator<bool>,
	pub multiselect: bool,
	pub self_masked: bool,
}

impl LayerCommon {
	pub fn is_in_zoom_range(&self, zoom: f64) -> bool {
		zoom >= self.min_zoom && zoom <= self.max_zoom
	}

	/// Applies the layer filter; layers without a filter accept everything.
	pub fn matches_filter(&self, context: &EvaluationContext) -> bool {
		match &self.filter {
			Some(filter) => filter.evaluate(context).to_boolean(),
			None => true,
		}
	}

	pub fn is_interactable(&self, context: &EvaluationContext) -> bool {
		self.interactable.get_result(context, &false)
	}
}

/// One layer of a parsed style document.
pub struct LayerDescription {
	pub common: LayerCommon,
	pub style: LayerStyle,
}

pub enum LayerStyle {
	Background(BackgroundLayerStyle),
	Line(LineLayerStyle),
	Polygon(PolygonLayerStyle),
	Symbol(Box<SymbolLayerStyle>),
	Raster(RasterLayerStyle),
}

impl LayerDescription {
	pub fn kind(&self) -> &'static str {
		match &self.style {
			LayerStyle::Background(_) => "background",
			LayerStyle::Line(_) => "line",
			LayerStyle::Polygon(_) => "fill",
			LayerStyle::Symbol(_) => "symbol",
			LayerStyle::Raster(_) => "raster",
		}
	}

	/// Union of the keys read by the filter and every style property, used to
	/// size per-feature memoisation.
	pub fn used_keys(&self) -> UsedKeys {
		let mut keys = UsedKeys::new();
		if let Some(filter) = &self.common.filter {
			keys.include(&filter.used_keys());
		}
		match &self.style {
			LayerStyle::Background(style) => style.collect_used_keys(&mut keys),
			LayerStyle::Line(style) => style.collect_used_keys(&mut keys),
			LayerStyle::Polygon(style) => style.collect_used_keys(&mut keys),
			LayerStyle::Symbol(style) => style.collect_used_keys(&mut keys),
			LayerStyle::Raster(style) => style.collect_used_keys(&mut keys),
		}
		keys
	}
}

fn include_keys<T: crate::expr::FromVariant + Clone>(keys: &mut UsedKeys, evaluator: &ValueEvaluator<T>) {
	keys.include(evaluator.used_keys());
}

fn include_feature_keys<T: crate::expr::FromVariant + Clone>(
	keys: &mut UsedKeys,
	evaluator: &FeatureValueEvaluator<T>,
) {
	keys.include(evaluator.used_keys());
}

pub struct BackgroundLayerStyle {
	pub color: ValueEvaluator<Color>,
	pub pattern: ValueEvaluator<String>,
	pub opacity: ValueEvaluator<f64>,
	pub blend_mode: ValueEvaluator<BlendMode>,
}

impl BackgroundLayerStyle {
	pub fn color(&self, context: &EvaluationContext) -> Color {
		self.color.get_result(context, &Color::BLACK)
	}

	pub fn pattern(&self, context: &EvaluationContext) -> String {
		self.pattern.get_result(context, &String::new())
	}

	pub fn opacity(&self, context: &EvaluationContext) -> f64 {
		self.opacity.get_result(context, &1.0)
	}

	pub fn blend_mode(&self, context: &EvaluationContext) -> BlendMode {
		self.blend_mode.get_result(context, &BlendMode::Normal)
	}

	fn collect_used_keys(&self, keys: &mut UsedKeys) {
		include_keys(keys, &self.color);
		include_keys(keys, &self.pattern);
		include_keys(keys, &self.opacity);
		include_keys(keys, &self.blend_mode);
	}
}

pub struct LineLayerStyle {
	pub color: ValueEvaluator<Color>,
	pub opacity: ValueEvaluator<f64>,
	pub width: ValueEvaluator<f64>,
	pub blur: ValueEvaluator<f64>,
	pub offset: ValueEvaluator<f64>,
	pub dash_array: ValueEvaluator<Vec<f32>>,
	pub cap: ValueEvaluator<LineCap>,
}

impl LineLayerStyle {
	pub fn color(&self, context: &EvaluationContext) -> Color {
		self.color.get_result(context, &Color::BLACK)
	}

	pub fn opacity(&self, context: &EvaluationContext) -> f64 {
		self.opacity.get_result(context, &1.0)
	}

	/// Width in tile units: the style value is in display points and scales
	/// with the screen-density factor.
	pub fn width(&self, context: &EvaluationContext) -> f64 {
		self.width.get_result(context, &1.0) * context.dp_factor
	}

	pub fn blur(&self, context: &EvaluationContext) -> f64 {
		self.blur.get_result(context, &0.0) * context.dp_factor
	}

	pub fn offset(&self, context: &EvaluationContext) -> f64 {
		self.offset.get_result(context, &0.0) * context.dp_factor
	}

	pub fn dash_array(&self, context: &EvaluationContext) -> Vec<f32> {
		self.dash_array.get_result(context, &Vec::new())
	}

	pub fn cap(&self, context: &EvaluationContext) -> LineCap {
		self.cap.get_result(context, &LineCap::Butt)
	}

	fn collect_used_keys(&self, keys: &mut UsedKeys) {
		include_keys(keys, &self.color);
		include_keys(keys, &self.opacity);
		include_keys(keys, &self.width);
		include_keys(keys, &self.blur);
		include_keys(keys, &self.offset);
		include_keys(keys, &self.dash_array);
		include_keys(keys, &self.cap);
	}
}

pub struct PolygonLayerStyle {
	pub color: ValueEvaluator<Color>,
	pub opacity: ValueEvaluator<f64>,
	pub pattern: ValueEvaluator<String>,
}

impl PolygonLayerStyle {
	pub fn color(&self, context: &EvaluationContext) -> Color {
		self.color.get_result(context, &Color::BLACK)
	}

	pub fn opacity(&self, context: &EvaluationContext) -> f64 {
		self.opacity.get_result(context, &1.0)
	}

	pub fn pattern(&self, context: &EvaluationContext) -> String {
		self.pattern.get_result(context, &String::new())
	}

	fn collect_used_keys(&self, keys: &mut UsedKeys) {
		include_keys(keys, &self.color);
		include_keys(keys, &self.opacity);
		include_keys(keys, &self.pattern);
	}
}

/// The symbol bundle; results are classified for per-symbol memoisation.
pub struct SymbolLayerStyle {
	pub text_field: FeatureValueEvaluator<Vec<FormattedEntry>>,
	pub text_size: FeatureValueEvaluator<f64>,
	pub text_color: FeatureValueEvaluator<Color>,
	pub text_halo_color: FeatureValueEvaluator<Color>,
	pub text_halo_width: FeatureValueEvaluator<f64>,
	pub text_opacity: FeatureValueEvaluator<f64>,
	pub text_font: FeatureValueEvaluator<Vec<String>>,
	pub text_transform: FeatureValueEvaluator<TextTransform>,
	pub text_offset: FeatureValueEvaluator<Vec2>,
	pub text_padding: FeatureValueEvaluator<f64>,
	pub text_anchor: FeatureValueEvaluator<Anchor>,
	pub text_justify: FeatureValueEvaluator<TextJustify>,
	pub text_rotate: FeatureValueEvaluator<f64>,
	pub text_allow_overlap: FeatureValueEvaluator<bool>,
	pub text_optional: FeatureValueEvaluator<bool>,
	pub text_line_height: FeatureValueEvaluator<f64>,
	pub text_letter_spacing: FeatureValueEvaluator<f64>,
	pub text_max_width: FeatureValueEvaluator<f64>,
	pub symbol_sort_key: FeatureValueEvaluator<f64>,
	pub symbol_spacing: FeatureValueEvaluator<f64>,
	pub symbol_placement: FeatureValueEvaluator<SymbolPlacement>,
	pub symbol_z_order: FeatureValueEvaluator<SymbolZOrder>,
	pub icon_image: FeatureValueEvaluator<String>,
	pub icon_size: FeatureValueEvaluator<f64>,
	pub icon_anchor: FeatureValueEvaluator<Anchor>,
	pub icon_offset: FeatureValueEvaluator<Vec2>,
	pub icon_rotate: FeatureValueEvaluator<f64>,
	pub icon_opacity: FeatureValueEvaluator<f64>,
	pub icon_padding: FeatureValueEvaluator<f64>,
	pub icon_allow_overlap: FeatureValueEvaluator<bool>,
	pub icon_optional: FeatureValueEvaluator<bool>,
	pub icon_text_fit: FeatureValueEvaluator<IconTextFit>,
}

impl SymbolLayerStyle {
	pub fn text_field(&self, context: &EvaluationContext) -> EvaluationResult<Vec<FormattedEntry>> {
		self.text_field.get_result(context, &Vec::new())
	}

	pub fn text_size(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		let mut result = self.text_size.get_result(context, &16.0);
		result.value *= context.dp_factor;
		result
	}

	pub fn text_color(&self, context: &EvaluationContext) -> EvaluationResult<Color> {
		self.text_color.get_result(context, &Color::BLACK)
	}

	pub fn text_halo_color(&self, context: &EvaluationContext) -> EvaluationResult<Color> {
		self.text_halo_color.get_result(context, &Color::TRANSPARENT)
	}

	pub fn text_halo_width(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.text_halo_width.get_result(context, &0.0)
	}

	pub fn text_opacity(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.text_opacity.get_result(context, &1.0)
	}

	pub fn text_font(&self, context: &EvaluationContext) -> EvaluationResult<Vec<String>> {
		self
			.text_font
			.get_result(context, &vec!["Open Sans Regular".to_owned()])
	}

	pub fn text_transform(&self, context: &EvaluationContext) -> EvaluationResult<TextTransform> {
		self.text_transform.get_result(context, &TextTransform::None)
	}

	pub fn text_offset(&self, context: &EvaluationContext) -> EvaluationResult<Vec2> {
		self.text_offset.get_result(context, &Vec2::default())
	}

	pub fn text_padding(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.text_padding.get_result(context, &2.0)
	}

	pub fn text_anchor(&self, context: &EvaluationContext) -> EvaluationResult<Anchor> {
		self.text_anchor.get_result(context, &Anchor::Center)
	}

	pub fn text_justify(&self, context: &EvaluationContext) -> EvaluationResult<TextJustify> {
		self.text_justify.get_result(context, &TextJustify::Center)
	}

	pub fn text_rotate(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.text_rotate.get_result(context, &0.0)
	}

	pub fn text_allow_overlap(&self, context: &EvaluationContext) -> EvaluationResult<bool> {
		self.text_allow_overlap.get_result(context, &false)
	}

	pub fn text_optional(&self, context: &EvaluationContext) -> EvaluationResult<bool> {
		self.text_optional.get_result(context, &false)
	}

	pub fn text_line_height(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.text_line_height.get_result(context, &1.2)
	}

	pub fn text_letter_spacing(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.text_letter_spacing.get_result(context, &0.0)
	}

	pub fn text_max_width(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.text_max_width.get_result(context, &10.0)
	}

	pub fn symbol_sort_key(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.symbol_sort_key.get_result(context, &0.0)
	}

	/// Spacing between repeated symbols along a line, in pixels.
	pub fn symbol_spacing(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.symbol_spacing.get_result(context, &250.0)
	}

	pub fn symbol_placement(&self, context: &EvaluationContext) -> EvaluationResult<SymbolPlacement> {
		self.symbol_placement.get_result(context, &SymbolPlacement::Point)
	}

	pub fn symbol_z_order(&self, context: &EvaluationContext) -> EvaluationResult<SymbolZOrder> {
		self.symbol_z_order.get_result(context, &SymbolZOrder::Auto)
	}

	pub fn icon_image(&self, context: &EvaluationContext) -> EvaluationResult<String> {
		self.icon_image.get_result(context, &String::new())
	}

	pub fn icon_size(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.icon_size.get_result(context, &1.0)
	}

	pub fn icon_anchor(&self, context: &EvaluationContext) -> EvaluationResult<Anchor> {
		self.icon_anchor.get_result(context, &Anchor::Center)
	}

	pub fn icon_offset(&self, context: &EvaluationContext) -> EvaluationResult<Vec2> {
		self.icon_offset.get_result(context, &Vec2::default())
	}

	pub fn icon_rotate(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.icon_rotate.get_result(context, &0.0)
	}

	pub fn icon_opacity(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.icon_opacity.get_result(context, &1.0)
	}

	pub fn icon_padding(&self, context: &EvaluationContext) -> EvaluationResult<f64> {
		self.icon_padding.get_result(context, &2.0)
	}

	pub fn icon_allow_overlap(&self, context: &EvaluationContext) -> EvaluationResult<bool> {
		self.icon_allow_overlap.get_result(context, &false)
	}

	pub fn icon_optional(&self, context: &EvaluationContext) -> EvaluationResult<bool> {
		self.icon_optional.get_result(context, &false)
	}

	pub fn icon_text_fit(&self, context: &EvaluationContext) -> EvaluationResult<IconTextFit> {
		self.icon_text_fit.get_result(context, &IconTextFit::None)
	}

	fn collect_used_keys(&self, keys: &mut UsedKeys) {
		include_feature_keys(keys, &self.text_field);
		include_feature_keys(keys, &self.text_size);
		include_feature_keys(keys, &self.text_color);
		include_feature_keys(keys, &self.text_halo_color);
		include_feature_keys(keys, &self.text_halo_width);
		include_feature_keys(keys, &self.text_opacity);
		include_feature_keys(keys, &self.text_font);
		include_feature_keys(keys, &self.text_transform);
		include_feature_keys(keys, &self.text_offset);
		include_feature_keys(keys, &self.text_padding);
		include_feature_keys(keys, &self.text_anchor);
		include_feature_keys(keys, &self.text_justify);
		include_feature_keys(keys, &self.text_rotate);
		include_feature_keys(keys, &self.text_allow_overlap);
		include_feature_keys(keys, &self.text_optional);
		include_feature_keys(keys, &self.text_line_height);
		include_feature_keys(keys, &self.text_letter_spacing);
		include_feature_keys(keys, &self.text_max_width);
		include_feature_keys(keys, &self.symbol_sort_key);
		include_feature_keys(keys, &self.symbol_spacing);
		include_feature_keys(keys, &self.symbol_placement);
		include_feature_keys(keys, &self.symbol_z_order);
		include_feature_keys(keys, &self.icon_image);
		include_feature_keys(keys, &self.icon_size);
		include_feature_keys(keys, &self.icon_anchor);
		include_feature_keys(keys, &self.icon_offset);
		include_feature_keys(keys, &self.icon_rotate);
		include_feature_keys(keys, &self.icon_opacity);
		include_feature_keys(keys, &self.icon_padding);
		include_feature_keys(keys, &self.icon_allow_overlap);
		include_feature_keys(keys, &self.icon_optional);
		include_feature_keys(keys, &self.icon_text_fit);
	}
}

/// The raster bundle, plus a per-frame snapshot of all of its values.
pub struct RasterLayerStyle {
	pub opacity: FeatureValueEvaluator<f64>,
	pub brightness_min: FeatureValueEvaluator<f64>,
	pub brightness_max: FeatureValueEvaluator<f64>,
	pub contrast: FeatureValueEvaluator<f64>,
	pub saturation: FeatureValueEvaluator<f64>,
	pub gamma: FeatureValueEvaluator<f64>,
	pub brightness_shift: FeatureValueEvaluator<f64>,
	pub blend_mode: FeatureValueEvaluator<BlendMode>,
}

/// The evaluated raster parameters for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterStyle {
	pub opacity: f64,
	pub brightness_min: f64,
	pub brightness_max: f64,
	pub contrast: f64,
	pub saturation: f64,
	pub gamma: f64,
	pub brightness_shift: f64,
	pub blend_mode: BlendMode,
}

impl RasterLayerStyle {
	pub fn evaluate(&self, context: &EvaluationContext, layer_alpha: f64) -> RasterStyle {
		RasterStyle {
			opacity: self.opacity.get_result(context, &1.0).value * layer_alpha,
			brightness_min: self.brightness_min.get_result(context, &0.0).value,
			brightness_max: self.brightness_max.get_result(context, &1.0).value,
			contrast: self.contrast.get_result(context, &0.0).value,
			saturation: self.saturation.get_result(context, &0.0).value,
			gamma: self.gamma.get_result(context, &1.0).value,
			brightness_shift: self.brightness_shift.get_result(context, &0.0).value,
			blend_mode: self.blend_mode.get_result(context, &BlendMode::Normal).value,
		}
	}

	fn collect_used_keys(&self, keys: &mut UsedKeys) {
		include_feature_keys(keys, &self.opacity);
		include_feature_keys(keys, &self.brightness_min);
		include_feature_keys(keys, &self.brightness_max);
		include_feature_keys(keys, &self.contrast);
		include_feature_keys(keys, &self.saturation);
		include_feature_keys(keys, &self.gamma);
		include_feature_keys(keys, &self.brightness_shift);
		include_feature_keys(keys, &self.blend_mode);
	}
}
