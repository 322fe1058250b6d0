//! cartiles: a rendering core for tiled vector maps.
//!
//! The engine ingests Mapbox-style style documents and decoded vector tiles,
//! evaluates style expressions per feature through memoising evaluators,
//! tessellates geometry into 16-bit render batches, runs symbol collision on
//! a per-frame screen-space grid and drives tiles through an explicit
//! lifecycle towards per-frame render descriptions.
//!
//! The workspace splits into three layers, re-exported here:
//!
//! - [`core`]: primitives, the property-key interner, JSON, performance
//!   statistics and the task scheduler;
//! - [`style`]: the dynamic value model, the expression IR with parser and
//!   evaluators, and per-layer style bundles;
//! - [`render`]: collision, symbols, tile lifecycles and geometry assembly.

pub use cartiles_core as core;
pub use cartiles_render as render;
pub use cartiles_style as style;

pub use cartiles_core::{Color, Coord, RectCoord, TileCoord, UnitBezier, Vec2, ZoomRange};
pub use cartiles_render::{
	CollisionGrid, CollisionRect, CollisionResult, Obb2, ReadyManager, SourceTileManager, SymbolObject,
	TileRenderDescription, TileState, VersionedTileInfo,
};
pub use cartiles_style::{
	EvaluationContext, EvaluationResult, ExprHandle, FeatureContext, FeatureStateManager,
	FeatureValueEvaluator, GeomType, LayerDescription, ValueEvaluator, ValueVariant, parse_style_document,
};
