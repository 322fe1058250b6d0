//! The render-side core of cartiles: screen-space collision, symbol layout,
//! tile lifecycles and the assembly of decoded tile geometry into render
//! batches.

pub mod assembly;
pub mod assets;
pub mod collision;
pub mod symbol;
pub mod tile;

pub use collision::{CollisionCircle, CollisionGrid, CollisionRect, CollisionResult, Obb2};
pub use symbol::{SymbolLabel, SymbolObject, SymbolQuad, resolve_click};
pub use tile::{
	DecodedFeature, FeatureGeometry, ReadyManager, SourceTileManager, TileRenderDescription, TileState,
	TileStatus, TileUpdateMessage, VersionedTileInfo,
};
