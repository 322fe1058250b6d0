//! Tile lifecycles: versioned tile identity, the per-source state machine,
//! cross-source readiness and the per-frame render descriptions.

mod decoded;
mod info;
mod ready;
mod render_description;
mod state;

pub use decoded::{DecodedFeature, FeatureGeometry, PolygonRings};
pub use info::{TileStatus, VersionedTileInfo};
pub use ready::{ManagerId, ReadyManager};
pub use render_description::{RenderObject, TileRenderDescription, sort_for_frame};
pub use state::{SourceTileManager, TileState, TileUpdateMessage};
