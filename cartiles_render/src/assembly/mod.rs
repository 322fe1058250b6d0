//! Assembly of decoded tile geometry into render batches.

mod line;
mod polygon;
mod raster;

pub use line::{LineAssembler, LineBatch};
pub use polygon::{PolygonAssembler, PolygonBatch};
pub use raster::RasterTileObject;

/// Largest vertex count addressable with 16-bit indices.
pub(crate) const MAX_BATCH_VERTICES: usize = u16::MAX as usize;
