//! Screen-space collision detection for labels and icons.

mod grid;
mod obb;

pub use grid::{CollisionCircle, CollisionGrid, CollisionRect, CollisionResult};
pub use obb::Obb2;
