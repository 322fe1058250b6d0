//! Foundations shared by every cartiles crate: geometric primitives, colors,
//! the property-key interner, a small JSON toolkit, performance statistics and
//! the task scheduler.

pub mod interner;
pub mod json;
pub mod perf;
pub mod scheduler;
pub mod types;
pub use types::*;
