//! Structural status diff
//!
//! - [`engine`]: recursive comparison of two [`crate::record::Record`] trees
//! - [`render`]: display text for a [`DiffResult`]

pub mod engine;
pub mod render;

pub use engine::{diff, diff_status, DiffEntry, DiffResult};
pub use render::render;
