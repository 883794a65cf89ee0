//! Entities produced by one pipeline run.

pub mod border;
pub mod grid;
pub mod sector;

pub use border::{Center, ValidatedBorder};
pub use grid::{CellId, GridCell, Vertex};
pub use sector::{IntersectionEdge, Sector};
