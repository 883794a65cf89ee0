//! Sectorgrid - directional sector analysis over a tessellated border
//!
//! Cleans a land border, covers it with a square grid, casts three geodesic
//! sectors from every grid corner and joins the sectors against the corners.

pub mod error;
pub mod geometry;
pub mod io;
pub mod models;
pub mod params;
pub mod pip;
pub mod pipeline;

pub use error::PipelineError;
pub use geometry::sector_polygon;
pub use models::{Center, CellId, GridCell, IntersectionEdge, Sector, Vertex};
pub use params::PipelineParams;
pub use pipeline::{Pipeline, PipelineOutput, Stage};
