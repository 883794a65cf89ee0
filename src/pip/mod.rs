//! Point-in-polygon join of sectors against grid vertices.
//!
//! Vertex points go into an R-tree; each sector queries it by bounding box
//! and the candidates are confirmed with an exact, boundary-inclusive test.

mod index;
mod intersections;

pub use index::{IndexedVertex, VertexSpatialIndex};
pub use intersections::{intersect_sectors, IntersectionTable};
