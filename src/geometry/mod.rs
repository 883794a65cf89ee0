//! Geometry stages: repair, cleanup, tessellation, vertices and sectors.

mod cleanup;
mod grid;
mod projection;
mod repair;
mod sector;
mod vertices;

pub use cleanup::{clean_border, largest_component, morph};
pub use grid::tessellate;
pub use projection::Projector;
pub use repair::{repair_multipolygon, repair_polygon, validate_and_union};
pub use sector::{build_sectors, sector_polygon, sector_polygon_with_segments, SectorShape};
pub use vertices::extract_vertices;
