//! Collaborator IO: GeoJSON border input and table output.

mod geojson;
mod tables;

pub use geojson::{
    feature_collection, multipolygon_feature, polygon_coordinates, polygon_feature, read_border_records,
};
pub use tables::{write_tables, IntersectionRow, Manifest, VertexRow};
pub use tables::{
    CENTER_FILE, CLEAN_BORDER_FILE, GRID_FILE, INTERSECTIONS_FILE, MANIFEST_FILE, RAW_UNION_FILE, SECTORS_FILE,
    VERTICES_FILE,
};
