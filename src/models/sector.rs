//! Directional sectors and the adjacency relation they induce.

use geo_types::Polygon;
use serde::{Deserialize, Serialize};

/// Circular-sector polygon owned by one (vertex, azimuth) pair, in the
/// geographic CRS
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub vertex_id: u64,
    /// Central bearing, degrees clockwise from north
    pub azimuth: f64,
    pub polygon: Polygon<f64>,
}

/// `target_vertex_id` lies inside (or on the boundary of) the sector that
/// `source_vertex_id` casts towards `azimuth`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionEdge {
    pub source_vertex_id: u64,
    pub azimuth: f64,
    pub target_vertex_id: u64,
}

impl IntersectionEdge {
    /// Ordering by (source, azimuth, target)
    pub fn cmp_key(&self, other: &Self) -> std::cmp::Ordering {
        self.source_vertex_id
            .cmp(&other.source_vertex_id)
            .then(self.azimuth.total_cmp(&other.azimuth))
            .then(self.target_vertex_id.cmp(&other.target_vertex_id))
    }

    pub fn is_self_edge(&self) -> bool {
        self.source_vertex_id == self.target_vertex_id
    }
}
