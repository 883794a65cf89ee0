//! Grid cells and the corner vertices derived from them.

use geo_types::{Point, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column/row address of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub i: i64,
    pub j: i64,
}

impl CellId {
    pub fn new(i: i64, j: i64) -> Self {
        Self { i, j }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.i, self.j)
    }
}

/// One S×S square of the tessellation, in the projected CRS
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub id: CellId,
    pub polygon: Polygon<f64>,
}

impl GridCell {
    /// Name used in output tables, e.g. `"12_-3"`
    pub fn name(&self) -> String {
        self.id.to_string()
    }
}

/// A grid corner point.
///
/// `cells` lists every cell the corner was emitted for. Without
/// canonicalization that is always exactly one cell, and a physical corner
/// shared by several cells appears once per cell under distinct ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: u64,
    pub cells: Vec<CellId>,
    /// Projected (metric) coordinate
    pub projected: Point<f64>,
    /// Geographic (lon, lat) coordinate
    pub geographic: Point<f64>,
}
