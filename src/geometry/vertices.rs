//! Corner vertices of the retained grid cells.

use geo::Point;
use hashbrown::HashMap;
use tracing::info;

use crate::error::Result;
use crate::geometry::Projector;
use crate::models::{GridCell, Vertex};
use crate::params::VertexMode;

/// Emit the corners of every cell as vertices with ids starting at 1.
///
/// Corners follow each cell's ring order, closing point excluded. With
/// [`VertexMode::PerCell`] a corner shared by neighbouring cells is emitted
/// once per cell, so the result has exactly `4 * cells.len()` entries.
/// [`VertexMode::Canonical`] merges corners whose projected coordinates
/// round to the same value and records every owning cell on the survivor.
pub fn extract_vertices(cells: &[GridCell], mode: VertexMode, projector: &Projector) -> Result<Vec<Vertex>> {
    let mut vertices: Vec<Vertex> = Vec::with_capacity(cells.len() * 4);
    let mut canonical: HashMap<(u64, u64), usize> = HashMap::new();

    for cell in cells {
        for corner in cell_corners(cell) {
            if let VertexMode::Canonical { decimals } = mode {
                let key = snap_key(corner, decimals);
                if let Some(&idx) = canonical.get(&key) {
                    let existing = &mut vertices[idx];
                    if !existing.cells.contains(&cell.id) {
                        existing.cells.push(cell.id);
                    }
                    continue;
                }
                canonical.insert(key, vertices.len());
            }

            let projected = Point::from(corner);
            vertices.push(Vertex {
                id: vertices.len() as u64 + 1,
                cells: vec![cell.id],
                projected,
                geographic: projector.point_to_geographic(projected)?,
            });
        }
    }

    info!(
        "Extracted {} vertices from {} cells ({:?})",
        vertices.len(),
        cells.len(),
        mode
    );

    Ok(vertices)
}

/// Ring coordinates without the repeated closing point
fn cell_corners(cell: &GridCell) -> impl Iterator<Item = geo::Coord<f64>> + '_ {
    let ring = &cell.polygon.exterior().0;
    let open_len = if ring.len() > 1 && ring.first() == ring.last() {
        ring.len() - 1
    } else {
        ring.len()
    };
    ring[..open_len].iter().copied()
}

/// Bits of the coordinate rounded to `decimals` places. Stays exact at
/// magnitudes where the scaled value no longer fits an integer.
fn snap_key(coord: geo::Coord<f64>, decimals: u32) -> (u64, u64) {
    let scale = 10f64.powi(decimals as i32);
    // `+ 0.0` folds -0.0 into 0.0
    let snap = |v: f64| ((v * scale).round() / scale + 0.0).to_bits();
    (snap(coord.x), snap(coord.y))
}
