//! Square tessellation of the cleaned border in the metric plane.

use geo::{BoundingRect, Coord, Intersects, LineString, Polygon, Rect};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::{CellId, GridCell};
use crate::params::GridAnchor;

/// Slack, as a fraction of the side length, when counting cells. Buffering
/// snaps coordinates to a fixed-point lattice, so an extent that is an exact
/// multiple of the side length can come back a hair too long. Cover of the
/// bounding box holds up to `CELL_COUNT_EPSILON * size`.
const CELL_COUNT_EPSILON: f64 = 1e-6;

/// Cover the bounding box of `region` (metric CRS) with `size` x `size`
/// squares and keep those that intersect it, boundary contact included.
///
/// Cells come back sorted by (i, j).
pub fn tessellate(region: &Polygon<f64>, size: f64, anchor: GridAnchor) -> Result<Vec<GridCell>> {
    if !(size.is_finite() && size > 0.0) {
        return Err(PipelineError::invalid(
            "square_size_m",
            format!("expected a positive number, got {size}"),
        ));
    }

    let Some(bbox) = region.bounding_rect() else {
        return Ok(Vec::new());
    };

    let lattice = Lattice::covering(bbox, size, anchor);
    info!(
        "Tessellating {:.0} x {:.0} extent into {} x {} candidate cells of {} m",
        bbox.width(),
        bbox.height(),
        lattice.cols(),
        lattice.rows(),
        size
    );

    let mut cells: Vec<GridCell> = lattice
        .ids()
        .collect::<Vec<_>>()
        .into_par_iter()
        .filter_map(|id| {
            let polygon = lattice.cell_polygon(id);
            polygon.intersects(region).then_some(GridCell { id, polygon })
        })
        .collect();

    cells.sort_by_key(|cell| cell.id);

    debug!(
        "Dropped {} cells outside the border",
        lattice.cols() * lattice.rows() - cells.len()
    );
    info!("Grid has {} cells", cells.len());

    Ok(cells)
}

/// Index range and geometry of the candidate cells
#[derive(Debug, Clone, Copy)]
struct Lattice {
    origin: Coord<f64>,
    size: f64,
    i_range: (i64, i64),
    j_range: (i64, i64),
}

impl Lattice {
    fn covering(bbox: Rect<f64>, size: f64, anchor: GridAnchor) -> Self {
        let (min, max) = (bbox.min(), bbox.max());
        match anchor {
            GridAnchor::BoundsOrigin => Self {
                origin: min,
                size,
                i_range: (0, cell_count(max.x - min.x, size) - 1),
                j_range: (0, cell_count(max.y - min.y, size) - 1),
            },
            GridAnchor::CrsOrigin => Self {
                origin: Coord { x: 0.0, y: 0.0 },
                size,
                i_range: crs_range(min.x, max.x, size),
                j_range: crs_range(min.y, max.y, size),
            },
        }
    }

    fn cols(&self) -> usize {
        (self.i_range.1 - self.i_range.0 + 1) as usize
    }

    fn rows(&self) -> usize {
        (self.j_range.1 - self.j_range.0 + 1) as usize
    }

    fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        (self.i_range.0..=self.i_range.1)
            .flat_map(move |i| (self.j_range.0..=self.j_range.1).map(move |j| CellId::new(i, j)))
    }

    /// Ring order: (x0,y0) -> (x0,y1) -> (x1,y1) -> (x1,y0) -> (x0,y0)
    fn cell_polygon(&self, id: CellId) -> Polygon<f64> {
        // Neighbours must compute shared edges from the same expression
        let x = |i: i64| self.origin.x + i as f64 * self.size;
        let y = |j: i64| self.origin.y + j as f64 * self.size;
        let (x0, x1) = (x(id.i), x(id.i + 1));
        let (y0, y1) = (y(id.j), y(id.j + 1));

        Polygon::new(
            LineString::from(vec![(x0, y0), (x0, y1), (x1, y1), (x1, y0), (x0, y0)]),
            vec![],
        )
    }
}

fn cell_count(extent: f64, size: f64) -> i64 {
    ((extent / size) - CELL_COUNT_EPSILON).ceil().max(1.0) as i64
}

fn crs_range(min: f64, max: f64, size: f64) -> (i64, i64) {
    let first = (min / size + CELL_COUNT_EPSILON).floor() as i64;
    let last = ((max / size) - CELL_COUNT_EPSILON).ceil() as i64 - 1;
    (first, last.max(first))
}
