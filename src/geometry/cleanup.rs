//! Morphological cleanup of the unioned border.

use geo::algorithm::buffer::{Buffer, BufferStyle, LineCap, LineJoin};
use geo::{Area, MultiPolygon, Polygon};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::params::CleanupOp;

/// PostGIS default miter ratio
const MITER_RATIO: f64 = 5.0;

/// Sharpest corner angle (radians) still mitered rather than bevelled. The
/// buffer engine takes an angle, not a ratio; a ratio `r` maps to `2·asin(1/r)`.
fn miter_min_angle() -> f64 {
    2.0 * (1.0 / MITER_RATIO).asin()
}

/// Clean the border and keep its dominant region.
///
/// The opening (erode by `buffer`, then dilate by `buffer`) removes slivers
/// and protrusions narrower than about `2 * buffer`. The largest connected
/// component by area is returned; every other component is discarded.
pub fn clean_border(border: &MultiPolygon<f64>, buffer: f64, op: CleanupOp) -> Result<Polygon<f64>> {
    if !(buffer.is_finite() && buffer > 0.0) {
        return Err(PipelineError::invalid(
            "cleanup_buffer_deg",
            format!("expected a positive number, got {buffer}"),
        ));
    }

    let cleaned = morph(border, buffer, op);
    debug!(
        "{:?} with buffer {} produced {} components",
        op,
        buffer,
        cleaned.0.len()
    );

    let dominant = largest_component(cleaned).ok_or(PipelineError::DegenerateGeometry { buffer })?;

    info!(
        "Clean border: {} exterior points, {} holes, area {:.6}",
        dominant.exterior().0.len(),
        dominant.interiors().len(),
        dominant.unsigned_area()
    );

    Ok(dominant)
}

/// Apply the opening or closing without selecting a component
pub fn morph(border: &MultiPolygon<f64>, buffer: f64, op: CleanupOp) -> MultiPolygon<f64> {
    let (first, second) = match op {
        CleanupOp::Opening => (-buffer, buffer),
        CleanupOp::Closing => (buffer, -buffer),
    };

    let step = border.buffer_with_style(mitered(first));
    if step.0.is_empty() {
        return step;
    }
    step.buffer_with_style(mitered(second))
}

/// Largest polygon by area; `None` if there is no polygon with area
pub fn largest_component(mp: MultiPolygon<f64>) -> Option<Polygon<f64>> {
    mp.0.into_iter()
        .map(|poly| (poly.unsigned_area(), poly))
        .filter(|(area, _)| *area > 0.0)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, poly)| poly)
}

fn mitered(distance: f64) -> BufferStyle<f64> {
    BufferStyle::new(distance)
        .line_join(LineJoin::Miter(miter_min_angle()))
        .line_cap(LineCap::Butt)
}
