//! Geodesic circular-sector polygons.

use geo::{Destination, Geodesic, LineString, Point, Polygon};
use rayon::prelude::*;
use tracing::info;

use crate::models::{Sector, Vertex};
use crate::params::DEFAULT_ARC_SEGMENTS;

/// Circular sector of `radius` meters centred on `center` (lon/lat degrees),
/// opening `angular_width` degrees around the `azimuth_center` bearing.
///
/// The ring runs center -> arc -> center with 16 arc segments. Arc points are
/// geodesic destinations on the WGS84 ellipsoid, so each lies exactly
/// `radius` meters from the center.
pub fn sector_polygon(center: Point<f64>, radius: f64, azimuth_center: f64, angular_width: f64) -> Polygon<f64> {
    sector_polygon_with_segments(center, radius, azimuth_center, angular_width, DEFAULT_ARC_SEGMENTS)
}

/// [`sector_polygon`] with an explicit arc resolution (`segments + 1` arc points)
pub fn sector_polygon_with_segments(
    center: Point<f64>,
    radius: f64,
    azimuth_center: f64,
    angular_width: f64,
    segments: usize,
) -> Polygon<f64> {
    let segments = segments.max(1);
    let start = azimuth_center - angular_width / 2.0;
    let step = angular_width / segments as f64;

    let mut ring = Vec::with_capacity(segments + 3);
    ring.push(center.0);
    ring.extend((0..=segments).map(|k| {
        let bearing = start + step * k as f64;
        Geodesic.destination(center, bearing, radius).0
    }));
    ring.push(center.0);

    Polygon::new(LineString::new(ring), vec![])
}

/// Sector geometry settings shared by every vertex
#[derive(Debug, Clone)]
pub struct SectorShape {
    pub radius: f64,
    pub azimuths: Vec<f64>,
    pub angular_width: f64,
    pub segments: usize,
}

/// One sector per (vertex, azimuth), ordered by vertex then azimuth list order
pub fn build_sectors(vertices: &[Vertex], shape: &SectorShape) -> Vec<Sector> {
    let sectors: Vec<Sector> = vertices
        .par_iter()
        .flat_map_iter(|vertex| {
            shape.azimuths.iter().map(move |&azimuth| Sector {
                vertex_id: vertex.id,
                azimuth,
                polygon: sector_polygon_with_segments(
                    vertex.geographic,
                    shape.radius,
                    azimuth,
                    shape.angular_width,
                    shape.segments,
                ),
            })
        })
        .collect();

    info!(
        "Built {} sectors ({} vertices x {} azimuths, radius {} m)",
        sectors.len(),
        vertices.len(),
        shape.azimuths.len(),
        shape.radius
    );

    sectors
}
