//! Transforms between the geographic CRS and the metric grid plane.

use geo::{Coord, MapCoords, Point, Polygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::error::{PipelineError, Result};
use crate::params::ProjectionKind;

/// EPSG:4326
const GEOGRAPHIC_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// EPSG:3857 (spherical Web Mercator)
const WEB_MERCATOR_PROJ4: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs";

/// Forward/inverse projection used by the grid stages
pub struct Projector {
    /// `(geographic, metric)`; `None` for the identity projection
    crs: Option<(Proj4, Proj4)>,
}

impl Projector {
    pub fn new(kind: ProjectionKind) -> Result<Self> {
        let crs = match kind {
            ProjectionKind::Identity => None,
            ProjectionKind::WebMercator => Some((build(GEOGRAPHIC_PROJ4)?, build(WEB_MERCATOR_PROJ4)?)),
        };
        Ok(Self { crs })
    }

    pub fn identity() -> Self {
        Self { crs: None }
    }

    /// lon/lat degrees -> metric plane
    pub fn to_metric(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let Some((geographic, metric)) = &self.crs else {
            return Ok(coord);
        };

        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(geographic, metric, &mut point)
            .map_err(|e| PipelineError::Projection(format!("({}, {}) to metric: {e:?}", coord.x, coord.y)))?;
        Ok(Coord { x: point.0, y: point.1 })
    }

    /// metric plane -> lon/lat degrees
    pub fn to_geographic(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let Some((geographic, metric)) = &self.crs else {
            return Ok(coord);
        };

        let mut point = (coord.x, coord.y, 0.0);
        transform(metric, geographic, &mut point)
            .map_err(|e| PipelineError::Projection(format!("({}, {}) to geographic: {e:?}", coord.x, coord.y)))?;
        Ok(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }

    pub fn point_to_geographic(&self, point: Point<f64>) -> Result<Point<f64>> {
        self.to_geographic(point.0).map(Point::from)
    }

    pub fn polygon_to_metric(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        polygon.try_map_coords(|coord| self.to_metric(coord))
    }
}

fn build(proj_string: &str) -> Result<Proj4> {
    Proj4::from_proj_string(proj_string)
        .map_err(|e| PipelineError::Projection(format!("failed to build PROJ.4 `{proj_string}`: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_origin() {
        let proj = Projector::new(ProjectionKind::WebMercator).unwrap();
        let metric = proj.to_metric(Coord { x: 0.0, y: 0.0 }).unwrap();
        assert!(metric.x.abs() < 1e-6);
        assert!(metric.y.abs() < 1e-6);
    }

    #[test]
    fn test_antimeridian_is_half_circumference() {
        let proj = Projector::new(ProjectionKind::WebMercator).unwrap();
        let metric = proj.to_metric(Coord { x: 180.0, y: 0.0 }).unwrap();
        assert!((metric.x - 20_037_508.342_789_244).abs() < 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let proj = Projector::new(ProjectionKind::WebMercator).unwrap();
        let kyiv = Coord { x: 30.5234, y: 50.4501 };

        let back = proj.to_geographic(proj.to_metric(kyiv).unwrap()).unwrap();
        assert!((back.x - kyiv.x).abs() < 1e-9);
        assert!((back.y - kyiv.y).abs() < 1e-9);
    }

    #[test]
    fn test_identity_passes_through() {
        let proj = Projector::identity();
        let c = Coord { x: 3.0, y: -4.0 };
        assert_eq!(proj.to_metric(c).unwrap(), c);
        assert_eq!(proj.to_geographic(c).unwrap(), c);
    }
}
