//! Input repair and union of the raw border records.

use geo::{Area, BooleanOps, Centroid, LineString, MultiPolygon, Polygon};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::{Center, ValidatedBorder};

/// Repair every record and union the survivors into one multipolygon.
///
/// Records that are empty after repair are dropped; if nothing survives the
/// run fails with [`PipelineError::EmptyInput`].
pub fn validate_and_union(records: &[MultiPolygon<f64>]) -> Result<ValidatedBorder> {
    info!("Validating {} border records...", records.len());

    if records.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let mut repaired = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        match repair_multipolygon(record) {
            Some(mp) => repaired.push(mp),
            None => warn!("Dropping border record {} (empty after repair)", idx),
        }
    }

    let union = repaired
        .into_iter()
        .reduce(|a, b| a.union(&b))
        .filter(|mp| !mp.0.is_empty())
        .ok_or(PipelineError::EmptyInput)?;

    let center = union.centroid().map(|p| Center {
        center_lon: p.x(),
        center_lat: p.y(),
    });

    info!(
        "Border union has {} polygons, area {:.6}",
        union.0.len(),
        union.unsigned_area()
    );

    Ok(ValidatedBorder { union, center })
}

/// Repair each member polygon; `None` when nothing with area remains
pub fn repair_multipolygon(mp: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    let parts: Vec<Polygon<f64>> = mp
        .0
        .iter()
        .filter_map(repair_polygon)
        .flat_map(|repaired| repaired.0)
        .collect();

    if parts.is_empty() {
        return None;
    }

    // Members of one record may overlap each other
    let merged = MultiPolygon::new(parts).union(&MultiPolygon::new(vec![]));
    (merged.unsigned_area() > 0.0).then_some(merged)
}

/// Repair a single polygon.
///
/// Rings with fewer than three distinct positions are removed; a polygon
/// whose exterior is degenerate, or which has no area once repaired, is
/// dropped entirely.
/// Self-intersections are resolved by running the polygon through the
/// boolean-ops engine, which reassembles the rings into valid output.
pub fn repair_polygon(poly: &Polygon<f64>) -> Option<MultiPolygon<f64>> {
    let Some(exterior) = usable_ring(poly.exterior()) else {
        debug!("Dropping polygon with degenerate exterior");
        return None;
    };

    let interiors: Vec<LineString<f64>> = poly
        .interiors()
        .iter()
        .filter_map(usable_ring)
        .collect();

    let candidate = MultiPolygon::new(vec![Polygon::new(exterior, interiors)]);
    let repaired = candidate.union(&MultiPolygon::new(vec![]));

    (repaired.unsigned_area() > 0.0).then_some(repaired)
}

fn usable_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return None;
    }

    let mut coords = ring.0.clone();
    coords.dedup();
    if coords.len() > 1 && coords.first() != coords.last() {
        coords.push(coords[0]);
    }

    // Self-intersecting rings can have zero net area; boolean ops decide those
    let mut distinct = coords.clone();
    distinct.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    distinct.dedup();
    (distinct.len() >= 3).then(|| LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Validation};

    fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
            (x: x, y: y),
        ]
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(
            validate_and_union(&[]),
            Err(PipelineError::EmptyInput)
        ));
    }

    #[test]
    fn test_only_degenerate_input_fails() {
        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 0.0, y: 0.0)];
        let result = validate_and_union(&[MultiPolygon::new(vec![flat])]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn test_degenerate_record_is_dropped() {
        let flat = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 5.0, y: 5.0)];
        let records = vec![
            MultiPolygon::new(vec![flat]),
            MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]),
        ];

        let border = validate_and_union(&records).unwrap();
        assert_eq!(border.union.0.len(), 1);
        assert!((border.union.unsigned_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bowtie_is_repaired() {
        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        assert!(!bowtie.is_valid());

        let border = validate_and_union(&[MultiPolygon::new(vec![bowtie])]).unwrap();
        assert!(border.union.is_valid());
        assert!((border.union.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_net_area_ring_is_repaired_not_dropped() {
        // Lobes of equal size cancel in the signed area
        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        let repaired = repair_polygon(&bowtie).unwrap();
        assert!(repaired.is_valid());
        assert!((repaired.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_ring_is_dropped() {
        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 0.0, y: 0.0)];
        assert!(repair_polygon(&flat).is_none());
    }

    #[test]
    fn test_overlapping_records_are_unioned() {
        let records = vec![
            MultiPolygon::new(vec![square(0.0, 0.0, 2.0)]),
            MultiPolygon::new(vec![square(1.0, 1.0, 2.0)]),
        ];

        let border = validate_and_union(&records).unwrap();
        assert!(border.union.is_valid());
        assert_eq!(border.union.0.len(), 1);
        assert!((border.union.unsigned_area() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_is_centroid_of_union() {
        let records = vec![
            MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]),
            MultiPolygon::new(vec![square(1.0, 0.0, 1.0)]),
        ];

        let center = validate_and_union(&records).unwrap().center.unwrap();
        assert!((center.center_lon - 1.0).abs() < 1e-9);
        assert!((center.center_lat - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_open_ring_is_closed() {
        let open = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0)]),
            vec![],
        );
        let repaired = repair_polygon(&open).unwrap();
        assert!((repaired.unsigned_area() - 9.0).abs() < 1e-9);
    }
}
