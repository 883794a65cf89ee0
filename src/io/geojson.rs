//! GeoJSON reading of border records and writing of polygon tables.

use anyhow::{anyhow, bail, Context, Result};
use geo::orient::{Direction, Orient};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Read every Polygon / MultiPolygon in a GeoJSON document.
///
/// Accepts a FeatureCollection, a single Feature or a bare geometry.
/// Features with other geometry types are skipped.
pub fn read_border_records(bytes: &[u8]) -> Result<Vec<MultiPolygon<f64>>> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON")?;

    let mut records = Vec::new();
    match value["type"].as_str() {
        Some("FeatureCollection") => {
            let features = value["features"]
                .as_array()
                .ok_or_else(|| anyhow!("FeatureCollection without a features array"))?;
            for (idx, feature) in features.iter().enumerate() {
                match parse_geometry(&feature["geometry"]) {
                    Ok(Some(mp)) => records.push(mp),
                    Ok(None) => debug!("Skipping feature {} (not a polygon)", idx),
                    Err(e) => warn!("Skipping feature {}: {:#}", idx, e),
                }
            }
        }
        Some("Feature") => records.extend(parse_geometry(&value["geometry"])?),
        Some(_) => records.extend(parse_geometry(&value)?),
        None => bail!("GeoJSON document has no type"),
    }

    Ok(records)
}

fn parse_geometry(geometry: &Value) -> Result<Option<MultiPolygon<f64>>> {
    let coords = &geometry["coordinates"];
    match geometry["type"].as_str() {
        Some("Polygon") => {
            let polygon = parse_polygon(coords)?;
            Ok(Some(MultiPolygon::new(vec![polygon])))
        }
        Some("MultiPolygon") => {
            let polygons = coords
                .as_array()
                .ok_or_else(|| anyhow!("MultiPolygon coordinates must be an array"))?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(MultiPolygon::new(polygons)))
        }
        _ => Ok(None),
    }
}

/// `[exterior, hole, hole, ...]`
fn parse_polygon(rings: &Value) -> Result<Polygon<f64>> {
    let rings = rings
        .as_array()
        .ok_or_else(|| anyhow!("Polygon coordinates must be an array of rings"))?;
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| anyhow!("Polygon has no exterior ring"))?;

    let exterior = parse_ring(exterior)?;
    let interiors = interiors.iter().map(parse_ring).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| anyhow!("Ring must be an array of positions"))?;

    let coords = positions
        .iter()
        .map(|pos| {
            let x = pos[0].as_f64().ok_or_else(|| anyhow!("Invalid x coordinate: {pos}"))?;
            let y = pos[1].as_f64().ok_or_else(|| anyhow!("Invalid y coordinate: {pos}"))?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LineString::new(coords))
}

/// GeoJSON `coordinates` value of a polygon
/// Coordinate rings with the RFC 7946 winding: exterior counter-clockwise,
/// holes clockwise
pub fn polygon_coordinates(polygon: &Polygon<f64>) -> Value {
    let polygon = polygon.orient(Direction::Default);
    let ring = |ls: &LineString<f64>| -> Vec<[f64; 2]> { ls.coords().map(|c| [c.x, c.y]).collect() };

    let mut rings = vec![ring(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring));
    json!(rings)
}

pub fn polygon_feature(polygon: &Polygon<f64>, properties: Map<String, Value>) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": polygon_coordinates(polygon),
        },
        "properties": properties,
    })
}

pub fn multipolygon_feature(mp: &MultiPolygon<f64>, properties: Map<String, Value>) -> Value {
    let coordinates: Vec<Value> = mp.0.iter().map(polygon_coordinates).collect();
    json!({
        "type": "Feature",
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": coordinates,
        },
        "properties": properties,
    })
}

pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
