//! Output tables of a pipeline run, written into one directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use super::geojson::{feature_collection, multipolygon_feature, polygon_feature};
use crate::models::IntersectionEdge;
use crate::params::PipelineParams;
use crate::pipeline::PipelineOutput;

pub const RAW_UNION_FILE: &str = "raw_union.geojson";
pub const CENTER_FILE: &str = "center.json";
pub const CLEAN_BORDER_FILE: &str = "clean_border.geojson";
pub const GRID_FILE: &str = "grid.geojson";
pub const VERTICES_FILE: &str = "grid_vertices.csv";
pub const SECTORS_FILE: &str = "all_sectors.geojson";
pub const INTERSECTIONS_FILE: &str = "sector_intersections_full.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

/// One row of the vertex table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexRow {
    pub id: u64,
    /// Owning cell names joined with `;`
    pub grid_cell_name: String,
    pub x_3857: f64,
    pub y_3857: f64,
    pub lon: f64,
    pub lat: f64,
}

/// One row of the intersection table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionRow {
    pub sector_source_vertex_id: u64,
    pub azimuth: f64,
    pub intersecting_vertex_id: u64,
}

impl From<&IntersectionEdge> for IntersectionRow {
    fn from(edge: &IntersectionEdge) -> Self {
        Self {
            sector_source_vertex_id: edge.source_vertex_id,
            azimuth: edge.azimuth,
            intersecting_vertex_id: edge.target_vertex_id,
        }
    }
}

/// Summary written next to the tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub params: PipelineParams,
    pub border_polygons: usize,
    pub grid_cells: usize,
    pub vertices: usize,
    pub sectors: usize,
    pub intersections: usize,
}

/// Write every table of `output` into `dir`, creating it if needed
pub fn write_tables(output: &PipelineOutput, params: &PipelineParams, dir: &Path) -> Result<Manifest> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    info!("Writing tables to {}", dir.display());

    write_json(
        &dir.join(RAW_UNION_FILE),
        &feature_collection(vec![multipolygon_feature(&output.raw_union, Map::new())]),
    )?;
    write_json(&dir.join(CENTER_FILE), &json!(output.center))?;
    write_json(
        &dir.join(CLEAN_BORDER_FILE),
        &feature_collection(vec![polygon_feature(&output.clean_border, Map::new())]),
    )?;

    let grid: Vec<Value> = output
        .grid
        .iter()
        .map(|cell| {
            polygon_feature(
                &cell.polygon,
                properties(json!({ "i": cell.id.i, "j": cell.id.j, "name": cell.name() })),
            )
        })
        .collect();
    write_json(&dir.join(GRID_FILE), &feature_collection(grid))?;

    let sectors: Vec<Value> = output
        .sectors
        .iter()
        .map(|sector| {
            polygon_feature(
                &sector.polygon,
                properties(json!({ "vertex_id": sector.vertex_id, "azimuth": sector.azimuth })),
            )
        })
        .collect();
    write_json(&dir.join(SECTORS_FILE), &feature_collection(sectors))?;

    write_csv(
        &dir.join(VERTICES_FILE),
        output.vertices.iter().map(|v| VertexRow {
            id: v.id,
            grid_cell_name: v.cells.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(";"),
            x_3857: v.projected.x(),
            y_3857: v.projected.y(),
            lon: v.geographic.x(),
            lat: v.geographic.y(),
        }),
    )?;
    write_csv(
        &dir.join(INTERSECTIONS_FILE),
        output.intersections.edges().iter().map(IntersectionRow::from),
    )?;

    let manifest = Manifest {
        generated_at: Utc::now(),
        elapsed_secs: output.elapsed.as_secs_f64(),
        params: params.clone(),
        border_polygons: output.raw_union.0.len(),
        grid_cells: output.grid.len(),
        vertices: output.vertices.len(),
        sectors: output.sectors.len(),
        intersections: output.intersections.len(),
    };
    write_json(&dir.join(MANIFEST_FILE), &manifest)?;

    info!(
        "Wrote {} cells, {} vertices, {} sectors, {} intersections",
        manifest.grid_cells, manifest.vertices, manifest.sectors, manifest.intersections
    );

    Ok(manifest)
}

fn properties(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn write_csv<R: Serialize>(path: &Path, rows: impl Iterator<Item = R>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_border_records;
    use crate::params::ProjectionKind;
    use crate::pipeline::Pipeline;
    use geo::{polygon, MultiPolygon, Winding};

    #[test]
    fn test_tables_written() {
        let params = PipelineParams {
            square_size_m: 1.0,
            sector_radius_m: 150_000.0,
            cleanup_buffer_deg: 1e-6,
            projection: ProjectionKind::Identity,
            ..Default::default()
        };
        let border = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 0.0),
        ]]);
        let output = Pipeline::new(params.clone()).unwrap().run(&[border]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let manifest = write_tables(&output, &params, dir.path()).unwrap();
        assert_eq!(manifest.vertices, 4);
        assert_eq!(manifest.sectors, 12);

        let mut reader = csv::Reader::from_path(dir.path().join(VERTICES_FILE)).unwrap();
        let rows: Vec<VertexRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].grid_cell_name, "0_0");

        let mut reader = csv::Reader::from_path(dir.path().join(INTERSECTIONS_FILE)).unwrap();
        let edges: Vec<IntersectionRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(edges.len(), output.intersections.len());

        let sectors = read_border_records(&fs::read(dir.path().join(SECTORS_FILE)).unwrap()).unwrap();
        assert_eq!(sectors.len(), 12);
        assert!(sectors.iter().all(|mp| mp.0[0].exterior().is_ccw()));

        let manifest_back: Manifest =
            serde_json::from_slice(&fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest_back.intersections, output.intersections.len());
        assert_eq!(manifest_back.params, params);
    }
}
