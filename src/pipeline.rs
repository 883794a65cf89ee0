//! Ordered execution of the six stages.

use geo::{MultiPolygon, Polygon};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::Result;
use crate::geometry::{
    build_sectors, clean_border, extract_vertices, tessellate, validate_and_union, Projector, SectorShape,
};
use crate::models::{Center, GridCell, Sector, ValidatedBorder, Vertex};
use crate::params::PipelineParams;
use crate::pip::{intersect_sectors, IntersectionTable};

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Clean,
    Tessellate,
    Vertices,
    Sectors,
    Intersect,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Validate,
            Stage::Clean,
            Stage::Tessellate,
            Stage::Vertices,
            Stage::Sectors,
            Stage::Intersect,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validate => write!(f, "validating border"),
            Stage::Clean => write!(f, "cleaning border"),
            Stage::Tessellate => write!(f, "building grid"),
            Stage::Vertices => write!(f, "extracting vertices"),
            Stage::Sectors => write!(f, "building sectors"),
            Stage::Intersect => write!(f, "intersecting sectors"),
        }
    }
}

/// Every table produced by a complete run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Repaired union of the input records (geographic)
    pub raw_union: MultiPolygon<f64>,
    pub center: Option<Center>,
    /// Dominant cleaned region (geographic)
    pub clean_border: Polygon<f64>,
    /// Retained cells (metric)
    pub grid: Vec<GridCell>,
    pub vertices: Vec<Vertex>,
    pub sectors: Vec<Sector>,
    pub intersections: IntersectionTable,
    pub elapsed: Duration,
}

/// Configured pipeline. Each stage is also callable on its own so callers
/// can stop early and inspect intermediate results.
pub struct Pipeline {
    params: PipelineParams,
    projector: Projector,
}

impl Pipeline {
    pub fn new(params: PipelineParams) -> Result<Self> {
        params.validate()?;
        let projector = Projector::new(params.projection)?;
        Ok(Self { params, projector })
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn validate_border(&self, records: &[MultiPolygon<f64>]) -> Result<ValidatedBorder> {
        validate_and_union(records)
    }

    pub fn clean_border(&self, union: &MultiPolygon<f64>) -> Result<Polygon<f64>> {
        clean_border(union, self.params.cleanup_buffer_deg, self.params.cleanup)
    }

    /// Tessellate a geographic border in the metric plane
    pub fn tessellate(&self, clean_border: &Polygon<f64>) -> Result<Vec<GridCell>> {
        let metric = self.projector.polygon_to_metric(clean_border)?;
        tessellate(&metric, self.params.square_size_m, self.params.grid_anchor)
    }

    pub fn extract_vertices(&self, cells: &[GridCell]) -> Result<Vec<Vertex>> {
        extract_vertices(cells, self.params.vertex_mode, &self.projector)
    }

    pub fn build_sectors(&self, vertices: &[Vertex]) -> Vec<Sector> {
        build_sectors(vertices, &self.sector_shape())
    }

    pub fn intersect(&self, sectors: &[Sector], vertices: &[Vertex]) -> Result<IntersectionTable> {
        intersect_sectors(sectors, vertices)
    }

    pub fn run(&self, records: &[MultiPolygon<f64>]) -> Result<PipelineOutput> {
        self.run_observed(records, |_| {})
    }

    /// Run all stages, calling `on_stage` as each one starts
    pub fn run_observed<F>(&self, records: &[MultiPolygon<f64>], mut on_stage: F) -> Result<PipelineOutput>
    where
        F: FnMut(Stage),
    {
        let start = Instant::now();

        on_stage(Stage::Validate);
        let validated = self.validate_border(records)?;

        on_stage(Stage::Clean);
        let clean_border = self.clean_border(&validated.union)?;

        on_stage(Stage::Tessellate);
        let grid = self.tessellate(&clean_border)?;

        on_stage(Stage::Vertices);
        let vertices = self.extract_vertices(&grid)?;

        on_stage(Stage::Sectors);
        let sectors = self.build_sectors(&vertices);

        on_stage(Stage::Intersect);
        let intersections = self.intersect(&sectors, &vertices)?;

        let elapsed = start.elapsed();
        info!(
            "Pipeline finished in {:.2?}: {} cells, {} vertices, {} sectors, {} edges",
            elapsed,
            grid.len(),
            vertices.len(),
            sectors.len(),
            intersections.len()
        );

        Ok(PipelineOutput {
            raw_union: validated.union,
            center: validated.center,
            clean_border,
            grid,
            vertices,
            sectors,
            intersections,
            elapsed,
        })
    }

    fn sector_shape(&self) -> SectorShape {
        SectorShape {
            radius: self.params.sector_radius_m,
            azimuths: self.params.azimuths_deg.clone(),
            angular_width: self.params.sector_width_deg,
            segments: self.params.arc_segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::params::{ProjectionKind, VertexMode};
    use geo::{polygon, Intersects};

    fn unit_square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 0.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    fn planar_params() -> PipelineParams {
        PipelineParams {
            square_size_m: 1.0,
            sector_radius_m: 150_000.0,
            cleanup_buffer_deg: 1e-6,
            projection: ProjectionKind::Identity,
            ..Default::default()
        }
    }

    #[test]
    fn test_unit_square_end_to_end() {
        let pipeline = Pipeline::new(planar_params()).unwrap();
        let output = pipeline.run(&[unit_square()]).unwrap();

        assert_eq!(output.grid.len(), 1);
        assert_eq!(output.vertices.len(), 4);
        assert_eq!(output.sectors.len(), 12);

        let mut brute = 0;
        for sector in &output.sectors {
            for vertex in &output.vertices {
                if sector.polygon.intersects(&vertex.geographic) {
                    brute += 1;
                }
            }
        }
        assert_eq!(output.intersections.len(), brute);
        assert!(output.intersections.len() >= 12);

        // Same input, same relation
        let again = pipeline.run(&[unit_square()]).unwrap();
        assert_eq!(again.intersections.edges(), output.intersections.edges());
    }

    #[test]
    fn test_stages_are_reported_in_order() {
        let pipeline = Pipeline::new(planar_params()).unwrap();
        let mut seen = Vec::new();
        pipeline.run_observed(&[unit_square()], |stage| seen.push(stage)).unwrap();
        assert_eq!(seen, Stage::all());
    }

    #[test]
    fn test_canonical_vertices_on_shared_grid() {
        let params = PipelineParams {
            square_size_m: 0.5,
            vertex_mode: VertexMode::Canonical { decimals: 9 },
            ..planar_params()
        };
        let output = Pipeline::new(params).unwrap().run(&[unit_square()]).unwrap();

        assert_eq!(output.grid.len(), 4);
        assert_eq!(output.vertices.len(), 9);
        assert_eq!(output.sectors.len(), 27);
    }

    #[test]
    fn test_web_mercator_grid() {
        // ~0.1 degree square near Kyiv, 2 km cells
        let border = MultiPolygon::new(vec![polygon![
            (x: 30.4, y: 50.4),
            (x: 30.5, y: 50.4),
            (x: 30.5, y: 50.5),
            (x: 30.4, y: 50.5),
            (x: 30.4, y: 50.4),
        ]]);
        let pipeline = Pipeline::new(PipelineParams::default()).unwrap();
        let output = pipeline.run(&[border]).unwrap();

        assert!(!output.grid.is_empty());
        assert_eq!(output.vertices.len(), 4 * output.grid.len());
        assert_eq!(output.sectors.len(), 3 * output.vertices.len());
        for vertex in &output.vertices {
            assert!((30.3..30.6).contains(&vertex.geographic.x()));
            assert!((50.3..50.6).contains(&vertex.geographic.y()));
        }
        let center = output.center.unwrap();
        assert!((center.center_lon - 30.45).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = PipelineParams {
            sector_radius_m: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::new(params),
            Err(PipelineError::InvalidParameter { name: "sector_radius_m", .. })
        ));
    }

    #[test]
    fn test_empty_input_fails() {
        let pipeline = Pipeline::new(planar_params()).unwrap();
        assert!(matches!(pipeline.run(&[]), Err(PipelineError::EmptyInput)));
    }
}
