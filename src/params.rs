//! Tunable parameters for a pipeline run.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Arc resolution used by `sector_polygon`
pub const DEFAULT_ARC_SEGMENTS: usize = 16;

/// Sector opening angle in degrees
pub const DEFAULT_SECTOR_WIDTH_DEG: f64 = 60.0;

/// Sector central directions, degrees clockwise from north
pub const DEFAULT_AZIMUTHS_DEG: [f64; 3] = [0.0, 120.0, 240.0];

/// Morphological operation applied to the unioned border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupOp {
    /// Erode then dilate: removes slivers and protrusions narrower than 2δ
    #[default]
    Opening,
    /// Dilate then erode: fills gaps and inlets narrower than 2δ
    Closing,
}

/// Where the square lattice is anchored in the metric plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridAnchor {
    /// Cell (0, 0) starts at the bounding box minimum corner
    #[default]
    BoundsOrigin,
    /// Cell (i, j) spans `[i*S, (i+1)*S] x [j*S, (j+1)*S]` in CRS coordinates
    CrsOrigin,
}

/// How corner points shared by neighbouring cells are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum VertexMode {
    /// One vertex per (cell, corner); shared corners get several ids
    #[default]
    PerCell,
    /// Merge corners whose projected coordinates agree to `decimals` places
    Canonical { decimals: u32 },
}

/// Metric plane the grid is laid out in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// EPSG:4326 degrees <-> EPSG:3857 meters
    #[default]
    WebMercator,
    /// Input is already planar; geographic and projected coordinates coincide
    Identity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Grid square side length S, meters
    pub square_size_m: f64,
    /// Sector radius R, geodesic meters
    pub sector_radius_m: f64,
    /// Cleanup buffer δ, in border CRS units (degrees)
    pub cleanup_buffer_deg: f64,
    pub azimuths_deg: Vec<f64>,
    pub sector_width_deg: f64,
    pub arc_segments: usize,
    pub cleanup: CleanupOp,
    pub grid_anchor: GridAnchor,
    pub vertex_mode: VertexMode,
    pub projection: ProjectionKind,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            square_size_m: 2000.0,
            sector_radius_m: 5000.0,
            cleanup_buffer_deg: 0.001,
            azimuths_deg: DEFAULT_AZIMUTHS_DEG.to_vec(),
            sector_width_deg: DEFAULT_SECTOR_WIDTH_DEG,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            cleanup: CleanupOp::default(),
            grid_anchor: GridAnchor::default(),
            vertex_mode: VertexMode::default(),
            projection: ProjectionKind::default(),
        }
    }
}

impl PipelineParams {
    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<()> {
        positive("square_size_m", self.square_size_m)?;
        positive("sector_radius_m", self.sector_radius_m)?;
        positive("cleanup_buffer_deg", self.cleanup_buffer_deg)?;
        positive("sector_width_deg", self.sector_width_deg)?;

        if self.sector_width_deg > 360.0 {
            return Err(PipelineError::invalid(
                "sector_width_deg",
                format!("{} exceeds a full turn", self.sector_width_deg),
            ));
        }
        if self.arc_segments == 0 {
            return Err(PipelineError::invalid("arc_segments", "must be at least 1"));
        }
        if self.azimuths_deg.is_empty() {
            return Err(PipelineError::invalid("azimuths_deg", "no azimuths given"));
        }
        if let Some(bad) = self.azimuths_deg.iter().find(|a| !a.is_finite()) {
            return Err(PipelineError::invalid(
                "azimuths_deg",
                format!("non-finite azimuth {bad}"),
            ));
        }
        if let VertexMode::Canonical { decimals } = self.vertex_mode {
            // 10^15 is about where f64 stops resolving the fractional part of meter values
            if decimals > 15 {
                return Err(PipelineError::invalid(
                    "vertex_mode.decimals",
                    format!("{decimals} decimals is beyond f64 precision"),
                ));
            }
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PipelineError::invalid(
            name,
            format!("expected a positive number, got {value}"),
        ))
    }
}
