//! Border-level outputs of the cleanup stages.

use geo_types::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Display anchor: centroid of the raw unioned border
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub center_lon: f64,
    pub center_lat: f64,
}

/// Repaired and unioned input, plus its centroid
#[derive(Debug, Clone)]
pub struct ValidatedBorder {
    pub union: MultiPolygon<f64>,
    /// `None` only for a union with no area
    pub center: Option<Center>,
}
