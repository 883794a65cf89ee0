//! Error kinds surfaced by the pipeline stages.

use thiserror::Error;

/// Fatal pipeline failure. No stage retries internally; the failing stage
/// produces no output while earlier stage results stay valid.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No usable geometry was supplied (or every record was dropped by repair)
    #[error("no usable polygon geometry in input")]
    EmptyInput,

    /// Border cleanup collapsed the region to nothing
    #[error("border cleanup with buffer {buffer} left no polygon")]
    DegenerateGeometry { buffer: f64 },

    /// A configuration value is out of range
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Coordinates that cannot be placed in the R-tree
    #[error("cannot build spatial index: {0}")]
    SpatialIndexBuild(String),

    /// CRS transform failure
    #[error("projection failed: {0}")]
    Projection(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
