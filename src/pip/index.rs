//! Spatial index over vertex points.

use geo::{BoundingRect, Intersects, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::Vertex;

/// Wrapper for R-tree indexing of vertex points
#[derive(Debug, Clone, Copy)]
pub struct IndexedVertex {
    pub id: u64,
    pub point: Point<f64>,
}

impl RTreeObject for IndexedVertex {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x(), self.point.y()])
    }
}

impl IndexedVertex {
    fn new(vertex: &Vertex) -> Result<Self> {
        let point = vertex.geographic;
        if !point.x().is_finite() || !point.y().is_finite() {
            return Err(PipelineError::SpatialIndexBuild(format!(
                "vertex {} has non-finite coordinate ({}, {})",
                vertex.id,
                point.x(),
                point.y()
            )));
        }
        Ok(Self { id: vertex.id, point })
    }
}

/// Immutable R-tree over vertex geographic points; safe to query from
/// several threads at once
pub struct VertexSpatialIndex {
    tree: RTree<IndexedVertex>,
}

impl VertexSpatialIndex {
    /// Build spatial index from vertices
    pub fn build(vertices: &[Vertex]) -> Result<Self> {
        info!("Building spatial index for {} vertices...", vertices.len());

        let indexed = vertices
            .iter()
            .map(IndexedVertex::new)
            .collect::<Result<Vec<_>>>()?;

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} entries", tree.size());

        Ok(Self { tree })
    }

    /// Vertices inside or on the boundary of `polygon`.
    ///
    /// The R-tree narrows the search to points within the polygon's bounding
    /// box; the exact containment test runs only on those candidates.
    pub fn lookup(&self, polygon: &Polygon<f64>) -> Vec<IndexedVertex> {
        let Some(rect) = polygon.bounding_rect() else {
            return Vec::new();
        };
        let query_envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|iv| polygon.intersects(&iv.point))
            .copied()
            .collect()
    }

    /// Get total number of indexed vertices
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
