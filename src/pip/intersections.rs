//! Sector x vertex spatial join.

use hashbrown::HashMap;
use rayon::prelude::*;
use std::ops::Range;
use tracing::{debug, info};

use super::VertexSpatialIndex;
use crate::error::Result;
use crate::models::{IntersectionEdge, Sector, Vertex};

/// Directional adjacency relation, sorted by (source, azimuth, target) and
/// indexed by source vertex id
#[derive(Debug, Clone, Default)]
pub struct IntersectionTable {
    edges: Vec<IntersectionEdge>,
    by_source: HashMap<u64, Range<usize>>,
}

impl IntersectionTable {
    pub fn new(mut edges: Vec<IntersectionEdge>) -> Self {
        edges.sort_by(|a, b| a.cmp_key(b));

        let mut by_source: HashMap<u64, Range<usize>> = HashMap::new();
        for (idx, edge) in edges.iter().enumerate() {
            by_source
                .entry(edge.source_vertex_id)
                .and_modify(|range| range.end = idx + 1)
                .or_insert(idx..idx + 1);
        }

        Self { edges, by_source }
    }

    pub fn edges(&self) -> &[IntersectionEdge] {
        &self.edges
    }

    /// All edges cast by one vertex, every azimuth
    pub fn from_source(&self, source_vertex_id: u64) -> &[IntersectionEdge] {
        self.by_source
            .get(&source_vertex_id)
            .map(|range| &self.edges[range.clone()])
            .unwrap_or(&[])
    }

    /// Edges cast by one vertex towards one azimuth
    pub fn from_source_at(&self, source_vertex_id: u64, azimuth: f64) -> impl Iterator<Item = &IntersectionEdge> {
        self.from_source(source_vertex_id)
            .iter()
            .filter(move |edge| edge.azimuth == azimuth)
    }

    /// Number of distinct source vertices with at least one edge
    pub fn source_count(&self) -> usize {
        self.by_source.len()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn into_edges(self) -> Vec<IntersectionEdge> {
        self.edges
    }
}

/// Join every sector against every vertex point.
///
/// A vertex produces an edge for each sector containing it, boundary
/// included; the owning vertex sits on its own sector's boundary, so
/// self-edges are part of the result.
pub fn intersect_sectors(sectors: &[Sector], vertices: &[Vertex]) -> Result<IntersectionTable> {
    if sectors.is_empty() || vertices.is_empty() {
        info!("No sectors or vertices; intersection table is empty");
        return Ok(IntersectionTable::default());
    }

    let index = VertexSpatialIndex::build(vertices)?;

    let edges: Vec<IntersectionEdge> = sectors
        .par_iter()
        .flat_map_iter(|sector| {
            index.lookup(&sector.polygon).into_iter().map(move |hit| IntersectionEdge {
                source_vertex_id: sector.vertex_id,
                azimuth: sector.azimuth,
                target_vertex_id: hit.id,
            })
        })
        .collect();

    let table = IntersectionTable::new(edges);
    debug!(
        "{} of {} vertices cast at least one edge",
        table.source_count(),
        vertices.len()
    );
    info!(
        "Found {} sector/vertex intersections across {} sectors",
        table.len(),
        sectors.len()
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::sector_polygon;
    use geo::{Intersects, Point};
    use std::collections::BTreeSet;

    fn lattice(n: u64, step: f64) -> Vec<Vertex> {
        (0..n * n)
            .map(|k| {
                let p = Point::new(24.0 + (k % n) as f64 * step, 48.0 + (k / n) as f64 * step);
                Vertex {
                    id: k + 1,
                    cells: vec![],
                    projected: p,
                    geographic: p,
                }
            })
            .collect()
    }

    fn sectors_for(vertices: &[Vertex], radius: f64) -> Vec<Sector> {
        vertices
            .iter()
            .flat_map(|v| {
                [0.0, 120.0, 240.0].map(|azimuth| Sector {
                    vertex_id: v.id,
                    azimuth,
                    polygon: sector_polygon(v.geographic, radius, azimuth, 60.0),
                })
            })
            .collect()
    }

    fn keys(edges: &[IntersectionEdge]) -> BTreeSet<(u64, u64, u64)> {
        edges
            .iter()
            .map(|e| (e.source_vertex_id, e.azimuth.to_bits(), e.target_vertex_id))
            .collect()
    }

    #[test]
    fn test_matches_brute_force() {
        let vertices = lattice(6, 0.02);
        let sectors = sectors_for(&vertices, 5000.0);

        let table = intersect_sectors(&sectors, &vertices).unwrap();

        let mut brute = Vec::new();
        for sector in &sectors {
            for vertex in &vertices {
                if sector.polygon.intersects(&vertex.geographic) {
                    brute.push(IntersectionEdge {
                        source_vertex_id: sector.vertex_id,
                        azimuth: sector.azimuth,
                        target_vertex_id: vertex.id,
                    });
                }
            }
        }

        assert_eq!(table.len(), brute.len());
        assert_eq!(keys(table.edges()), keys(&brute));
        // More than the self-edges alone
        assert!(table.len() > sectors.len());
    }

    #[test]
    fn test_self_edges_are_kept() {
        let vertices = lattice(3, 0.05);
        let sectors = sectors_for(&vertices, 1000.0);

        let table = intersect_sectors(&sectors, &vertices).unwrap();
        for sector in &sectors {
            assert!(table
                .from_source_at(sector.vertex_id, sector.azimuth)
                .any(|e| e.is_self_edge()));
        }
    }

    #[test]
    fn test_indexed_by_source() {
        let vertices = lattice(4, 0.02);
        let sectors = sectors_for(&vertices, 5000.0);
        let table = intersect_sectors(&sectors, &vertices).unwrap();

        let mut total = 0;
        for vertex in &vertices {
            let edges = table.from_source(vertex.id);
            assert!(edges.iter().all(|e| e.source_vertex_id == vertex.id));
            total += edges.len();
        }
        assert_eq!(total, table.len());
        assert!(table.from_source(999).is_empty());

        let sorted = table.edges().windows(2).all(|w| w[0].cmp_key(&w[1]).is_le());
        assert!(sorted);
    }

    #[test]
    fn test_empty_inputs_give_empty_table() {
        let vertices = lattice(2, 0.01);
        let sectors = sectors_for(&vertices, 1000.0);

        assert!(intersect_sectors(&[], &vertices).unwrap().is_empty());
        assert!(intersect_sectors(&sectors, &[]).unwrap().is_empty());
    }
}
