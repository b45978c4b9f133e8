// ============================================
// File: crates/wormhole-core/src/mesh.rs
// ============================================
//! # Mesh Topology Generator
//!
//! ## Creation Reason
//! Produces a small synthetic mesh around a gateway address, for planning
//! and display.
//!
//! ## Layout
//! ```text
//!             node 2 (r=1.0)
//!                  │
//!  node 3 ──── gateway ──── node 1 (r=0.5)
//!   (r=2.0)        │
//!             node 4 (r=4.0)
//! ```
//! Node `k` (k >= 1) sits at radius `RING_RADII[(k-1) % 4]` degrees and
//! angle `2π(k-1)/(n-1)`. Two nodes are linked when their routing distance
//! is below `EDGE_THRESHOLD`. Isolated nodes are valid.
//!
//! ## Last Modified
//! v0.1.0 - Initial mesh generator

use std::f64::consts::PI;

use serde::Serialize;
use tracing::debug;

use crate::address::codec::LONGITUDE_OFFSET;
use crate::address::NetworkAddress;
use crate::error::{CoreError, Result};
use crate::routing::distance;

/// Ring radii in degrees, reused cyclically.
pub const RING_RADII: [f64; 4] = [0.5, 1.0, 2.0, 4.0];

/// Nodes closer than this are connected.
pub const EDGE_THRESHOLD: f64 = 0.05;

/// One node of a generated mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshNode {
    /// Node address
    pub address: NetworkAddress,
    /// Only node 0 is the gateway
    pub is_gateway: bool,
}

/// A generated mesh with summary scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshGraph {
    /// Nodes, gateway first
    pub nodes: Vec<MeshNode>,
    /// Neighbour indices per node
    pub adjacency: Vec<Vec<usize>>,
    /// Undirected edges as `(i, j)` with `i < j`
    pub edges: Vec<(usize, usize)>,
    /// Average degree divided by node count
    pub coverage: f64,
    /// Average degree divided by two
    pub redundancy: f64,
}

impl MeshGraph {
    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The gateway node.
    #[must_use]
    pub fn gateway(&self) -> Option<&MeshNode> {
        self.nodes.iter().find(|n| n.is_gateway)
    }

    /// Returns `true` if `i` and `j` share an edge.
    #[must_use]
    pub fn are_connected(&self, i: usize, j: usize) -> bool {
        self.adjacency.get(i).is_some_and(|n| n.contains(&j))
    }

    /// Degree of node `i` (0 for unknown nodes).
    #[must_use]
    pub fn degree(&self, i: usize) -> usize {
        self.adjacency.get(i).map_or(0, Vec::len)
    }
}

/// Builds a mesh of `node_count` nodes around `center`.
///
/// # Errors
/// `InvalidNodeCount` if `node_count == 0`.
pub fn generate(center: &NetworkAddress, node_count: usize) -> Result<MeshGraph> {
    if node_count == 0 {
        return Err(CoreError::InvalidNodeCount(0));
    }

    let (center_lat, center_lon) = center.coordinates();
    let ring_size = node_count.saturating_sub(1).max(1);

    let mut nodes = Vec::with_capacity(node_count);
    nodes.push(MeshNode {
        address: *center,
        is_gateway: true,
    });

    for k in 0..node_count - 1 {
        let radius = RING_RADII[k % RING_RADII.len()];
        #[allow(clippy::cast_precision_loss)]
        let angle = 2.0 * PI * k as f64 / ring_size as f64;
        let lat = center_lat + radius * angle.sin();
        let lon = wrap_longitude(center_lon + radius * angle.cos());

        nodes.push(MeshNode {
            address: center.with_coordinates(lat, lon)?,
            is_gateway: false,
        });
    }

    let mut adjacency = vec![Vec::new(); node_count];
    let mut edges = Vec::new();
    for i in 0..node_count {
        for j in (i + 1)..node_count {
            if distance(&nodes[i].address, &nodes[j].address) < EDGE_THRESHOLD {
                adjacency[i].push(j);
                adjacency[j].push(i);
                edges.push((i, j));
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let (n, degree_sum) = (node_count as f64, (2 * edges.len()) as f64);
    let average_degree = degree_sum / n;

    debug!(nodes = node_count, edges = edges.len(), "Mesh generated");

    Ok(MeshGraph {
        nodes,
        adjacency,
        edges,
        coverage: average_degree / n,
        redundancy: average_degree / 2.0,
    })
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > LONGITUDE_OFFSET {
        lon - 2.0 * LONGITUDE_OFFSET
    } else if lon < -LONGITUDE_OFFSET {
        lon + 2.0 * LONGITUDE_OFFSET
    } else {
        lon
    }
}

// ============================================
// Tests
// ============================================
