use std::fmt;

use crate::Vertex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An edge names a vertex outside `0..vertex_count`.
    VertexOutOfRange { edge: (Vertex, Vertex), vertex_count: usize },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::VertexOutOfRange { edge, vertex_count } => write!(
                f,
                "edge {}-{} out of range for {vertex_count} vertices",
                edge.0, edge.1
            ),
        }
    }
}

impl std::error::Error for GraphError {}

/// Immutable undirected adjacency over vertices `0..vertex_count`.
///
/// Built once from an edge list; shared between engines behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    adjacency: Vec<Vec<Vertex>>,
    edge_count: usize,
}

impl Graph {
    /// Build the adjacency in O(V + E). Duplicate edges (in either direction)
    /// collapse to one, self-loops are dropped.
    pub fn new(vertex_count: usize, edges: &[(Vertex, Vertex)]) -> Result<Self, GraphError> {
        let mut adjacency: Vec<Vec<Vertex>> = vec![Vec::new(); vertex_count];

        for &(a, b) in edges {
            if a >= vertex_count || b >= vertex_count {
                return Err(GraphError::VertexOutOfRange {
                    edge: (a, b),
                    vertex_count,
                });
            }
            if a == b {
                continue;
            }
            adjacency[a].push(b);
            adjacency[b].push(a);
        }

        let mut edge_count = 0;
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
            edge_count += list.len();
        }

        Ok(Graph {
            adjacency,
            edge_count: edge_count / 2,
        })
    }

    /// The classic rectangular board: vertex `row * cols + col`, 4-connected.
    pub fn grid(cols: usize, rows: usize) -> Self {
        let mut edges = Vec::with_capacity(2 * cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let v = row * cols + col;
                if col + 1 < cols {
                    edges.push((v, v + 1));
                }
                if row + 1 < rows {
                    edges.push((v, v + cols));
                }
            }
        }
        // Every endpoint is < cols * rows by construction.
        match Graph::new(cols * rows, &edges) {
            Ok(g) => g,
            Err(e) => unreachable!("grid edges are in range: {e}"),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, v: Vertex) -> bool {
        v < self.adjacency.len()
    }

    /// Sorted, de-duplicated neighbors of `v`. Panics if `v` is out of range.
    pub fn neighbors(&self, v: Vertex) -> &[Vertex] {
        &self.adjacency[v]
    }

    pub fn degree(&self, v: Vertex) -> usize {
        self.adjacency[v].len()
    }
}
