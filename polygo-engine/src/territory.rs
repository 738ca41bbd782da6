use std::fmt;

use serde::Serialize;

use crate::Vertex;
use crate::board::Board;
use crate::cell::{CellState, Owner};
use crate::color::Color;
use crate::graph::Graph;

/// An empty region that cannot be attributed to either color yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OwnershipError {
    /// The region touches no stones at all (e.g. an empty board).
    Unbordered { region: Vec<Vertex> },
    /// The region touches a cell that is neither a stone nor part of itself.
    Unresolved { region: Vec<Vertex>, at: Vertex },
}

impl fmt::Display for OwnershipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnershipError::Unbordered { region } => write!(
                f,
                "board not fully resolved: region of {} empty cells borders no stones",
                region.len()
            ),
            OwnershipError::Unresolved { at, .. } => write!(
                f,
                "board not fully resolved: region borders unresolved vertex {at}"
            ),
        }
    }
}

impl std::error::Error for OwnershipError {}

/// Per-vertex ownership of the current board.
///
/// `owners[v]` is the computed owner of an `Empty` vertex, the marked owner
/// of a `Territory` vertex, and `None` for stones and for regions that could
/// not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ownership {
    pub owners: Vec<Option<Owner>>,
    pub error: Option<OwnershipError>,
}

impl Ownership {
    pub fn is_resolved(&self) -> bool {
        self.error.is_none()
    }
}

/// Classify every maximal empty region by the colors of the stones around it.
///
/// Only Black neighbors: Black. Only White: White. Both: Neutral (dame).
/// A region with no neighbors or a non-stone neighbor is reported as an
/// error; the first such region found is the one reported, the rest of the
/// board is still classified.
pub fn determine_ownership(board: &Board, graph: &Graph) -> Ownership {
    let size = board.len();
    let mut owners: Vec<Option<Owner>> = board.cells().iter().map(|c| c.territory()).collect();
    let mut visited = vec![false; size];
    let mut error = None;

    for start in 0..size {
        if visited[start] || !board.cells()[start].is_empty() {
            continue;
        }

        let mut region = Vec::new();
        let mut border_colors: u8 = 0; // bit 0 = Black seen, bit 1 = White seen
        let mut foreign: Option<Vertex> = None;
        let mut stack = vec![start];

        while let Some(p) = stack.pop() {
            if visited[p] {
                continue;
            }
            visited[p] = true;
            region.push(p);

            for &n in graph.neighbors(p) {
                match board.cells()[n] {
                    CellState::Empty => {
                        if !visited[n] {
                            stack.push(n);
                        }
                    }
                    CellState::Stone(Color::Black) => border_colors |= 1,
                    CellState::Stone(Color::White) => border_colors |= 2,
                    CellState::Territory(_) => {
                        foreign.get_or_insert(n);
                    }
                }
            }
        }

        let owner = match (border_colors, foreign) {
            (_, Some(at)) => {
                error.get_or_insert(OwnershipError::Unresolved {
                    region: region.clone(),
                    at,
                });
                None
            }
            (0, None) => {
                error.get_or_insert(OwnershipError::Unbordered {
                    region: region.clone(),
                });
                None
            }
            (1, None) => Some(Owner::Black),
            (2, None) => Some(Owner::White),
            _ => Some(Owner::Neutral),
        };

        for &v in &region {
            owners[v] = owner;
        }
    }

    Ownership { owners, error }
}
