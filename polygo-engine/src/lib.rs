pub mod board;
pub mod cell;
pub mod color;
pub mod engine;
pub mod error;
pub mod graph;
pub mod hash;
pub mod history;
pub mod territory;
pub mod turn;

/// Index of a vertex in `0..Graph::vertex_count()`.
pub type Vertex = usize;

pub use board::Board;
pub use cell::{CellState, Owner};
pub use color::Color;
pub use engine::{Engine, GameState, Phase, Score, StateError};
pub use error::MoveError;
pub use graph::{Graph, GraphError};
pub use hash::BoardHash;
pub use history::{Action, HistoryLog, MoveRecord, TurnStatus};
pub use territory::{Ownership, OwnershipError, determine_ownership};
pub use turn::{MoveKind, Turn};
