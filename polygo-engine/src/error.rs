use std::fmt;

use crate::Vertex;
use crate::territory::OwnershipError;

/// Rejection of a user action. These are expected outcomes, not faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    GameOver,
    InvalidIndex(Vertex),
    Occupied(Vertex),
    Suicide,
    KoViolation,
    /// Dead-stone removal and ownership marking need a finished game.
    NotOver,
    NotAStone(Vertex),
    NothingToMark,
    Unresolved(OwnershipError),
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::GameOver => write!(f, "game is over"),
            MoveError::InvalidIndex(v) => write!(f, "invalid index {v}"),
            MoveError::Occupied(v) => write!(f, "vertex {v} is occupied"),
            MoveError::Suicide => write!(f, "no liberties and captures nothing"),
            MoveError::KoViolation => write!(f, "ko violation: position repeats an earlier board"),
            MoveError::NotOver => write!(f, "game is not over"),
            MoveError::NotAStone(v) => write!(f, "no stone at vertex {v}"),
            MoveError::NothingToMark => write!(f, "no empty cells left to mark"),
            MoveError::Unresolved(e) => write!(f, "ownership unresolved: {e}"),
        }
    }
}

impl std::error::Error for MoveError {}

impl From<OwnershipError> for MoveError {
    fn from(e: OwnershipError) -> Self {
        MoveError::Unresolved(e)
    }
}
