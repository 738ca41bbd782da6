use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::Color;

/// Post-game owner of an empty region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Black,
    White,
    Neutral,
}

impl From<Color> for Owner {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Owner::Black,
            Color::White => Owner::White,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Black => write!(f, "black"),
            Owner::White => write!(f, "white"),
            Owner::Neutral => write!(f, "neutral"),
        }
    }
}

/// State of a single vertex. `Territory` only appears once the game is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "of", rename_all = "snake_case")]
pub enum CellState {
    #[default]
    Empty,
    Stone(Color),
    Territory(Owner),
}

impl CellState {
    pub fn is_empty(self) -> bool {
        self == CellState::Empty
    }

    pub fn stone(self) -> Option<Color> {
        match self {
            CellState::Stone(c) => Some(c),
            _ => None,
        }
    }

    pub fn territory(self) -> Option<Owner> {
        match self {
            CellState::Territory(o) => Some(o),
            _ => None,
        }
    }

    /// Stable byte used for board hashing.
    pub(crate) fn code(self) -> u8 {
        match self {
            CellState::Empty => 0,
            CellState::Stone(Color::Black) => 1,
            CellState::Stone(Color::White) => 2,
            CellState::Territory(Owner::Black) => 3,
            CellState::Territory(Owner::White) => 4,
            CellState::Territory(Owner::Neutral) => 5,
        }
    }
}
