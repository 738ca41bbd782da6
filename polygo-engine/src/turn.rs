use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Vertex;
use crate::color::Color;
use crate::hash::BoardHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Play,
    Pass,
    RemoveGroup,
    MarkOwnership,
}

impl std::str::FromStr for MoveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(MoveKind::Play),
            "pass" => Ok(MoveKind::Pass),
            "remove_group" => Ok(MoveKind::RemoveGroup),
            "mark_ownership" => Ok(MoveKind::MarkOwnership),
            _ => Err(format!("invalid move kind: {s}")),
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveKind::Play => write!(f, "play"),
            MoveKind::Pass => write!(f, "pass"),
            MoveKind::RemoveGroup => write!(f, "remove_group"),
            MoveKind::MarkOwnership => write!(f, "mark_ownership"),
        }
    }
}

/// Wire form of one history entry. Board snapshots are not carried; they are
/// rebuilt by replaying entries in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub kind: MoveKind,
    pub vertex: Option<Vertex>,
    pub color: Option<Color>,
    /// Stones this entry took off the board: captures for a play, the dead
    /// group for a removal.
    #[serde(default)]
    pub captured: Vec<Vertex>,
    pub hash: BoardHash,
}

impl Turn {
    pub fn is_play(&self) -> bool {
        self.kind == MoveKind::Play
    }

    pub fn is_pass(&self) -> bool {
        self.kind == MoveKind::Pass
    }
}
