use crate::Vertex;
use crate::board::Board;
use crate::color::Color;
use crate::hash::BoardHash;
use crate::turn::{MoveKind, Turn};

/// What a history entry did to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Placement {
        vertex: Vertex,
        color: Color,
        captured: Vec<Vertex>,
    },
    Pass {
        color: Color,
    },
    /// Post-game removal of a dead group, tagged with the group's own color.
    GroupRemoval {
        vertex: Vertex,
        vertices: Vec<Vertex>,
        color: Color,
    },
    OwnershipMark,
}

impl Action {
    pub fn kind(&self) -> MoveKind {
        match self {
            Action::Placement { .. } => MoveKind::Play,
            Action::Pass { .. } => MoveKind::Pass,
            Action::GroupRemoval { .. } => MoveKind::RemoveGroup,
            Action::OwnershipMark => MoveKind::MarkOwnership,
        }
    }
}

/// Turn-level state that moves with the history cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnStatus {
    pub current_player: Color,
    pub consecutive_passes: u32,
    pub game_over: bool,
    pub last_placed: Option<Vertex>,
}

impl TurnStatus {
    pub const INITIAL: TurnStatus = TurnStatus {
        current_player: Color::Black,
        consecutive_passes: 0,
        game_over: false,
        last_placed: None,
    };
}

impl Default for TurnStatus {
    fn default() -> Self {
        TurnStatus::INITIAL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub action: Action,
    pub before: Board,
    pub after: Board,
    pub hash: BoardHash,
    /// Status in effect once this entry is applied.
    pub status: TurnStatus,
}

impl MoveRecord {
    pub fn to_turn(&self) -> Turn {
        let (vertex, color, captured) = match &self.action {
            Action::Placement {
                vertex,
                color,
                captured,
            } => (Some(*vertex), Some(*color), captured.clone()),
            Action::Pass { color } => (None, Some(*color), Vec::new()),
            Action::GroupRemoval {
                vertex,
                vertices,
                color,
            } => (Some(*vertex), Some(*color), vertices.clone()),
            Action::OwnershipMark => (None, None, Vec::new()),
        };
        Turn {
            kind: self.action.kind(),
            vertex,
            color,
            captured,
            hash: self.hash,
        }
    }
}

/// Linear undo stack with a single cursor.
///
/// `cursor` is the index of the last applied entry, `None` before the first.
/// Appending after an undo discards the entries past the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<MoveRecord>,
    cursor: Option<usize>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(entries: Vec<MoveRecord>, cursor: Option<usize>) -> Self {
        HistoryLog { entries, cursor }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of applied entries.
    pub fn applied_len(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    pub fn entries(&self) -> &[MoveRecord] {
        &self.entries
    }

    /// Entries up to and including the cursor.
    pub fn applied(&self) -> &[MoveRecord] {
        &self.entries[..self.applied_len()]
    }

    pub fn current(&self) -> Option<&MoveRecord> {
        self.cursor.map(|c| &self.entries[c])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.applied_len() < self.entries.len()
    }

    /// Whether `hash` was recorded by any applied entry.
    pub fn seen(&self, hash: &BoardHash) -> bool {
        self.applied().iter().any(|r| &r.hash == hash)
    }

    pub(crate) fn push(&mut self, record: MoveRecord) {
        self.entries.truncate(self.applied_len());
        self.entries.push(record);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step the cursor back, returning the entry stepped over.
    pub(crate) fn step_back(&mut self) -> Option<&MoveRecord> {
        let c = self.cursor?;
        self.cursor = c.checked_sub(1);
        Some(&self.entries[c])
    }

    /// Step the cursor forward, returning the entry stepped into.
    pub(crate) fn step_forward(&mut self) -> Option<&MoveRecord> {
        if !self.can_redo() {
            return None;
        }
        let next = self.applied_len();
        self.cursor = Some(next);
        Some(&self.entries[next])
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
