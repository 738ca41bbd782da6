use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Vertex;
use crate::board::Board;
use crate::cell::{CellState, Owner};
use crate::color::Color;
use crate::error::MoveError;
use crate::graph::Graph;
use crate::hash::BoardHash;
use crate::history::{Action, HistoryLog, MoveRecord, TurnStatus};
use crate::territory::{self, Ownership};
use crate::turn::{MoveKind, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    BlackToPlay,
    WhiteToPlay,
    /// Two consecutive passes; dead groups may be removed.
    Over,
    /// Ownership has been marked on the board.
    Scored,
}

impl Phase {
    pub fn is_play(&self) -> bool {
        matches!(self, Phase::BlackToPlay | Phase::WhiteToPlay)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::BlackToPlay => write!(f, "black_to_play"),
            Phase::WhiteToPlay => write!(f, "white_to_play"),
            Phase::Over => write!(f, "over"),
            Phase::Scored => write!(f, "scored"),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "black_to_play" => Ok(Phase::BlackToPlay),
            "white_to_play" => Ok(Phase::WhiteToPlay),
            "over" => Ok(Phase::Over),
            "scored" => Ok(Phase::Scored),
            _ => Err(format!("unknown phase: {s}")),
        }
    }
}

/// Scoring summary for one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    /// Stones of this color captured during play.
    pub captured: usize,
    /// Stones of this color removed as dead after the game.
    pub dead: usize,
    pub occupied: usize,
    pub controlled: usize,
    /// `controlled - captured - dead`.
    pub total: i64,
}

/// Serialized game state for transport. Board snapshots are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub cells: Vec<CellState>,
    pub history: Vec<Turn>,
    pub cursor: Option<usize>,
    pub current_player: Color,
    pub game_over: bool,
    pub consecutive_passes: u32,
    pub last_placed: Option<Vertex>,
}

impl GameState {
    pub fn hash(&self) -> BoardHash {
        BoardHash::of(&self.cells)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    SizeMismatch { expected: usize, got: usize },
    InvalidCursor { cursor: usize, len: usize },
    MalformedEntry { index: usize, reason: &'static str },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::SizeMismatch { expected, got } => {
                write!(f, "state has {got} cells, graph has {expected} vertices")
            }
            StateError::InvalidCursor { cursor, len } => {
                write!(f, "cursor {cursor} out of range for {len} history entries")
            }
            StateError::MalformedEntry { index, reason } => {
                write!(f, "history entry {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for StateError {}

/// Go rules over an arbitrary graph, with a linear undo/redo history.
#[derive(Debug, Clone)]
pub struct Engine {
    graph: Arc<Graph>,
    board: Board,
    history: HistoryLog,
    status: TurnStatus,
}

impl Engine {
    pub fn new(graph: Arc<Graph>) -> Self {
        let board = Board::new(graph.vertex_count());
        Engine {
            graph,
            board,
            history: HistoryLog::new(),
            status: TurnStatus::INITIAL,
        }
    }

    /// Return to the all-empty board with no history.
    pub fn reset(&mut self) {
        self.board = Board::new(self.graph.vertex_count());
        self.history.clear();
        self.status = TurnStatus::INITIAL;
    }

    // -- Accessors --

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cells(&self) -> &[CellState] {
        self.board.cells()
    }

    pub fn cell(&self, v: Vertex) -> Option<CellState> {
        self.board.get(v)
    }

    pub fn stone_at(&self, v: Vertex) -> Option<Color> {
        self.board.stone_at(v)
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Applied history entries in wire form.
    pub fn moves(&self) -> Vec<Turn> {
        self.history.applied().iter().map(MoveRecord::to_turn).collect()
    }

    pub fn current_player(&self) -> Color {
        self.status.current_player
    }

    pub fn consecutive_passes(&self) -> u32 {
        self.status.consecutive_passes
    }

    pub fn is_game_over(&self) -> bool {
        self.status.game_over
    }

    pub fn last_placed(&self) -> Option<Vertex> {
        self.status.last_placed
    }

    pub fn move_count(&self) -> usize {
        self.history.applied_len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn hash(&self) -> BoardHash {
        self.board.hash()
    }

    pub fn phase(&self) -> Phase {
        if !self.status.game_over {
            match self.status.current_player {
                Color::Black => Phase::BlackToPlay,
                Color::White => Phase::WhiteToPlay,
            }
        } else if self.board.cells().iter().any(|c| c.territory().is_some()) {
            Phase::Scored
        } else {
            Phase::Over
        }
    }

    // -- Game actions --

    /// Validate a placement without committing it. Returns the resulting
    /// board, the captured vertices and the new position's hash.
    fn try_placement(
        &self,
        v: Vertex,
        color: Color,
    ) -> Result<(Board, Vec<Vertex>, BoardHash), MoveError> {
        if self.status.game_over {
            return Err(MoveError::GameOver);
        }

        let (board, captured) = self.board.place_stone(&self.graph, v, color)?;

        let hash = board.hash();
        if self.history.seen(&hash) {
            return Err(MoveError::KoViolation);
        }

        Ok((board, captured, hash))
    }

    pub fn check_placement(&self, v: Vertex, color: Color) -> Result<(), MoveError> {
        self.try_placement(v, color).map(|_| ())
    }

    pub fn is_legal(&self, v: Vertex, color: Color) -> bool {
        self.check_placement(v, color).is_ok()
    }

    /// Place a stone of `color` at `v`. Returns the captured vertices.
    /// Nothing changes when the placement is rejected.
    pub fn place_stone(&mut self, v: Vertex, color: Color) -> Result<Vec<Vertex>, MoveError> {
        let (after, captured, hash) = self.try_placement(v, color)?;

        let status = TurnStatus {
            current_player: color.opp(),
            consecutive_passes: 0,
            game_over: false,
            last_placed: Some(v),
        };
        let action = Action::Placement {
            vertex: v,
            color,
            captured: captured.clone(),
        };
        self.commit(action, after, hash, status);

        Ok(captured)
    }

    /// Place a stone for the player to move.
    pub fn play(&mut self, v: Vertex) -> Result<Vec<Vertex>, MoveError> {
        self.place_stone(v, self.status.current_player)
    }

    /// Pass for the player to move. The second consecutive pass ends the
    /// game and leaves the passer as current player. Returns false once the
    /// game is over.
    pub fn pass(&mut self) -> bool {
        if self.status.game_over {
            return false;
        }

        let color = self.status.current_player;
        let consecutive_passes = self.status.consecutive_passes + 1;
        let game_over = consecutive_passes >= 2;
        let status = TurnStatus {
            current_player: if game_over { color } else { color.opp() },
            consecutive_passes,
            game_over,
            last_placed: None,
        };

        let after = self.board.clone();
        let hash = after.hash();
        self.commit(Action::Pass { color }, after, hash, status);
        true
    }

    pub fn undo(&mut self) -> bool {
        let before = match self.history.step_back() {
            Some(record) => record.before.clone(),
            None => return false,
        };
        self.board = before;
        self.status = self
            .history
            .current()
            .map_or(TurnStatus::INITIAL, |r| r.status);
        true
    }

    pub fn redo(&mut self) -> bool {
        let (after, status) = match self.history.step_forward() {
            Some(record) => (record.after.clone(), record.status),
            None => return false,
        };
        self.board = after;
        self.status = status;
        true
    }

    /// Take the dead group through `v` off the board after the game ended.
    /// Returns the removed vertices.
    pub fn remove_group(&mut self, v: Vertex) -> Result<Vec<Vertex>, MoveError> {
        if !self.status.game_over {
            return Err(MoveError::NotOver);
        }
        let color = match self.board.get(v) {
            None => return Err(MoveError::InvalidIndex(v)),
            Some(CellState::Stone(c)) => c,
            Some(_) => return Err(MoveError::NotAStone(v)),
        };

        let group = self.board.chain(&self.graph, v);
        let mut after = self.board.clone();
        after.clear(&group);

        let mut status = self.status;
        if status.last_placed.is_some_and(|lp| group.contains(&lp)) {
            status.last_placed = None;
        }

        let hash = after.hash();
        let action = Action::GroupRemoval {
            vertex: v,
            vertices: group.clone(),
            color,
        };
        self.commit(action, after, hash, status);

        Ok(group)
    }

    pub fn ownership(&self) -> Ownership {
        territory::determine_ownership(&self.board, &self.graph)
    }

    /// Convert every empty cell into territory in one history entry.
    pub fn mark_ownership(&mut self) -> Result<(), MoveError> {
        if !self.status.game_over {
            return Err(MoveError::NotOver);
        }
        if self.board.count(CellState::Empty) == 0 {
            return Err(MoveError::NothingToMark);
        }
        let ownership = self.ownership();
        if let Some(e) = ownership.error {
            return Err(e.into());
        }

        let after = apply_ownership(&self.board, &ownership);
        let hash = after.hash();
        self.commit(Action::OwnershipMark, after, hash, self.status);
        Ok(())
    }

    fn commit(&mut self, action: Action, after: Board, hash: BoardHash, status: TurnStatus) {
        let record = MoveRecord {
            action,
            before: std::mem::replace(&mut self.board, after.clone()),
            after,
            hash,
            status,
        };
        self.history.push(record);
        self.status = status;
    }

    // -- Scoring --

    /// Stones of `color` captured during play.
    pub fn captured(&self, color: Color) -> usize {
        self.history
            .applied()
            .iter()
            .map(|r| match &r.action {
                Action::Placement {
                    color: placer,
                    captured,
                    ..
                } if *placer == color.opp() => captured.len(),
                _ => 0,
            })
            .sum()
    }

    /// Stones of `color` removed as dead after the game.
    pub fn dead(&self, color: Color) -> usize {
        self.history
            .applied()
            .iter()
            .map(|r| match &r.action {
                Action::GroupRemoval {
                    color: removed,
                    vertices,
                    ..
                } if *removed == color => vertices.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn occupied(&self, color: Color) -> usize {
        self.board.count(CellState::Stone(color))
    }

    pub fn controlled(&self, color: Color) -> usize {
        self.board.count(CellState::Territory(color.into()))
    }

    /// Neutral (dame) territory.
    pub fn uncontrolled(&self) -> usize {
        self.board.count(CellState::Territory(Owner::Neutral))
    }

    pub fn score(&self, color: Color) -> Score {
        let captured = self.captured(color);
        let dead = self.dead(color);
        let controlled = self.controlled(color);
        Score {
            captured,
            dead,
            occupied: self.occupied(color),
            controlled,
            total: controlled as i64 - captured as i64 - dead as i64,
        }
    }

    // -- Serialization --

    pub fn game_state(&self) -> GameState {
        GameState {
            cells: self.board.cells().to_vec(),
            history: self
                .history
                .entries()
                .iter()
                .map(MoveRecord::to_turn)
                .collect(),
            cursor: self.history.cursor(),
            current_player: self.status.current_player,
            game_over: self.status.game_over,
            consecutive_passes: self.status.consecutive_passes,
            last_placed: self.status.last_placed,
        }
    }

    /// Rebuild an engine from transmitted state.
    ///
    /// Snapshots are regenerated by replaying the entries mechanically (no
    /// legality checks); the transmitted cells, hashes and turn status are
    /// adopted as-is.
    pub fn from_game_state(graph: Arc<Graph>, state: GameState) -> Result<Self, StateError> {
        let size = graph.vertex_count();
        if state.cells.len() != size {
            return Err(StateError::SizeMismatch {
                expected: size,
                got: state.cells.len(),
            });
        }
        if let Some(cursor) = state.cursor {
            if cursor >= state.history.len() {
                return Err(StateError::InvalidCursor {
                    cursor,
                    len: state.history.len(),
                });
            }
        }

        let mut board = Board::new(size);
        let mut status = TurnStatus::INITIAL;
        let mut records = Vec::with_capacity(state.history.len());

        for (index, turn) in state.history.into_iter().enumerate() {
            let (action, after, next) = replay_turn(&graph, &board, status, &turn)
                .map_err(|reason| StateError::MalformedEntry { index, reason })?;
            records.push(MoveRecord {
                action,
                before: std::mem::replace(&mut board, after.clone()),
                after,
                hash: turn.hash,
                status: next,
            });
            status = next;
        }

        Ok(Engine {
            graph,
            board: Board::from_cells(state.cells),
            history: HistoryLog::from_parts(records, state.cursor),
            status: TurnStatus {
                current_player: state.current_player,
                consecutive_passes: state.consecutive_passes,
                game_over: state.game_over,
                last_placed: state.last_placed,
            },
        })
    }
}

fn apply_ownership(board: &Board, ownership: &Ownership) -> Board {
    let mut after = board.clone();
    for (v, owner) in ownership.owners.iter().enumerate() {
        if let (Some(owner), Some(CellState::Empty)) = (owner, board.get(v)) {
            after.set(v, CellState::Territory(*owner));
        }
    }
    after
}

/// Apply one wire entry to `board` without rule checks.
fn replay_turn(
    graph: &Graph,
    board: &Board,
    status: TurnStatus,
    turn: &Turn,
) -> Result<(Action, Board, TurnStatus), &'static str> {
    let in_range = |v: Vertex| graph.contains(v);
    if !turn.captured.iter().copied().all(in_range) {
        return Err("captured vertex out of range");
    }

    let mut after = board.clone();
    match turn.kind {
        MoveKind::Play => {
            let vertex = turn.vertex.ok_or("play without vertex")?;
            let color = turn.color.ok_or("play without color")?;
            if !in_range(vertex) {
                return Err("vertex out of range");
            }
            after.set(vertex, CellState::Stone(color));
            after.clear(&turn.captured);
            let next = TurnStatus {
                current_player: color.opp(),
                consecutive_passes: 0,
                game_over: false,
                last_placed: Some(vertex),
            };
            let action = Action::Placement {
                vertex,
                color,
                captured: turn.captured.clone(),
            };
            Ok((action, after, next))
        }
        MoveKind::Pass => {
            let color = turn.color.ok_or("pass without color")?;
            let consecutive_passes = status.consecutive_passes + 1;
            let game_over = consecutive_passes >= 2;
            let next = TurnStatus {
                current_player: if game_over { color } else { color.opp() },
                consecutive_passes,
                game_over,
                last_placed: None,
            };
            Ok((Action::Pass { color }, after, next))
        }
        MoveKind::RemoveGroup => {
            let vertex = turn.vertex.ok_or("removal without vertex")?;
            let color = turn.color.ok_or("removal without color")?;
            if !in_range(vertex) {
                return Err("vertex out of range");
            }
            after.clear(&turn.captured);
            let mut next = status;
            if next.last_placed.is_some_and(|lp| turn.captured.contains(&lp)) {
                next.last_placed = None;
            }
            let action = Action::GroupRemoval {
                vertex,
                vertices: turn.captured.clone(),
                color,
            };
            Ok((action, after, next))
        }
        MoveKind::MarkOwnership => {
            let ownership = territory::determine_ownership(board, graph);
            Ok((Action::OwnershipMark, apply_ownership(board, &ownership), status))
        }
    }
}
