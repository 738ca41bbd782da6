use std::fmt;

use chrono::{DateTime, Utc};
use polygo_engine::{BoardHash, Color, Engine, GameState, Vertex};
use serde::{Deserialize, Serialize};

/// Peer id handed out by the relay.
pub type PeerId = u64;

/// Full game state plus the hash of its board. Every state-changing message
/// carries one, so a message can always be applied on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: GameState,
    pub hash: BoardHash,
}

impl Snapshot {
    pub fn of(engine: &Engine) -> Self {
        Snapshot {
            state: engine.game_state(),
            hash: engine.hash(),
        }
    }

    /// Whether `hash` really is the hash of `state.cells`.
    pub fn is_consistent(&self) -> bool {
        self.state.hash() == self.hash
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncMessage {
    Move {
        vertex: Vertex,
        color: Color,
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    Pass {
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    Undo {
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    Redo {
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    RemoveGroup {
        vertex: Vertex,
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    MarkOwnership {
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    SyncRequest,
    SyncResponse {
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    PlayerJoined {
        player: PeerId,
    },
    PlayerLeft {
        player: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<DateTime<Utc>>,
    },
    /// Sent by the relay, e.g. when a session is full.
    Error {
        message: String,
    },
}

impl SyncMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::Move { .. } => "move",
            SyncMessage::Pass { .. } => "pass",
            SyncMessage::Undo { .. } => "undo",
            SyncMessage::Redo { .. } => "redo",
            SyncMessage::RemoveGroup { .. } => "remove_group",
            SyncMessage::MarkOwnership { .. } => "mark_ownership",
            SyncMessage::SyncRequest => "sync_request",
            SyncMessage::SyncResponse { .. } => "sync_response",
            SyncMessage::PlayerJoined { .. } => "player_joined",
            SyncMessage::PlayerLeft { .. } => "player_left",
            SyncMessage::Error { .. } => "error",
        }
    }

    /// The snapshot carried by state-bearing messages.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            SyncMessage::Move { snapshot, .. }
            | SyncMessage::Pass { snapshot }
            | SyncMessage::Undo { snapshot }
            | SyncMessage::Redo { snapshot }
            | SyncMessage::RemoveGroup { snapshot, .. }
            | SyncMessage::MarkOwnership { snapshot }
            | SyncMessage::SyncResponse { snapshot } => Some(snapshot),
            SyncMessage::SyncRequest
            | SyncMessage::PlayerJoined { .. }
            | SyncMessage::PlayerLeft { .. }
            | SyncMessage::Error { .. } => None,
        }
    }

    /// Game operations a peer replays locally.
    pub fn is_operation(&self) -> bool {
        self.snapshot().is_some() && !matches!(self, SyncMessage::SyncResponse { .. })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl fmt::Display for SyncMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.snapshot() {
            Some(s) => write!(f, "{} ({:?})", self.kind(), s.hash),
            None => write!(f, "{}", self.kind()),
        }
    }
}
