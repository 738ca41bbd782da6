use std::fmt;

use polygo_engine::{Color, MoveError};

#[derive(Debug)]
pub enum SyncError {
    /// The local engine rejected the operation; nothing was sent.
    Move(MoveError),
    NothingToUndo,
    NothingToRedo,
    /// The adapter is seated as this color and it is not its turn.
    OutOfTurn(Color),
    /// A frame could not be encoded or decoded as a sync message.
    Codec(serde_json::Error),
    Transport(String),
    /// The other side of the transport is gone.
    Closed,
}

impl SyncError {
    /// Refused locally before anything went on the wire.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SyncError::Move(_)
                | SyncError::NothingToUndo
                | SyncError::NothingToRedo
                | SyncError::OutOfTurn(_)
        )
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Move(e) => write!(f, "{e}"),
            SyncError::NothingToUndo => write!(f, "nothing to undo"),
            SyncError::NothingToRedo => write!(f, "nothing to redo"),
            SyncError::OutOfTurn(seat) => write!(f, "not {seat}'s turn"),
            SyncError::Codec(e) => write!(f, "malformed sync message: {e}"),
            SyncError::Transport(msg) => write!(f, "transport error: {msg}"),
            SyncError::Closed => write!(f, "transport closed"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Move(e) => Some(e),
            SyncError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MoveError> for SyncError {
    fn from(e: MoveError) -> Self {
        SyncError::Move(e)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Codec(e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        SyncError::Transport(e.to_string())
    }
}
