use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};

pub type WsSender = mpsc::UnboundedSender<String>;
pub type PeerId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    SessionFull { max_peers: usize },
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinError::SessionFull { max_peers } => {
                write!(f, "session is full ({max_peers} peers)")
            }
        }
    }
}

impl std::error::Error for JoinError {}

#[derive(Debug, Default)]
struct Session {
    /// Join order is kept so newcomers hear about peers oldest first.
    peers: Vec<(PeerId, WsSender)>,
}

/// Who is connected to which session. Passed around in `AppState`; the relay
/// keeps no other state.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    next_id: Arc<AtomicU64>,
    max_peers: usize,
}

impl SessionRegistry {
    pub fn new(max_peers: usize) -> Self {
        SessionRegistry {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            max_peers,
        }
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    /// Add a sender to a session under a fresh peer id. Returns the id and
    /// the peers that were already there.
    pub async fn join(
        &self,
        session: &str,
        sender: WsSender,
    ) -> Result<(PeerId, Vec<PeerId>), JoinError> {
        let mut sessions = self.sessions.write().await;
        let room = sessions.entry(session.to_string()).or_default();
        if room.peers.len() >= self.max_peers {
            if room.peers.is_empty() {
                sessions.remove(session);
            }
            return Err(JoinError::SessionFull {
                max_peers: self.max_peers,
            });
        }

        let existing = room.peers.iter().map(|(id, _)| *id).collect();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        room.peers.push((id, sender));
        Ok((id, existing))
    }

    /// Remove a peer; an emptied session is dropped. Returns the peers still
    /// connected.
    pub async fn leave(&self, session: &str, peer: PeerId) -> Vec<PeerId> {
        let mut sessions = self.sessions.write().await;
        let Some(room) = sessions.get_mut(session) else {
            return Vec::new();
        };
        room.peers.retain(|(id, _)| *id != peer);
        let remaining: Vec<PeerId> = room.peers.iter().map(|(id, _)| *id).collect();
        if remaining.is_empty() {
            sessions.remove(session);
        }
        remaining
    }

    pub async fn peers(&self, session: &str) -> Vec<PeerId> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session)
            .map(|room| room.peers.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Send a message to every peer in a session except one.
    pub async fn broadcast_except(&self, session: &str, except: PeerId, message: &str) {
        let sessions = self.sessions.read().await;
        if let Some(room) = sessions.get(session) {
            for (id, sender) in &room.peers {
                if *id != except {
                    let _ = sender.send(message.to_string());
                }
            }
        }
    }

    pub async fn send_to(&self, session: &str, peer: PeerId, message: &str) {
        let sessions = self.sessions.read().await;
        if let Some(room) = sessions.get(session)
            && let Some((_, sender)) = room.peers.iter().find(|(id, _)| *id == peer)
        {
            let _ = sender.send(message.to_string());
        }
    }
}
