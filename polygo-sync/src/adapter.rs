use polygo_engine::{Color, Engine, GameState, MoveError, Vertex};
use tokio::sync::mpsc;

use crate::error::SyncError;
use crate::message::{PeerId, Snapshot, SyncMessage};
use crate::transport::Transport;

pub type EventSender = mpsc::UnboundedSender<SyncEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SyncEvent>;

/// What the UI needs to hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A peer operation was replayed and matched its hash.
    Applied { kind: &'static str },
    /// Local state was replaced with a transmitted one.
    Adopted { kind: &'static str },
    /// Divergence was detected and repaired, or a message could not be used.
    Warning { message: String },
    /// A local command was refused by the engine.
    Rejected { reason: String },
    PeerJoined { player: PeerId },
    PeerLeft { player: PeerId },
    /// The relay reported an error.
    Relay { message: String },
    Disconnected,
}

/// Requests driving [`SyncAdapter::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play(Vertex),
    Pass,
    Undo,
    Redo,
    RemoveGroup(Vertex),
    MarkOwnership,
    RequestSync,
}

/// Keeps one engine in step with a single remote peer.
///
/// Local operations are applied first and only broadcast when the engine
/// accepts them. Incoming operations are replayed on a scratch copy and
/// checked against the transmitted hash; any failure or mismatch makes the
/// transmitted state authoritative.
///
/// Two operations can cross on the wire when both sides act before hearing
/// from each other. Both sides then see the same pair of states and keep the
/// one that ranks higher; the side holding the winner re-sends it as a
/// `sync_response`.
pub struct SyncAdapter<T> {
    engine: Engine,
    transport: T,
    events: EventSender,
    seat: Option<Color>,
    /// A local operation went out and nothing has arrived from the peer since.
    unconfirmed: bool,
}

impl<T: Transport> SyncAdapter<T> {
    pub fn new(engine: Engine, transport: T) -> (Self, EventReceiver) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            SyncAdapter {
                engine,
                transport,
                events,
                seat: None,
                unconfirmed: false,
            },
            rx,
        )
    }

    /// Only play moves and passes for `seat`.
    pub fn with_seat(mut self, seat: Color) -> Self {
        self.seat = Some(seat);
        self
    }

    pub fn seat(&self) -> Option<Color> {
        self.seat
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }

    // -- Local operations --

    /// Play for the current player. Returns the captured vertices.
    pub async fn send_move(&mut self, vertex: Vertex) -> Result<Vec<Vertex>, SyncError> {
        self.check_turn()?;
        let color = self.engine.current_player();
        let captured = self.engine.place_stone(vertex, color)?;
        let snapshot = Snapshot::of(&self.engine);
        self.broadcast(SyncMessage::Move {
            vertex,
            color,
            snapshot,
        })
        .await?;
        Ok(captured)
    }

    pub async fn send_pass(&mut self) -> Result<(), SyncError> {
        self.check_turn()?;
        if !self.engine.pass() {
            return Err(MoveError::GameOver.into());
        }
        let snapshot = Snapshot::of(&self.engine);
        self.broadcast(SyncMessage::Pass { snapshot }).await
    }

    pub async fn send_undo(&mut self) -> Result<(), SyncError> {
        if !self.engine.undo() {
            return Err(SyncError::NothingToUndo);
        }
        let snapshot = Snapshot::of(&self.engine);
        self.broadcast(SyncMessage::Undo { snapshot }).await
    }

    pub async fn send_redo(&mut self) -> Result<(), SyncError> {
        if !self.engine.redo() {
            return Err(SyncError::NothingToRedo);
        }
        let snapshot = Snapshot::of(&self.engine);
        self.broadcast(SyncMessage::Redo { snapshot }).await
    }

    pub async fn send_remove_group(&mut self, vertex: Vertex) -> Result<Vec<Vertex>, SyncError> {
        let removed = self.engine.remove_group(vertex)?;
        let snapshot = Snapshot::of(&self.engine);
        self.broadcast(SyncMessage::RemoveGroup { vertex, snapshot })
            .await?;
        Ok(removed)
    }

    pub async fn send_mark_ownership(&mut self) -> Result<(), SyncError> {
        self.engine.mark_ownership()?;
        let snapshot = Snapshot::of(&self.engine);
        self.broadcast(SyncMessage::MarkOwnership { snapshot })
            .await
    }

    /// Ask the peer for its full state.
    pub async fn request_sync(&mut self) -> Result<(), SyncError> {
        self.broadcast(SyncMessage::SyncRequest).await
    }

    fn check_turn(&self) -> Result<(), SyncError> {
        match self.seat {
            Some(seat) if self.engine.current_player() != seat && !self.engine.is_game_over() => {
                Err(SyncError::OutOfTurn(seat))
            }
            _ => Ok(()),
        }
    }

    async fn broadcast(&mut self, msg: SyncMessage) -> Result<(), SyncError> {
        tracing::debug!("Sending {msg}");
        let is_operation = msg.is_operation();
        self.transport.send(&msg).await?;
        if is_operation {
            self.unconfirmed = true;
        }
        Ok(())
    }

    // -- Incoming --

    /// Receive and handle one message. Returns `false` once the transport has
    /// closed. Undecodable frames are reported as warnings and skipped.
    pub async fn process_next(&mut self) -> Result<bool, SyncError> {
        let incoming = self.transport.recv().await;
        self.on_incoming(incoming).await
    }

    async fn on_incoming(
        &mut self,
        incoming: Result<Option<SyncMessage>, SyncError>,
    ) -> Result<bool, SyncError> {
        match incoming {
            Ok(Some(msg)) => {
                self.handle_message(msg).await?;
                Ok(true)
            }
            Ok(None) => {
                self.emit(SyncEvent::Disconnected);
                Ok(false)
            }
            Err(SyncError::Codec(e)) => {
                tracing::warn!("Dropping malformed message: {e}");
                self.emit(SyncEvent::Warning {
                    message: format!("ignored malformed message: {e}"),
                });
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn handle_message(&mut self, msg: SyncMessage) -> Result<(), SyncError> {
        tracing::debug!("Received {msg}");
        match msg {
            SyncMessage::SyncRequest => {
                let snapshot = Snapshot::of(&self.engine);
                self.broadcast(SyncMessage::SyncResponse { snapshot })
                    .await?;
            }
            SyncMessage::SyncResponse { snapshot } => {
                self.unconfirmed = false;
                if !snapshot.is_consistent() {
                    self.warn(
                        "sync_response carries a hash that does not match its own board"
                            .to_string(),
                    );
                }
                if snapshot.state == self.engine.game_state() {
                    tracing::debug!("Already in sync");
                } else {
                    self.adopt("sync_response", &snapshot);
                }
            }
            SyncMessage::PlayerJoined { player } => {
                tracing::info!("Peer {player} joined");
                self.emit(SyncEvent::PeerJoined { player });
            }
            SyncMessage::PlayerLeft { player, .. } => {
                tracing::info!("Peer {player} left");
                self.emit(SyncEvent::PeerLeft { player });
            }
            SyncMessage::Error { message } => {
                tracing::error!("Relay error: {message}");
                self.emit(SyncEvent::Relay { message });
            }
            op => {
                let crossed = self.unconfirmed;
                self.unconfirmed = false;
                if !self.apply_remote(&op, crossed) {
                    let snapshot = Snapshot::of(&self.engine);
                    self.broadcast(SyncMessage::SyncResponse { snapshot }).await?;
                }
            }
        }
        Ok(())
    }

    /// Replay a peer operation, falling back to the transmitted state.
    /// `crossed` is set when our own last operation may not have reached the
    /// peer yet. Returns `false` when local state was kept over a crossing
    /// operation and must be re-sent.
    fn apply_remote(&mut self, msg: &SyncMessage, crossed: bool) -> bool {
        let kind = msg.kind();
        let Some(snapshot) = msg.snapshot() else {
            return true;
        };

        if !snapshot.is_consistent() {
            self.warn(format!(
                "{kind} carries a hash that does not match its own board"
            ));
        }

        // Duplicates and echoes of our own state are no-ops.
        let local = self.engine.game_state();
        if snapshot.state == local {
            tracing::debug!("Ignoring {kind}: state already current");
            return true;
        }

        let mut replica = self.engine.clone();
        let problem = match replay(&mut replica, msg) {
            Ok(()) if replica.game_state() == snapshot.state => {
                self.engine = replica;
                self.emit(SyncEvent::Applied { kind });
                return true;
            }
            Ok(()) if replica.hash() != snapshot.hash => format!(
                "hash mismatch after {kind}: local {:?}, remote {:?}",
                replica.hash(),
                snapshot.hash
            ),
            Ok(()) => format!("turn state differs after {kind}"),
            Err(e) => format!("could not replay {kind} ({e})"),
        };

        if crossed && !outranks(&snapshot.state, &local) {
            self.warn(format!(
                "{problem}; {kind} crossed our own, keeping local state"
            ));
            return false;
        }
        self.warn(format!("{problem}; adopting remote state"));
        self.adopt(kind, snapshot);
        true
    }

    fn adopt(&mut self, kind: &'static str, snapshot: &Snapshot) {
        let graph = self.engine.graph().clone();
        match Engine::from_game_state(graph, snapshot.state.clone()) {
            Ok(engine) => {
                tracing::debug!("Adopted remote state {:?}", engine.hash());
                self.engine = engine;
                self.emit(SyncEvent::Adopted { kind });
            }
            Err(e) => self.warn(format!("rejected remote state from {kind}: {e}")),
        }
    }

    fn warn(&self, message: String) {
        tracing::warn!("{message}");
        self.emit(SyncEvent::Warning { message });
    }

    fn emit(&self, event: SyncEvent) {
        // The UI may have stopped listening.
        let _ = self.events.send(event);
    }

    // -- Driver --

    async fn execute(&mut self, command: Command) -> Result<(), SyncError> {
        match command {
            Command::Play(v) => self.send_move(v).await.map(|_| ()),
            Command::Pass => self.send_pass().await,
            Command::Undo => self.send_undo().await,
            Command::Redo => self.send_redo().await,
            Command::RemoveGroup(v) => self.send_remove_group(v).await.map(|_| ()),
            Command::MarkOwnership => self.send_mark_ownership().await,
            Command::RequestSync => self.request_sync().await,
        }
    }

    /// Serve local commands and peer messages until either side closes.
    /// Returns the engine in its final state.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<Engine, SyncError> {
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    match self.execute(command).await {
                        Ok(()) => {}
                        Err(e) if e.is_rejection() => {
                            tracing::debug!("Rejected {command:?}: {e}");
                            self.emit(SyncEvent::Rejected { reason: e.to_string() });
                        }
                        Err(e) => {
                            tracing::error!("Failed to send {command:?}: {e}");
                            return Err(e);
                        }
                    }
                }
                incoming = self.transport.recv() => {
                    if !self.on_incoming(incoming).await? {
                        break;
                    }
                }
            }
        }
        Ok(self.engine)
    }
}

/// Total order on diverged states, used to settle crossing operations the
/// same way on both sides: more applied entries first, then the encoded
/// state itself.
fn outranks(remote: &GameState, local: &GameState) -> bool {
    let applied = |s: &GameState| s.cursor.map_or(0, |c| c + 1);
    match applied(remote).cmp(&applied(local)) {
        std::cmp::Ordering::Equal => encoded(remote) > encoded(local),
        ord => ord.is_gt(),
    }
}

fn encoded(state: &GameState) -> String {
    serde_json::to_string(state).unwrap_or_default()
}

/// Apply a peer operation to `engine` through the normal rules.
fn replay(engine: &mut Engine, msg: &SyncMessage) -> Result<(), SyncError> {
    match *msg {
        SyncMessage::Move { vertex, color, .. } => {
            engine.place_stone(vertex, color)?;
        }
        SyncMessage::Pass { .. } => {
            if !engine.pass() {
                return Err(MoveError::GameOver.into());
            }
        }
        SyncMessage::Undo { .. } => {
            if !engine.undo() {
                return Err(SyncError::NothingToUndo);
            }
        }
        SyncMessage::Redo { .. } => {
            if !engine.redo() {
                return Err(SyncError::NothingToRedo);
            }
        }
        SyncMessage::RemoveGroup { vertex, .. } => {
            engine.remove_group(vertex)?;
        }
        SyncMessage::MarkOwnership { .. } => {
            engine.mark_ownership()?;
        }
        _ => {}
    }
    Ok(())
}
