pub mod adapter;
pub mod error;
pub mod message;
pub mod transport;

pub use adapter::{Command, EventReceiver, EventSender, SyncAdapter, SyncEvent};
pub use error::SyncError;
pub use message::{PeerId, Snapshot, SyncMessage};
pub use transport::{LoopbackTransport, Transport, WsTransport};
