use std::future::Future;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::SyncError;
use crate::message::SyncMessage;

/// Message pipe between two peers. Delivery order and uniqueness are not
/// assumed: every state-bearing message stands on its own.
pub trait Transport {
    fn send(&mut self, msg: &SyncMessage) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Next message from the other side, `Ok(None)` once it has gone away.
    /// A frame that does not decode yields `SyncError::Codec`; the transport
    /// stays usable afterwards.
    fn recv(&mut self) -> impl Future<Output = Result<Option<SyncMessage>, SyncError>> + Send;
}

// -- Loopback --

/// In-process transport. Frames still go through JSON so both ends see
/// exactly what a network peer would.
#[derive(Debug)]
pub struct LoopbackTransport {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl LoopbackTransport {
    /// Two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            LoopbackTransport { tx: a_tx, rx: a_rx },
            LoopbackTransport { tx: b_tx, rx: b_rx },
        )
    }

    /// Push a raw frame to the other end, bypassing encoding.
    pub fn send_raw(&self, text: impl Into<String>) -> Result<(), SyncError> {
        self.tx.send(text.into()).map_err(|_| SyncError::Closed)
    }
}

impl Transport for LoopbackTransport {
    async fn send(&mut self, msg: &SyncMessage) -> Result<(), SyncError> {
        let text = msg.to_json()?;
        self.send_raw(text)
    }

    async fn recv(&mut self) -> Result<Option<SyncMessage>, SyncError> {
        match self.rx.recv().await {
            Some(text) => Ok(Some(SyncMessage::from_json(&text)?)),
            None => Ok(None),
        }
    }
}

// -- WebSocket --

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client side of a relay session.
pub struct WsTransport {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsTransport {
    /// Connect to a relay session URL such as `ws://host:3000/ws/{session}`.
    pub async fn connect(url: &str) -> Result<Self, SyncError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        tracing::debug!("Connected to relay at {url}");
        let (sink, stream) = ws.split();
        Ok(WsTransport { sink, stream })
    }

    pub async fn close(mut self) -> Result<(), SyncError> {
        self.sink.close().await?;
        Ok(())
    }
}

impl Transport for WsTransport {
    async fn send(&mut self, msg: &SyncMessage) -> Result<(), SyncError> {
        let text = msg.to_json()?;
        self.sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<SyncMessage>, SyncError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(SyncMessage::from_json(&text)?)),
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }
}
