#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use polygo_relay::RelayConfig;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite;

/// A relay listening on an ephemeral local port.
pub struct TestServer {
    pub addr: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(RelayConfig::default()).await
    }

    pub async fn start_with(config: RelayConfig) -> Self {
        let (router, _state) = polygo_relay::build_router(&config);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            use axum::extract::Request;
            use tower::Layer as _;
            use tower_http::normalize_path::NormalizePathLayer;

            let app = NormalizePathLayer::trim_trailing_slash().layer(router);
            axum::serve(
                listener,
                axum::ServiceExt::<Request>::into_make_service(app),
            )
            .await
            .unwrap();
        });

        TestServer {
            addr,
            client: reqwest::Client::new(),
        }
    }

    /// Open a WebSocket connection to a session.
    pub async fn connect(&self, session: &str) -> WsClient {
        let url = format!("ws://{}/ws/{session}", self.addr);
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .expect("WebSocket connect failed");
        let (sink, stream) = stream.split();
        WsClient { sink, stream }
    }

    /// Connect and wait until the relay has registered the peer, which is
    /// observable once an earlier peer hears `player_joined`.
    pub async fn connect_pair(&self, session: &str) -> (WsClient, WsClient) {
        let mut first = self.connect(session).await;
        let mut second = self.connect(session).await;
        first.recv_kind("player_joined").await;
        second.recv_kind("player_joined").await;
        (first, second)
    }

    /// Plain HTTP GET against the relay.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("http://{}{path}", self.addr))
            .send()
            .await
            .unwrap()
    }
}

type Stream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A WebSocket client wrapping a split tokio-tungstenite connection.
pub struct WsClient {
    sink: futures_util::stream::SplitSink<Stream, tungstenite::Message>,
    stream: futures_util::stream::SplitStream<Stream>,
}

impl WsClient {
    /// Send a JSON message.
    pub async fn send(&mut self, msg: Value) {
        self.send_text(&msg.to_string()).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.sink
            .send(tungstenite::Message::Text(text.to_string().into()))
            .await
            .expect("WS send failed");
    }

    /// Receive the next text frame verbatim (5s timeout).
    pub async fn recv_text(&mut self) -> String {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let remaining = deadline - tokio::time::Instant::now();
            let msg = tokio::time::timeout(remaining, self.stream.next())
                .await
                .expect("WS recv timed out")
                .expect("WS stream ended")
                .expect("WS recv error");

            match msg {
                tungstenite::Message::Text(text) => return text.to_string(),
                tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => {}
                other => panic!("Expected text WS message, got: {other:?}"),
            }
        }
    }

    /// Receive the next text message as JSON.
    pub async fn recv(&mut self) -> Value {
        serde_json::from_str(&self.recv_text().await).expect("WS message not valid JSON")
    }

    /// Skip messages until one has a matching `kind` field. Returns that message.
    pub async fn recv_kind(&mut self, kind: &str) -> Value {
        loop {
            let msg = self.recv().await;
            if msg.get("kind").and_then(|k| k.as_str()) == Some(kind) {
                return msg;
            }
        }
    }

    /// Assert nothing arrives within `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(Ok(msg))) = tokio::time::timeout(wait, self.stream.next()).await {
            panic!("Expected no message, got: {msg:?}");
        }
    }

    /// Wait for the server to close the connection.
    pub async fn expect_closed(&mut self) {
        loop {
            match tokio::time::timeout(Duration::from_secs(5), self.stream.next())
                .await
                .expect("WS close timed out")
            {
                None | Some(Err(_)) | Some(Ok(tungstenite::Message::Close(_))) => return,
                Some(Ok(_)) => {}
            }
        }
    }

    /// Close the WebSocket connection (simulates browser close / disconnect).
    pub async fn close(self) {
        let mut sink = self.sink;
        let _ = sink.close().await;
    }
}
