use polygo_relay::RelayConfig;

use crate::common::TestServer;

#[tokio::test]
async fn third_peer_gets_error_and_is_closed() {
    let server = TestServer::start().await;
    let (_a, _b) = server.connect_pair("full").await;

    let mut c = server.connect("full").await;
    let err = c.recv_kind("error").await;
    assert!(err["message"].as_str().unwrap().contains("full"));
    c.expect_closed().await;
}

#[tokio::test]
async fn max_peers_is_configurable() {
    let server = TestServer::start_with(RelayConfig {
        max_peers: 3,
        ..RelayConfig::default()
    })
    .await;
    let (mut a, mut b) = server.connect_pair("trio").await;

    let mut c = server.connect("trio").await;
    a.recv_kind("player_joined").await;
    b.recv_kind("player_joined").await;
    // The newcomer hears about both earlier peers.
    c.recv_kind("player_joined").await;
    c.recv_kind("player_joined").await;

    c.send_text("hello").await;
    assert_eq!(a.recv_text().await, "hello");
    assert_eq!(b.recv_text().await, "hello");
}
