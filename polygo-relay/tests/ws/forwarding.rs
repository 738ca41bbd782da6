use std::time::Duration;

use serde_json::json;

use crate::common::TestServer;

#[tokio::test]
async fn text_frames_reach_the_other_peer_verbatim() {
    let server = TestServer::start().await;
    let (mut a, mut b) = server.connect_pair("fwd").await;

    // Deliberately odd spacing: the relay must not re-encode.
    let frame = r#"{"kind":"move",  "vertex":3, "extra":[1,2]}"#;
    a.send_text(frame).await;
    assert_eq!(b.recv_text().await, frame);

    b.send(json!({"kind": "pass", "hash": "abc"})).await;
    let msg = a.recv().await;
    assert_eq!(msg["kind"], "pass");
    assert_eq!(msg["hash"], "abc");
}

#[tokio::test]
async fn sender_does_not_receive_its_own_frames() {
    let server = TestServer::start().await;
    let (mut a, mut b) = server.connect_pair("echo").await;

    a.send_text("not even json").await;
    assert_eq!(b.recv_text().await, "not even json");
    a.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn sessions_do_not_leak_into_each_other() {
    let server = TestServer::start().await;
    let (mut a1, mut b1) = server.connect_pair("one").await;
    let (mut a2, mut b2) = server.connect_pair("two").await;

    a1.send(json!({"kind": "sync_request"})).await;
    assert_eq!(b1.recv().await["kind"], "sync_request");
    b2.expect_silence(Duration::from_millis(200)).await;
    a2.expect_silence(Duration::from_millis(50)).await;
}
