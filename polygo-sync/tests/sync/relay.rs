use std::time::Duration;

use polygo_engine::{Color, Engine};
use polygo_relay::RelayConfig;
use polygo_sync::{Command, SyncAdapter, SyncEvent, SyncMessage, Transport, WsTransport};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::common::{assert_in_sync, graph, pump};

async fn start_relay() -> String {
    let (router, _state) = polygo_relay::build_router(&RelayConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: &str, session: &str) -> WsTransport {
    WsTransport::connect(&format!("ws://{addr}/ws/{session}"))
        .await
        .unwrap()
}

#[tokio::test]
async fn two_peers_through_relay() {
    let addr = start_relay().await;

    let (mut a, mut a_events) = SyncAdapter::new(Engine::new(graph()), connect(&addr, "game").await);
    let (mut b, mut b_events) = SyncAdapter::new(Engine::new(graph()), connect(&addr, "game").await);

    // Each side hears about the other.
    pump(&mut a).await;
    pump(&mut b).await;
    assert!(matches!(a_events.try_recv(), Ok(SyncEvent::PeerJoined { .. })));
    assert!(matches!(b_events.try_recv(), Ok(SyncEvent::PeerJoined { .. })));

    a.send_move(12).await.unwrap();
    pump(&mut b).await;
    b.send_move(13).await.unwrap();
    pump(&mut a).await;
    a.send_undo().await.unwrap();
    pump(&mut b).await;

    assert_in_sync(&a, &b);
    assert_eq!(b.engine().stone_at(12), Some(Color::Black));
    assert_eq!(b.engine().stone_at(13), None);
    assert_eq!(b_events.try_recv(), Ok(SyncEvent::Applied { kind: "move" }));
}

#[tokio::test]
async fn late_joiner_catches_up_with_sync_request() {
    let addr = start_relay().await;

    // The game is under way before anyone else is in the session, so no
    // move is in flight when the second peer arrives.
    let mut played = Engine::new(graph());
    played.play(0).unwrap();
    played.play(24).unwrap();
    let (mut a, _a_events) = SyncAdapter::new(played, connect(&addr, "late").await);

    let (mut b, mut b_events) = SyncAdapter::new(Engine::new(graph()), connect(&addr, "late").await);
    pump(&mut a).await; // player_joined
    pump(&mut b).await; // player_joined

    b.request_sync().await.unwrap();
    pump(&mut a).await;
    pump(&mut b).await;

    assert_in_sync(&a, &b);
    assert_eq!(b.engine().move_count(), 2);
    let events: Vec<_> = std::iter::from_fn(|| b_events.try_recv().ok()).collect();
    assert!(events.contains(&SyncEvent::Adopted { kind: "sync_response" }));
}

#[tokio::test]
async fn run_loop_drives_commands_and_peer_traffic() {
    let addr = start_relay().await;

    let (a, mut a_events) = SyncAdapter::new(Engine::new(graph()), connect(&addr, "loop").await);
    let (mut b, _b_events) = SyncAdapter::new(Engine::new(graph()), connect(&addr, "loop").await);
    pump(&mut b).await; // player_joined

    let (commands, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(a.run(rx));

    commands.send(Command::Play(6)).unwrap();
    pump(&mut b).await;
    assert_eq!(b.engine().stone_at(6), Some(Color::Black));

    b.send_move(7).await.unwrap();

    // Occupied for the driver: reported as an event, the loop keeps going.
    commands.send(Command::Play(6)).unwrap();
    let deadline = Duration::from_secs(5);
    let mut saw_rejected = false;
    let mut saw_applied = false;
    while !(saw_rejected && saw_applied) {
        match tokio::time::timeout(deadline, a_events.recv()).await {
            Ok(Some(SyncEvent::Rejected { reason })) => {
                assert!(reason.contains("occupied"));
                saw_rejected = true;
            }
            Ok(Some(SyncEvent::Applied { kind })) => {
                assert_eq!(kind, "move");
                saw_applied = true;
            }
            Ok(Some(_)) => {}
            other => panic!("event stream ended early: {other:?}"),
        }
    }

    drop(commands);
    let engine = handle.await.unwrap().unwrap();
    assert_eq!(engine.game_state(), b.engine().game_state());
}

#[tokio::test]
async fn third_peer_is_turned_away() {
    let addr = start_relay().await;
    let mut a = connect(&addr, "busy").await;
    let _b = connect(&addr, "busy").await;
    // Both seats are taken once the first peer hears about the second.
    assert!(matches!(
        a.recv().await.unwrap(),
        Some(SyncMessage::PlayerJoined { .. })
    ));

    let (mut c, mut c_events) = SyncAdapter::new(Engine::new(graph()), connect(&addr, "busy").await);
    pump(&mut c).await;
    match c_events.try_recv() {
        Ok(SyncEvent::Relay { message }) => assert!(message.contains("full")),
        other => panic!("expected relay error, got {other:?}"),
    }
    assert!(!c.process_next().await.unwrap());
}
