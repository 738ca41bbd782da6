use std::time::Duration;

use polygo_engine::{CellState, Color, MoveError, Phase};
use polygo_sync::{SyncError, SyncEvent};

use crate::common::{assert_in_sync, connected_pair, drain, pump, settle, warnings};

#[tokio::test]
async fn moves_replay_identically() {
    let ((mut a, mut a_events), (mut b, mut b_events)) = connected_pair();

    // a plays Black, b plays White.
    for (mover, v) in [(0, 1), (1, 0), (0, 6), (1, 12)] {
        if mover == 0 {
            a.send_move(v).await.unwrap();
            pump(&mut b).await;
        } else {
            b.send_move(v).await.unwrap();
            pump(&mut a).await;
        }
        assert_in_sync(&a, &b);
    }

    // White at 0 is down to one liberty; Black takes it.
    let captured = a.send_move(5).await.unwrap();
    assert_eq!(captured, vec![0]);
    pump(&mut b).await;
    assert_in_sync(&a, &b);
    assert_eq!(b.engine().cell(0), Some(CellState::Empty));
    assert_eq!(b.engine().captured(Color::White), 1);

    let a_events = drain(&mut a_events);
    let b_events = drain(&mut b_events);
    assert_eq!(warnings(&a_events), 0);
    assert_eq!(warnings(&b_events), 0);
    assert!(b_events.contains(&SyncEvent::Applied { kind: "move" }));
    assert!(a_events.contains(&SyncEvent::Applied { kind: "move" }));
}

#[tokio::test]
async fn rejected_local_move_sends_nothing() {
    let ((mut a, _), (mut b, _)) = connected_pair();

    a.send_move(0).await.unwrap();
    let err = a.send_move(0).await.unwrap_err();
    assert!(matches!(err, SyncError::Move(MoveError::Occupied(0))));

    pump(&mut b).await;
    let extra = tokio::time::timeout(Duration::from_millis(100), b.process_next()).await;
    assert!(extra.is_err(), "rejected move must not be broadcast");
    assert_eq!(b.engine().move_count(), 1);
}

#[tokio::test]
async fn undo_and_redo_propagate() {
    let ((mut a, _), (mut b, mut b_events)) = connected_pair();

    a.send_move(12).await.unwrap();
    pump(&mut b).await;
    b.send_move(13).await.unwrap();
    pump(&mut a).await;

    a.send_undo().await.unwrap();
    pump(&mut b).await;
    assert_in_sync(&a, &b);
    assert_eq!(b.engine().stone_at(13), None);
    assert_eq!(b.engine().current_player(), Color::White);

    b.send_redo().await.unwrap();
    pump(&mut a).await;
    assert_in_sync(&a, &b);
    assert_eq!(a.engine().stone_at(13), Some(Color::White));

    assert!(matches!(a.send_redo().await, Err(SyncError::NothingToRedo)));
    assert_eq!(warnings(&drain(&mut b_events)), 0);
}

#[tokio::test]
async fn end_of_game_propagates() {
    let ((mut a, _), (mut b, mut b_events)) = connected_pair();

    // Black wall down column 1; White along the bottom right plus a lone
    // stone at 4 that will be taken off as dead.
    for (i, v) in [1, 4, 6, 24, 11, 23, 16, 22, 21].into_iter().enumerate() {
        if i % 2 == 0 {
            a.send_move(v).await.unwrap();
            pump(&mut b).await;
        } else {
            b.send_move(v).await.unwrap();
            pump(&mut a).await;
        }
    }

    b.send_pass().await.unwrap();
    pump(&mut a).await;
    a.send_pass().await.unwrap();
    pump(&mut b).await;
    assert!(b.engine().is_game_over());
    assert_eq!(b.engine().phase(), Phase::Over);
    assert!(matches!(
        b.send_move(3).await,
        Err(SyncError::Move(MoveError::GameOver))
    ));

    a.send_remove_group(4).await.unwrap();
    pump(&mut b).await;
    assert_in_sync(&a, &b);
    assert_eq!(b.engine().dead(Color::White), 1);

    b.send_mark_ownership().await.unwrap();
    pump(&mut a).await;
    assert_in_sync(&a, &b);
    assert_eq!(a.engine().phase(), Phase::Scored);
    assert_eq!(a.engine().controlled(Color::Black), 5);
    assert_eq!(a.engine().score(Color::White), b.engine().score(Color::White));

    assert_eq!(warnings(&drain(&mut b_events)), 0);
}

#[tokio::test]
async fn sync_request_when_current_changes_nothing() {
    let ((mut a, _), (mut b, mut b_events)) = connected_pair();

    a.send_move(7).await.unwrap();
    a.send_move(8).await.unwrap();
    pump(&mut b).await;
    pump(&mut b).await;
    assert_in_sync(&a, &b);

    b.request_sync().await.unwrap();
    pump(&mut a).await; // answers with sync_response
    pump(&mut b).await;
    assert_in_sync(&a, &b);

    let events = drain(&mut b_events);
    assert_eq!(warnings(&events), 0);
    assert!(!events.iter().any(|e| matches!(e, SyncEvent::Adopted { .. })));
}

#[tokio::test]
async fn seated_peer_cannot_move_out_of_turn() {
    let ((a, _), (b, _)) = connected_pair();
    let mut a = a.with_seat(Color::Black);
    let mut b = b.with_seat(Color::White);

    a.send_move(0).await.unwrap();
    assert!(matches!(
        b.send_move(24).await,
        Err(SyncError::OutOfTurn(Color::White))
    ));
    assert!(matches!(
        b.send_pass().await,
        Err(SyncError::OutOfTurn(Color::White))
    ));

    pump(&mut b).await;
    b.send_move(24).await.unwrap();
    pump(&mut a).await;
    assert_in_sync(&a, &b);
    assert!(matches!(
        b.send_move(23).await,
        Err(SyncError::OutOfTurn(Color::White))
    ));
}

#[tokio::test]
async fn crossing_moves_settle_on_one_state() {
    let ((mut a, mut a_events), (mut b, mut b_events)) = connected_pair();

    // Both act before hearing from the other.
    a.send_move(0).await.unwrap();
    b.send_move(24).await.unwrap();
    pump(&mut a).await;
    pump(&mut b).await;
    settle(&mut a, &mut b).await;

    assert_in_sync(&a, &b);
    assert_eq!(a.engine().move_count(), 1);
    let a_events = drain(&mut a_events);
    let b_events = drain(&mut b_events);
    assert_eq!(warnings(&a_events), 1);
    assert_eq!(warnings(&b_events), 1);
    let adopted = |events: &[SyncEvent]| {
        events
            .iter()
            .any(|e| matches!(e, SyncEvent::Adopted { .. }))
    };
    assert!(adopted(&a_events) != adopted(&b_events));
}

#[tokio::test]
async fn crossing_undo_and_move_keep_the_longer_history() {
    let ((mut a, _), (mut b, _)) = connected_pair();

    a.send_move(0).await.unwrap();
    pump(&mut b).await;

    b.send_move(24).await.unwrap();
    a.send_undo().await.unwrap();
    pump(&mut a).await;
    pump(&mut b).await;
    settle(&mut a, &mut b).await;

    assert_in_sync(&a, &b);
    assert_eq!(a.engine().move_count(), 2);
    assert_eq!(a.engine().stone_at(0), Some(Color::Black));
    assert_eq!(a.engine().stone_at(24), Some(Color::White));
}
