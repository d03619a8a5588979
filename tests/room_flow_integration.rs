/// Integration tests for room actors and the room manager
///
/// These tests drive full rounds through the async command surface and
/// verify event ordering, epoch-stale timers, and room teardown.
use sabacc_engine::room::{RoomConfig, RoomManager};
use sabacc_engine::{GameError, GamePhase, GameStatus, PlayerId, RoomId};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

fn quick_config() -> RoomConfig {
    RoomConfig {
        round_end_delay_ms: 50,
        ..RoomConfig::default()
    }
}

async fn seated_room(manager: &RoomManager, players: usize) -> (RoomId, Vec<PlayerId>) {
    let room_id = manager.create_room(quick_config()).await.unwrap();
    let mut ids = Vec::with_capacity(players);
    for i in 0..players {
        let summary = manager.join_room(room_id, &format!("player{i}")).await.unwrap();
        ids.push(summary.id);
    }
    (room_id, ids)
}

/// Drive one full round through the manager, resolving immediately.
async fn drive_round(manager: &RoomManager, room_id: RoomId, ids: &[PlayerId]) {
    let dealer_index = manager.snapshot(room_id).await.unwrap().game.dealer_index;
    manager
        .start_round(room_id, Some(ids[dealer_index]))
        .await
        .unwrap();
    manager.roll_dice(room_id).await.unwrap();
    for id in ids {
        manager.select_cards(room_id, *id, vec![0]).await.unwrap();
    }
    for _ in 0..2 {
        loop {
            let snapshot = manager.snapshot(room_id).await.unwrap();
            let Some(next) = snapshot.game.current_player else {
                break;
            };
            manager.continue_playing(room_id, next).await.unwrap();
        }
    }
    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.current_phase, GamePhase::Improve);
    for player in &snapshot.game.players {
        let indices: Vec<usize> = (0..player.hand_size).collect();
        manager
            .improve_cards(room_id, player.id, indices)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_full_round_through_the_room_actor() {
    let manager = RoomManager::new();
    let (room_id, ids) = seated_room(&manager, 2).await;

    let (tx, mut rx) = mpsc::channel(64);
    manager.subscribe(room_id, ids[0], tx).await.unwrap();

    manager.start_round(room_id, Some(ids[0])).await.unwrap();
    manager.roll_dice(room_id).await.unwrap();
    manager.select_cards(room_id, ids[0], vec![0]).await.unwrap();
    manager
        .select_cards(room_id, ids[1], vec![0, 1])
        .await
        .unwrap();

    // The actor opened the first betting phase on the last selection.
    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.current_phase, GamePhase::FirstBetting);
    assert_eq!(snapshot.game.current_player, Some(ids[0]));

    manager.continue_playing(room_id, ids[0]).await.unwrap();
    manager.continue_playing(room_id, ids[1]).await.unwrap();

    // Completion of the first betting phase ran the sabacc shift and
    // opened the second.
    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.current_phase, GamePhase::SecondBetting);
    assert_eq!(snapshot.game.pot, 20);

    manager.continue_playing(room_id, ids[0]).await.unwrap();
    manager.continue_playing(room_id, ids[1]).await.unwrap();

    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.current_phase, GamePhase::Improve);
    for player in &snapshot.game.players {
        let indices: Vec<usize> = (0..player.hand_size).collect();
        manager
            .improve_cards(room_id, player.id, indices)
            .await
            .unwrap();
    }

    let summary = manager.end_round(room_id, false).await.unwrap();
    assert_eq!(summary.pot, 30);
    assert!(summary.game_over.is_none());
    assert!(ids.contains(&summary.winner.id));

    // The delayed reset reopens the table.
    sleep(Duration::from_millis(250)).await;
    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.current_phase, GamePhase::Setup);
    assert_eq!(snapshot.game.status, GameStatus::Waiting);

    // The subscriber saw one strictly increasing sequence.
    let mut last = 0;
    while let Ok(record) = rx.try_recv() {
        assert!(record.sequence_number > last);
        last = record.sequence_number;
    }
    assert!(last > 0);
}

#[tokio::test]
async fn test_end_round_immediate_skips_the_delay() {
    let manager = RoomManager::new();
    let (room_id, ids) = seated_room(&manager, 2).await;

    drive_round(&manager, room_id, &ids).await;
    let summary = manager.end_round(room_id, true).await.unwrap();
    assert!(summary.game_over.is_none());

    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.current_phase, GamePhase::Setup);
    assert_eq!(snapshot.game.status, GameStatus::Waiting);
    assert_eq!(snapshot.game.round_number, 2);
}

#[tokio::test]
async fn test_game_ends_once_every_player_has_dealt() {
    let manager = RoomManager::new();
    let (room_id, ids) = seated_room(&manager, 2).await;

    drive_round(&manager, room_id, &ids).await;
    let first = manager.end_round(room_id, true).await.unwrap();
    assert!(first.game_over.is_none());

    drive_round(&manager, room_id, &ids).await;
    let second = manager.end_round(room_id, true).await.unwrap();
    let game_over = second.game_over.expect("second round should end the game");
    assert_eq!(game_over.all_players.len(), 2);

    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Ended);
    assert_eq!(
        manager.start_round(room_id, None).await,
        Err(GameError::GameOver)
    );
}

#[tokio::test]
async fn test_protocol_violations_leave_state_untouched() {
    let manager = RoomManager::new();
    let (room_id, ids) = seated_room(&manager, 2).await;
    manager.start_round(room_id, None).await.unwrap();
    manager.roll_dice(room_id).await.unwrap();
    manager.select_cards(room_id, ids[0], vec![0]).await.unwrap();
    manager.select_cards(room_id, ids[1], vec![0]).await.unwrap();

    let before = manager.snapshot(room_id).await.unwrap();
    let events_before = manager.events_since(room_id, 0).await.unwrap().len();

    // Out of turn.
    assert_eq!(
        manager.continue_playing(room_id, ids[1]).await,
        Err(GameError::NotYourTurn)
    );

    let after = manager.snapshot(room_id).await.unwrap();
    assert_eq!(after.game.pot, before.game.pot);
    assert_eq!(after.game.current_player, before.game.current_player);
    assert_eq!(after.epoch, before.epoch);
    // Rejected commands are not recorded.
    let events_after = manager.events_since(room_id, 0).await.unwrap().len();
    assert_eq!(events_after, events_before);
}

#[tokio::test]
async fn test_join_validation_through_the_actor() {
    let manager = RoomManager::new();
    let (room_id, _) = seated_room(&manager, 2).await;

    assert_eq!(
        manager.join_room(room_id, "player0").await,
        Err(GameError::AlreadyJoined)
    );
    for i in 2..6 {
        manager.join_room(room_id, &format!("player{i}")).await.unwrap();
    }
    assert_eq!(
        manager.join_room(room_id, "late").await,
        Err(GameError::CapacityReached)
    );
}

#[tokio::test]
async fn test_stale_phase_timeout_is_a_noop() {
    let manager = RoomManager::new();
    let (room_id, _) = seated_room(&manager, 2).await;
    manager.start_round(room_id, None).await.unwrap();
    manager.roll_dice(room_id).await.unwrap();

    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.current_phase, GamePhase::Selection);

    // A timeout stamped with a different epoch changes nothing.
    manager
        .phase_timeout(room_id, snapshot.epoch + 5)
        .await
        .unwrap();
    let unchanged = manager.snapshot(room_id).await.unwrap();
    assert_eq!(unchanged.game.current_phase, GamePhase::Selection);
    assert!(
        unchanged
            .game
            .players
            .iter()
            .all(|p| p.selected_cards.is_empty())
    );

    // The correctly stamped timeout auto-selects and advances.
    manager.phase_timeout(room_id, snapshot.epoch).await.unwrap();
    let advanced = manager.snapshot(room_id).await.unwrap();
    assert_eq!(advanced.game.current_phase, GamePhase::FirstBetting);
    assert!(
        advanced
            .game
            .players
            .iter()
            .all(|p| p.selected_cards.len() == 1)
    );
}

#[tokio::test]
async fn test_room_destroyed_when_last_player_leaves() {
    let manager = RoomManager::new();
    let (room_id, ids) = seated_room(&manager, 2).await;
    assert_eq!(manager.active_room_count().await, 1);

    let first = manager.leave_room(room_id, ids[0]).await.unwrap();
    assert!(!first.room_destroyed);

    let second = manager.leave_room(room_id, ids[1]).await.unwrap();
    assert!(second.room_destroyed);
    assert_eq!(manager.active_room_count().await, 0);
    assert!(manager.room(room_id).await.is_none());
    assert_eq!(
        manager.join_room(room_id, "ghost").await,
        Err(GameError::RoomNotFound)
    );
}

#[tokio::test]
async fn test_leaving_mid_betting_passes_the_turn() {
    let manager = RoomManager::new();
    let (room_id, ids) = seated_room(&manager, 3).await;
    manager.start_round(room_id, None).await.unwrap();
    manager.roll_dice(room_id).await.unwrap();
    for id in &ids {
        manager.select_cards(room_id, *id, vec![0]).await.unwrap();
    }

    // The dealer leaves while holding the turn.
    manager.leave_room(room_id, ids[0]).await.unwrap();
    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.players.len(), 2);
    assert_eq!(snapshot.game.current_player, Some(ids[1]));

    manager.continue_playing(room_id, ids[1]).await.unwrap();
    manager.continue_playing(room_id, ids[2]).await.unwrap();
    let snapshot = manager.snapshot(room_id).await.unwrap();
    assert_eq!(snapshot.game.current_phase, GamePhase::SecondBetting);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let manager = RoomManager::new();
    let config = RoomConfig {
        min_players: 1,
        ..RoomConfig::default()
    };
    assert!(matches!(
        manager.create_room(config).await,
        Err(GameError::InvalidConfig(_))
    ));
}
