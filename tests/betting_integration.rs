/// Integration tests for the continue/fold betting protocol
///
/// These tests verify turn order, the validation sequence, chip movement,
/// and betting-phase completion.
use sabacc_engine::{GameError, GamePhase, GameSettings, GameState, PlayerId};
use uuid::Uuid;

/// Seat `players`, open a round, roll, and stake one card each, landing in
/// the first betting phase with the dealer to act.
fn betting_game(players: usize) -> (GameState, Vec<PlayerId>) {
    let mut state = GameState::new(Uuid::new_v4(), GameSettings::default());
    let mut ids = Vec::with_capacity(players);
    for i in 0..players {
        ids.push(state.add_player(&format!("player{i}")).unwrap().id);
    }
    state.start_round(None).unwrap();
    state.roll_dice_for_round().unwrap();
    for id in &ids {
        state.select_cards(id, &[0]).unwrap();
    }
    assert_eq!(state.current_phase, GamePhase::FirstBetting);
    (state, ids)
}

#[test]
fn test_dealer_acts_first() {
    let (state, ids) = betting_game(2);
    assert!(state.betting_phase_started);
    assert_eq!(state.current_player, Some(ids[0]));
    assert_eq!(state.next_to_act().map(|p| p.id), Some(ids[0]));
}

#[test]
fn test_acting_out_of_turn_is_rejected() {
    let (mut state, ids) = betting_game(2);
    let pot_before = state.pot;

    assert_eq!(
        state.continue_playing(&ids[1]).map(|_| ()),
        Err(GameError::NotYourTurn)
    );
    assert_eq!(state.pot, pot_before);
    assert!(!state.player(&ids[1]).unwrap().has_acted);

    state.continue_playing(&ids[0]).unwrap();
    assert_eq!(state.current_player, Some(ids[1]));
}

#[test]
fn test_continue_moves_chips_into_the_pot() {
    let (mut state, ids) = betting_game(2);
    let chips_before = state.player(&ids[0]).unwrap().chips;
    let pot_before = state.pot;

    state.continue_playing(&ids[0]).unwrap();
    let dealer = state.player(&ids[0]).unwrap();
    assert_eq!(dealer.chips, chips_before - state.continue_cost);
    assert!(dealer.has_acted);
    assert_eq!(state.pot, pot_before + state.continue_cost);
}

#[test]
fn test_insufficient_chips_rejected_before_mutation() {
    let (mut state, ids) = betting_game(2);
    state.players[0].chips = 3;

    let err = state.continue_playing(&ids[0]).unwrap_err();
    assert_eq!(
        err,
        GameError::InsufficientChips {
            required: 5,
            available: 3
        }
    );
    assert!(!state.player(&ids[0]).unwrap().has_acted);
    assert_eq!(state.current_player, Some(ids[0]));
}

#[test]
fn test_cannot_act_twice_in_one_phase() {
    let (mut state, ids) = betting_game(3);
    state.continue_playing(&ids[0]).unwrap();
    assert_eq!(
        state.continue_playing(&ids[0]).map(|_| ()),
        Err(GameError::AlreadyActed)
    );
}

#[test]
fn test_betting_requires_an_open_phase() {
    let mut state = GameState::new(Uuid::new_v4(), GameSettings::default());
    let alice = state.add_player("alice").unwrap();
    state.add_player("bob").unwrap();
    state.start_round(None).unwrap();

    assert_eq!(
        state.continue_playing(&alice.id).map(|_| ()),
        Err(GameError::BettingNotStarted)
    );
}

#[test]
fn test_unknown_player_rejected() {
    let (mut state, _) = betting_game(2);
    assert_eq!(
        state.continue_playing(&Uuid::new_v4()).map(|_| ()),
        Err(GameError::PlayerNotFound)
    );
}

#[test]
fn test_fold_clears_cards_and_deactivates() {
    let (mut state, ids) = betting_game(3);
    state.fold(&ids[0]).unwrap();

    let folded = state.player(&ids[0]).unwrap();
    assert!(!folded.is_active);
    assert!(folded.hand.is_empty());
    assert!(folded.selected_cards.is_empty());
    assert!(folded.has_acted);
    // Two active players remain, so no pending winner yet.
    assert_eq!(state.pending_winner, None);
    assert_eq!(state.current_player, Some(ids[1]));
}

#[test]
fn test_folding_down_to_one_records_pending_winner() {
    let (mut state, ids) = betting_game(3);
    state.continue_playing(&ids[0]).unwrap();
    state.fold(&ids[1]).unwrap();
    let outcome = state.fold(&ids[2]).unwrap();

    assert_eq!(state.pending_winner, Some(ids[0]));
    assert!(outcome.betting_complete);
    assert_eq!(outcome.advanced_to, Some(GamePhase::SabaccShift));
}

#[test]
fn test_completion_advances_first_betting_to_shift() {
    let (mut state, ids) = betting_game(2);
    state.continue_playing(&ids[0]).unwrap();
    let outcome = state.continue_playing(&ids[1]).unwrap();

    assert!(outcome.betting_complete);
    assert_eq!(outcome.next_player, None);
    assert_eq!(state.current_phase, GamePhase::SabaccShift);
    assert!(state.betting_round_complete);
    assert!(!state.betting_phase_started);
    assert_eq!(state.current_player, None);

    // The completed phase refuses further actions.
    assert_eq!(
        state.continue_playing(&ids[0]).map(|_| ()),
        Err(GameError::BettingNotStarted)
    );
}

#[test]
fn test_folded_players_are_skipped_in_second_betting() {
    let (mut state, ids) = betting_game(3);
    state.continue_playing(&ids[0]).unwrap();
    state.fold(&ids[1]).unwrap();
    state.continue_playing(&ids[2]).unwrap();
    state.handle_sabacc_shift().unwrap();
    assert_eq!(state.current_phase, GamePhase::SecondBetting);

    // The scan starts at the dealer and never offers the folded seat.
    assert_eq!(state.current_player, Some(ids[0]));
    state.continue_playing(&ids[0]).unwrap();
    assert_eq!(state.next_to_act().map(|p| p.id), Some(ids[2]));
    assert_eq!(
        state.continue_playing(&ids[1]).map(|_| ()),
        Err(GameError::PlayerInactive)
    );
    let outcome = state.continue_playing(&ids[2]).unwrap();
    assert_eq!(outcome.advanced_to, Some(GamePhase::Improve));
}

#[test]
fn test_turn_order_wraps_past_the_dealer_seat() {
    let (mut state, ids) = betting_game(3);
    // Rotate the deal to the last seat so the scan has to wrap.
    state.dealer_index = 2;
    state.start_betting_phase().unwrap();

    assert_eq!(state.current_player, Some(ids[2]));
    state.continue_playing(&ids[2]).unwrap();
    assert_eq!(state.current_player, Some(ids[0]));
    state.continue_playing(&ids[0]).unwrap();
    assert_eq!(state.current_player, Some(ids[1]));
}
