//! Round controller: opening a round, the dice roll, the sabacc shift, the
//! improve step, and multi-stage winner resolution.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{
    cards::{self, Card, Deck, DiceRoll, calculate_score, compare_cards, count_preferred_suit},
    entities::{Chips, GameState, GameStatus, PlayerId, PlayerSummary},
    errors::GameError,
    phases::GamePhase,
};

/// Outcome of `end_round`, consumed by the notifier.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RoundSummary {
    pub winner: PlayerSummary,
    /// Pot awarded to the winner.
    pub pot: Chips,
    pub tiebreaker_used: bool,
    /// Present when this round closed out the game.
    pub game_over: Option<GameOverSummary>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GameOverSummary {
    pub winner: PlayerSummary,
    pub final_chips: Chips,
    pub all_players: Vec<PlayerSummary>,
}

/// Result of a card-staking command; set when the command completed its
/// phase and the game moved on.
#[derive(Clone, Debug)]
pub struct SelectionOutcome {
    pub advanced_to: Option<GamePhase>,
}

impl GameState {
    /// Dealer-rotation invariant check, run before every state-changing
    /// command while a game is in progress. A violation is an engine bug,
    /// never a user error.
    pub fn validate_dealer_rotation(&self) -> Result<(), GameError> {
        if self.status != GameStatus::InProgress {
            return Ok(());
        }
        if self.dealer_index >= self.players.len() {
            return Err(GameError::DealerInconsistency(format!(
                "dealer index {} out of range for {} players",
                self.dealer_index,
                self.players.len()
            )));
        }
        // `dealers_used` is a set, so the same id can never be recorded as
        // dealer twice; only the count can drift.
        if self.dealers_used.len() as u32 > self.round_number {
            return Err(GameError::DealerInconsistency(format!(
                "{} dealers used in {} rounds",
                self.dealers_used.len(),
                self.round_number
            )));
        }
        Ok(())
    }

    /// Open a round: the current dealer is marked as having dealt, antes
    /// hit the pot, every player gets a fresh hand, and the opening roll is
    /// next.
    pub fn start_round(&mut self, dealer_id: Option<&PlayerId>) -> Result<(), GameError> {
        if self.status == GameStatus::Ended {
            return Err(GameError::GameOver);
        }
        if self.current_phase != GamePhase::Setup {
            return Err(GameError::WrongPhase {
                expected: GamePhase::Setup,
                actual: self.current_phase,
            });
        }
        if self.players.len() < self.settings.min_players {
            return Err(GameError::NotEnoughPlayers);
        }
        let dealer = self
            .players
            .get(self.dealer_index)
            .map(|p| p.id)
            .ok_or_else(|| {
                GameError::DealerInconsistency(format!(
                    "dealer index {} out of range",
                    self.dealer_index
                ))
            })?;
        if let Some(claim) = dealer_id {
            if *claim != dealer {
                return Err(GameError::OnlyDealerCanStart);
            }
        }
        if !self.antes_collected {
            if let Some(short) = self.players.iter().find(|p| p.chips < self.settings.ante) {
                return Err(GameError::InsufficientChips {
                    required: self.settings.ante,
                    available: short.chips,
                });
            }
        }

        // All validation passed; mutate.
        self.dealers_used.insert(dealer);
        self.status = GameStatus::InProgress;
        if self.round_number == 0 {
            self.round_number = 1;
        }
        self.reset_players_for_round();
        self.clear_round_transients();
        if !self.antes_collected {
            self.collect_antes()?;
        }
        self.deck = Deck::new();
        self.deck.shuffle();
        for idx in 0..self.players.len() {
            let hand = self.deck.draw_n(self.settings.hand_size);
            if hand.len() < self.settings.hand_size {
                return Err(GameError::DeckExhausted);
            }
            self.players[idx].hand = hand;
        }
        self.transition_to(GamePhase::InitialRoll)?;
        log::info!(
            "room {}: round {} started, dealer {}",
            self.id,
            self.round_number,
            dealer
        );
        Ok(())
    }

    /// Roll both dice, fixing the round's target number and preferred suit.
    pub fn roll_dice_for_round(&mut self) -> Result<DiceRoll, GameError> {
        if self.current_phase != GamePhase::InitialRoll {
            return Err(GameError::WrongPhase {
                expected: GamePhase::InitialRoll,
                actual: self.current_phase,
            });
        }
        let roll = cards::roll_dice();
        self.current_dice_roll = Some(roll);
        self.target_number = Some(roll.gold_value);
        self.preferred_suit = Some(roll.silver_suit);
        self.transition_to(GamePhase::Selection)?;
        Ok(roll)
    }

    /// Stake the cards at `indices` as the player's wager. A repeat call
    /// replaces the previous wager. When the last active player stakes,
    /// the first betting phase opens.
    pub fn select_cards(
        &mut self,
        player_id: &PlayerId,
        indices: &[usize],
    ) -> Result<SelectionOutcome, GameError> {
        if self.current_phase != GamePhase::Selection {
            return Err(GameError::WrongPhase {
                expected: GamePhase::Selection,
                actual: self.current_phase,
            });
        }
        let idx = self.player_index(player_id)?;
        if !self.players[idx].is_active {
            return Err(GameError::PlayerInactive);
        }
        let picked = picked_cards(&self.players[idx].hand, indices)?;
        self.players[idx].selected_cards = picked;
        let mut outcome = SelectionOutcome { advanced_to: None };
        if self.selection_complete() {
            self.transition_to(GamePhase::FirstBetting)?;
            self.start_betting_phase()?;
            outcome.advanced_to = Some(GamePhase::FirstBetting);
        }
        Ok(outcome)
    }

    /// Discard every un-selected card and draw replacements: each hand
    /// becomes its selection plus as many fresh cards as were discarded.
    /// Then the second betting phase opens.
    pub fn handle_sabacc_shift(&mut self) -> Result<(), GameError> {
        if self.current_phase != GamePhase::SabaccShift {
            return Err(GameError::WrongPhase {
                expected: GamePhase::SabaccShift,
                actual: self.current_phase,
            });
        }
        for idx in 0..self.players.len() {
            if !self.players[idx].is_active {
                continue;
            }
            let discarded = self.players[idx]
                .hand
                .len()
                .saturating_sub(self.players[idx].selected_cards.len());
            let mut hand = self.players[idx].selected_cards.clone();
            let drawn = self.deck.draw_n(discarded);
            if drawn.len() < discarded {
                return Err(GameError::DeckExhausted);
            }
            hand.extend(drawn);
            self.players[idx].hand = hand;
        }
        self.transition_to(GamePhase::SecondBetting)?;
        self.start_betting_phase()
    }

    /// Finalize the wager from the post-shift hand; anything not chosen is
    /// discarded and the hand empties. When the last active player
    /// finalizes, the round moves to reveal.
    pub fn improve_cards(
        &mut self,
        player_id: &PlayerId,
        indices: &[usize],
    ) -> Result<SelectionOutcome, GameError> {
        if self.current_phase != GamePhase::Improve {
            return Err(GameError::WrongPhase {
                expected: GamePhase::Improve,
                actual: self.current_phase,
            });
        }
        let idx = self.player_index(player_id)?;
        if !self.players[idx].is_active {
            return Err(GameError::PlayerInactive);
        }
        let picked = picked_cards(&self.players[idx].hand, indices)?;
        self.players[idx].selected_cards = picked;
        self.players[idx].hand.clear();
        let mut outcome = SelectionOutcome { advanced_to: None };
        if self.improve_complete() {
            self.transition_to(GamePhase::Reveal)?;
            outcome.advanced_to = Some(GamePhase::Reveal);
        }
        Ok(outcome)
    }

    /// Resolve the round: pick the winner, award the pot, and either close
    /// out the game (everyone has dealt) or line up the next round. The
    /// phase stays at `round_end` until `finish_round_reset` reopens the
    /// table.
    pub fn end_round(&mut self) -> Result<RoundSummary, GameError> {
        if self.target_number.is_none() || self.preferred_suit.is_none() {
            return Err(GameError::RoundNotReady);
        }
        if self.current_phase != GamePhase::Reveal {
            return Err(GameError::InvalidPhaseTransition {
                from: self.current_phase,
                to: GamePhase::RoundEnd,
            });
        }
        if self.pending_winner.is_none() && self.active_player_count() == 0 {
            return Err(GameError::NoEligibleWinner);
        }
        self.transition_to(GamePhase::RoundEnd)?;

        let (winner_id, tiebreaker_used) = self.resolve_winner()?;
        let pot = self.award_pot(&winner_id)?;
        let winner = self
            .player(&winner_id)
            .map(PlayerSummary::from)
            .ok_or(GameError::PlayerNotFound)?;
        log::info!(
            "room {}: round {} won by {} ({} chips, tiebreaker: {})",
            self.id,
            self.round_number,
            winner.name,
            pot,
            tiebreaker_used
        );

        let everyone_dealt = self
            .players
            .iter()
            .all(|p| self.dealers_used.contains(&p.id));
        let game_over = if everyone_dealt {
            Some(self.finalize_game())
        } else {
            self.prepare_next_round();
            None
        };
        Ok(RoundSummary {
            winner,
            pot,
            tiebreaker_used,
            game_over,
        })
    }

    /// Delayed tail of `end_round`: back to setup, waiting for the next
    /// dealer to open.
    pub fn finish_round_reset(&mut self) -> Result<(), GameError> {
        if self.status == GameStatus::Ended {
            return Err(GameError::GameOver);
        }
        if self.current_phase != GamePhase::RoundEnd {
            return Err(GameError::WrongPhase {
                expected: GamePhase::RoundEnd,
                actual: self.current_phase,
            });
        }
        self.transition_to(GamePhase::Setup)?;
        self.status = GameStatus::Waiting;
        Ok(())
    }

    /// Multi-stage winner resolution: minimum score, then maximum
    /// preferred-suit count, then a tiebreaker card draw, then chance
    /// cubes. A fold-induced pending winner bypasses all of it.
    fn resolve_winner(&mut self) -> Result<(PlayerId, bool), GameError> {
        if let Some(id) = self.pending_winner.take() {
            return Ok((id, false));
        }
        let target = self.target_number.ok_or(GameError::RoundNotReady)?;
        let suit = self.preferred_suit.ok_or(GameError::RoundNotReady)?;

        let mut candidates: Vec<usize> = (0..self.players.len())
            .filter(|&i| self.players[i].is_active)
            .collect();
        if candidates.is_empty() {
            return Err(GameError::NoEligibleWinner);
        }

        let best_score = candidates
            .iter()
            .map(|&i| calculate_score(&self.players[i].selected_cards, target))
            .min()
            .unwrap_or(0);
        candidates.retain(|&i| calculate_score(&self.players[i].selected_cards, target) == best_score);

        let most_suited = candidates
            .iter()
            .map(|&i| count_preferred_suit(&self.players[i].selected_cards, suit))
            .max()
            .unwrap_or(0);
        candidates
            .retain(|&i| count_preferred_suit(&self.players[i].selected_cards, suit) == most_suited);

        if let [sole] = candidates[..] {
            return Ok((self.players[sole].id, false));
        }

        // Each tied candidate draws one card from the remaining deck.
        let mut draws = Vec::with_capacity(candidates.len());
        for &i in &candidates {
            let card = self.deck.draw().ok_or(GameError::DeckExhausted)?;
            draws.push((i, card));
        }
        let best_card = draws
            .iter()
            .map(|&(_, card)| card)
            .max_by(|a, b| compare_cards(a, b))
            .unwrap_or(Card::wild());
        draws.retain(|(_, card)| compare_cards(card, &best_card) == Ordering::Equal);
        if let [(sole, _)] = draws[..] {
            return Ok((self.players[sole].id, true));
        }

        // Chance cubes. The first candidate seen with the current maximum
        // roll keeps the win; an equal later roll does not take it back.
        let mut winner = draws[0].0;
        let mut best_roll = 0;
        for &(i, _) in &draws {
            let roll = cards::roll_chance_cube();
            if roll > best_roll {
                best_roll = roll;
                winner = i;
            }
        }
        Ok((self.players[winner].id, true))
    }

    fn finalize_game(&mut self) -> GameOverSummary {
        self.status = GameStatus::Ended;
        // First seat keeps a chip tie.
        let mut winner_idx = 0;
        for (i, player) in self.players.iter().enumerate() {
            if player.chips > self.players[winner_idx].chips {
                winner_idx = i;
            }
        }
        self.clear_round_transients();
        self.antes_collected = false;
        for player in &mut self.players {
            player.hand.clear();
            player.selected_cards.clear();
            player.reset_betting_flags();
        }
        let winner = PlayerSummary::from(&self.players[winner_idx]);
        log::info!(
            "room {}: game over after {} rounds, {} wins with {} chips",
            self.id,
            self.round_number,
            winner.name,
            winner.chips
        );
        GameOverSummary {
            final_chips: winner.chips,
            winner,
            all_players: self.players.iter().map(PlayerSummary::from).collect(),
        }
    }

    fn prepare_next_round(&mut self) {
        self.antes_collected = false;
        self.dealer_index = (self.dealer_index + 1) % self.players.len();
        self.dealers_used.insert(self.players[self.dealer_index].id);
        self.round_number += 1;
        self.reset_players_for_round();
        self.clear_round_transients();
        self.deck = Deck::new();
        self.deck.shuffle();
        if self.can_collect_antes() {
            // Next round's antes go straight into the fresh pot;
            // `start_round` skips collection when they are already in.
            let _ = self.collect_antes();
        }
    }

    fn clear_round_transients(&mut self) {
        self.current_dice_roll = None;
        self.target_number = None;
        self.preferred_suit = None;
        self.current_player = None;
        self.pending_winner = None;
        self.betting_phase_started = false;
        self.betting_round_complete = false;
    }
}

fn picked_cards(hand: &[Card], indices: &[usize]) -> Result<Vec<Card>, GameError> {
    let mut picked = Vec::with_capacity(indices.len());
    let mut seen = vec![false; hand.len()];
    for &i in indices {
        if i >= hand.len() || seen[i] {
            return Err(GameError::InvalidCardIndex(i));
        }
        seen[i] = true;
        picked.push(hand[i]);
    }
    Ok(picked)
}
