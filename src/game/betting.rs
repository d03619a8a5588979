//! Turn-based continue/fold betting, layered on the two betting phases.

use super::{
    entities::{BettingAction, GameState, Player, PlayerId},
    errors::GameError,
    phases::GamePhase,
};

/// What a betting action changed, for event emission.
#[derive(Clone, Debug)]
pub struct BettingOutcome {
    pub action: BettingAction,
    pub next_player: Option<PlayerId>,
    pub betting_complete: bool,
    pub advanced_to: Option<GamePhase>,
}

impl GameState {
    /// Reset per-player betting flags and open the phase with the dealer to
    /// act first.
    pub fn start_betting_phase(&mut self) -> Result<(), GameError> {
        if !self.current_phase.is_betting() {
            return Err(GameError::WrongPhase {
                expected: GamePhase::FirstBetting,
                actual: self.current_phase,
            });
        }
        for player in &mut self.players {
            player.reset_betting_flags();
        }
        self.betting_phase_started = true;
        self.betting_round_complete = false;
        self.current_player = self.next_to_act().map(|p| p.id);
        Ok(())
    }

    /// The only player permitted to act: scan clockwise from the dealer,
    /// skipping inactive players and players who have already acted.
    #[must_use]
    pub fn next_to_act(&self) -> Option<&Player> {
        let n = self.players.len();
        if n == 0 {
            return None;
        }
        (0..n)
            .map(|offset| &self.players[(self.dealer_index + offset) % n])
            .find(|p| p.is_active && !p.has_acted)
    }

    fn betting_turn_index(&self, player_id: &PlayerId) -> Result<usize, GameError> {
        if !self.betting_phase_started {
            return Err(GameError::BettingNotStarted);
        }
        if self.betting_round_complete {
            return Err(GameError::BettingAlreadyComplete);
        }
        let idx = self.player_index(player_id)?;
        if !self.players[idx].is_active {
            return Err(GameError::PlayerInactive);
        }
        if self.players[idx].has_acted {
            return Err(GameError::AlreadyActed);
        }
        match self.next_to_act() {
            Some(next) if next.id == *player_id => Ok(idx),
            _ => Err(GameError::NotYourTurn),
        }
    }

    /// Pay the continue cost into the pot and stay in the round.
    pub fn continue_playing(&mut self, player_id: &PlayerId) -> Result<BettingOutcome, GameError> {
        let idx = self.betting_turn_index(player_id)?;
        let cost = self.continue_cost;
        let player = &mut self.players[idx];
        let remaining = player
            .chips
            .checked_sub(cost)
            .ok_or(GameError::InsufficientChips {
                required: cost,
                available: player.chips,
            })?;
        player.chips = remaining;
        player.has_acted = true;
        player.betting_action = Some(BettingAction::Continue);
        self.pot += cost;
        self.after_betting_action(BettingAction::Continue)
    }

    /// Leave the round with no further claim on the pot.
    pub fn fold(&mut self, player_id: &PlayerId) -> Result<BettingOutcome, GameError> {
        let idx = self.betting_turn_index(player_id)?;
        self.force_fold(idx);
        self.after_betting_action(BettingAction::Fold)
    }

    /// Fold without turn validation; timeouts and departures use this too.
    /// When exactly one active player remains they become the round's
    /// pending winner, bypassing score comparison at the end of the round.
    pub(crate) fn force_fold(&mut self, idx: usize) {
        let player = &mut self.players[idx];
        player.is_active = false;
        player.hand.clear();
        player.selected_cards.clear();
        player.has_acted = true;
        player.betting_action = Some(BettingAction::Fold);
        if self.active_player_count() == 1 {
            self.pending_winner = self.players.iter().find(|p| p.is_active).map(|p| p.id);
        }
    }

    fn after_betting_action(&mut self, action: BettingAction) -> Result<BettingOutcome, GameError> {
        match self.next_to_act().map(|p| p.id) {
            Some(next) => {
                self.current_player = Some(next);
                Ok(BettingOutcome {
                    action,
                    next_player: Some(next),
                    betting_complete: false,
                    advanced_to: None,
                })
            }
            None => {
                let to = self.finish_betting_round()?;
                Ok(BettingOutcome {
                    action,
                    next_player: None,
                    betting_complete: true,
                    advanced_to: Some(to),
                })
            }
        }
    }

    /// Close out the betting phase and advance to its successor.
    pub(crate) fn finish_betting_round(&mut self) -> Result<GamePhase, GameError> {
        self.betting_round_complete = true;
        self.betting_phase_started = false;
        self.current_player = None;
        let to = self.current_phase.next();
        self.transition_to(to)?;
        Ok(to)
    }
}
