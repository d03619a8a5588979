//! Phase state machine: the legal phase cycle, transition validation, and
//! timeout-driven auto-resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    entities::{GameState, PlayerId},
    errors::GameError,
};

/// Round phases, in strict cycle order. Each phase has exactly one legal
/// successor; anything else is an [`GameError::InvalidPhaseTransition`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Setup,
    InitialRoll,
    Selection,
    FirstBetting,
    SabaccShift,
    SecondBetting,
    Improve,
    Reveal,
    RoundEnd,
}

impl GamePhase {
    /// The only phase this one may transition to.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Setup => Self::InitialRoll,
            Self::InitialRoll => Self::Selection,
            Self::Selection => Self::FirstBetting,
            Self::FirstBetting => Self::SabaccShift,
            Self::SabaccShift => Self::SecondBetting,
            Self::SecondBetting => Self::Improve,
            Self::Improve => Self::Reveal,
            Self::Reveal => Self::RoundEnd,
            Self::RoundEnd => Self::Setup,
        }
    }

    #[must_use]
    pub const fn is_betting(self) -> bool {
        matches!(self, Self::FirstBetting | Self::SecondBetting)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Setup => "setup",
            Self::InitialRoll => "initial_roll",
            Self::Selection => "selection",
            Self::FirstBetting => "first_betting",
            Self::SabaccShift => "sabacc_shift",
            Self::SecondBetting => "second_betting",
            Self::Improve => "improve",
            Self::Reveal => "reveal",
            Self::RoundEnd => "round_end",
        };
        write!(f, "{repr}")
    }
}

/// What a phase timeout changed, for event emission.
#[derive(Clone, Debug, Default)]
pub struct TimeoutOutcome {
    pub auto_selected: Vec<PlayerId>,
    pub auto_folded: Vec<PlayerId>,
    pub auto_improved: Vec<PlayerId>,
    pub betting_completed: bool,
    pub advanced_to: Option<GamePhase>,
}

impl TimeoutOutcome {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.auto_selected.is_empty()
            && self.auto_folded.is_empty()
            && self.auto_improved.is_empty()
            && self.advanced_to.is_none()
    }
}

impl GameState {
    /// Every active player has staked at least one card.
    #[must_use]
    pub fn selection_complete(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.is_active)
            .all(|p| !p.selected_cards.is_empty())
    }

    /// Every active player has nothing left un-selected.
    #[must_use]
    pub fn improve_complete(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.is_active)
            .all(|p| p.hand.is_empty())
    }

    /// Advance to `to`, which must be the current phase's single legal
    /// successor with its completion precondition satisfied.
    pub fn transition_to(&mut self, to: GamePhase) -> Result<(), GameError> {
        let from = self.current_phase;
        if to != from.next() {
            return Err(GameError::InvalidPhaseTransition { from, to });
        }
        match from {
            GamePhase::Selection if !self.selection_complete() => {
                return Err(GameError::PhaseIncomplete(from));
            }
            GamePhase::Improve if !self.improve_complete() => {
                return Err(GameError::PhaseIncomplete(from));
            }
            _ => {}
        }
        self.current_phase = to;
        Ok(())
    }

    /// Apply the deadline action for the current phase: auto-select during
    /// selection, auto-fold anyone who has not acted during betting, and
    /// auto-improve during improve. Each branch re-checks its completion
    /// predicate and advances the phase once satisfied.
    ///
    /// Safe to apply again: a timeout with nothing left to do changes
    /// nothing.
    pub fn apply_phase_timeout(&mut self) -> Result<TimeoutOutcome, GameError> {
        let mut outcome = TimeoutOutcome::default();
        match self.current_phase {
            GamePhase::Selection => {
                for player in &mut self.players {
                    if player.is_active
                        && player.selected_cards.is_empty()
                        && !player.hand.is_empty()
                    {
                        player.selected_cards = vec![player.hand[0]];
                        outcome.auto_selected.push(player.id);
                    }
                }
                if self.selection_complete() {
                    self.transition_to(GamePhase::FirstBetting)?;
                    self.start_betting_phase()?;
                    outcome.advanced_to = Some(GamePhase::FirstBetting);
                }
            }
            GamePhase::FirstBetting | GamePhase::SecondBetting => {
                if !self.betting_phase_started || self.betting_round_complete {
                    return Ok(outcome);
                }
                // Fold one player at a time so the sole-survivor check in
                // `force_fold` fires on the way down.
                while let Some(idx) = self.players.iter().position(|p| p.is_active && !p.has_acted)
                {
                    let id = self.players[idx].id;
                    self.force_fold(idx);
                    outcome.auto_folded.push(id);
                }
                if !outcome.auto_folded.is_empty() {
                    let to = self.finish_betting_round()?;
                    outcome.betting_completed = true;
                    outcome.advanced_to = Some(to);
                }
            }
            GamePhase::Improve => {
                for player in &mut self.players {
                    if player.is_active && !player.hand.is_empty() {
                        player.selected_cards = std::mem::take(&mut player.hand);
                        outcome.auto_improved.push(player.id);
                    }
                }
                if self.improve_complete() && !outcome.auto_improved.is_empty() {
                    self.transition_to(GamePhase::Reveal)?;
                    outcome.advanced_to = Some(GamePhase::Reveal);
                }
            }
            _ => {}
        }
        Ok(outcome)
    }
}
