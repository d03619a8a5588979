//! Engine error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::Chips;
use super::phases::GamePhase;

/// Errors surfaced by engine commands.
///
/// Expected user and protocol errors are validated before any mutation, so a
/// rejected command leaves state untouched. [`GameError::DealerInconsistency`]
/// and [`GameError::DeckExhausted`] indicate an engine defect; rooms refuse
/// further commands instead of attempting repair.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("already acted this betting phase")]
    AlreadyActed,
    #[error("name already taken in this room")]
    AlreadyJoined,
    #[error("betting round already complete")]
    BettingAlreadyComplete,
    #[error("betting has not started")]
    BettingNotStarted,
    #[error("room is full")]
    CapacityReached,
    #[error("dealer rotation inconsistency: {0}")]
    DealerInconsistency(String),
    #[error("deck exhausted")]
    DeckExhausted,
    #[error("game already in progress")]
    GameAlreadyInProgress,
    #[error("game is over")]
    GameOver,
    #[error("need >= {required} chips, have {available}")]
    InsufficientChips { required: Chips, available: Chips },
    #[error("invalid card index {0}")]
    InvalidCardIndex(usize),
    #[error("invalid room config: {0}")]
    InvalidConfig(String),
    #[error("illegal phase transition {from} -> {to}")]
    InvalidPhaseTransition { from: GamePhase, to: GamePhase },
    #[error("no active players to resolve")]
    NoEligibleWinner,
    #[error("not enough players")]
    NotEnoughPlayers,
    #[error("not your turn")]
    NotYourTurn,
    #[error("only the dealer can start the round")]
    OnlyDealerCanStart,
    #[error("{0} phase is not complete")]
    PhaseIncomplete(GamePhase),
    #[error("not active this round")]
    PlayerInactive,
    #[error("player does not exist")]
    PlayerNotFound,
    #[error("room is closed")]
    RoomClosed,
    #[error("room does not exist")]
    RoomNotFound,
    #[error("dice have not been rolled")]
    RoundNotReady,
    #[error("expected {expected} phase, currently {actual}")]
    WrongPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
}

impl GameError {
    /// Fatal errors indicate an engine bug, not a user mistake; the room
    /// refuses further commands rather than risking chip or score
    /// corruption.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DealerInconsistency(_) | Self::DeckExhausted)
    }
}
