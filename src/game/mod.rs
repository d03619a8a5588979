//! Coruscant Shift game engine: deck math, the phase state machine,
//! betting, round resolution, and the event log.
//!
//! This module is pure state and rules; nothing here does I/O or owns a
//! task. The [`crate::room`] module wraps one [`GameState`] per room in a
//! single-writer actor.

pub mod betting;
pub mod cards;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod events;
pub mod phases;
pub mod round;

pub use betting::BettingOutcome;
pub use cards::{
    Card, Deck, DiceRoll, Suit, Value, calculate_score, compare_cards, count_preferred_suit,
    roll_chance_cube, roll_dice,
};
pub use entities::{
    BettingAction, Chips, GameSettings, GameState, GameStatus, GameView, Player, PlayerId,
    PlayerSummary, PlayerView, RemovedPlayer, RoomId,
};
pub use errors::GameError;
pub use events::{EventLog, EventRecord, GameEvent, SequenceNumber};
pub use phases::{GamePhase, TimeoutOutcome};
pub use round::{GameOverSummary, RoundSummary, SelectionOutcome};
