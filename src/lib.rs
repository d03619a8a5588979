//! # Sabacc Engine
//!
//! An authoritative round engine for the "Coruscant Shift" sabacc variant:
//! phase state machine, dealer rotation, turn-based betting, and
//! multi-stage winner determination.
//!
//! ## Architecture
//!
//! A round cycles through nine phases:
//!
//! - **Setup**: waiting for the dealer to open the round
//! - **InitialRoll**: the gold and silver dice fix the target number and
//!   preferred suit
//! - **Selection**: players stake cards from their hand as a public wager
//! - **FirstBetting**: continue/fold, dealer first, clockwise
//! - **SabaccShift**: un-selected cards are discarded and replaced
//! - **SecondBetting**: a second continue/fold pass
//! - **Improve**: players finalize their wager from the post-shift hand
//! - **Reveal**: wagers are compared (score, suit count, card draw, chance
//!   cubes)
//! - **RoundEnd**: the pot is awarded and the dealer seat rotates
//!
//! Each seated player deals exactly one round; once everyone has dealt, the
//! chip leader wins the game.
//!
//! ## Core Modules
//!
//! - [`game`]: deck math, entities, the phase machine, betting, round
//!   resolution, and the event log
//! - [`room`]: per-room single-writer actors and the room coordinator
//!
//! ## Example
//!
//! ```
//! use sabacc_engine::{GameSettings, GameState};
//! use uuid::Uuid;
//!
//! let mut game = GameState::new(Uuid::new_v4(), GameSettings::default());
//! let alice = game.add_player("alice").unwrap();
//! let bob = game.add_player("bob").unwrap();
//! game.start_round(Some(&alice.id)).unwrap();
//! assert!(game.player(&bob.id).is_some());
//! ```

/// Core game logic, entities, and the phase state machine.
pub mod game;
pub use game::{
    BettingAction, Card, Chips, Deck, DiceRoll, EventLog, EventRecord, GameError, GameEvent,
    GamePhase, GameSettings, GameState, GameStatus, GameView, Player, PlayerId, PlayerSummary,
    RoomId, RoundSummary, SequenceNumber, Suit,
    constants::{self, DECK_SIZE, HAND_SIZE, MAX_SEATS, MIN_PLAYERS},
};

/// Room actors and coordination.
pub mod room;
pub use room::{RoomActor, RoomConfig, RoomHandle, RoomManager};
