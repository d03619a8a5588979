//! Room configuration models.

use serde::{Deserialize, Serialize};

use crate::game::{
    Chips, GameSettings,
    constants::{DECK_SIZE, HAND_SIZE, MAX_SEATS, MIN_PLAYERS},
    entities::{DEFAULT_ANTE, DEFAULT_CONTINUE_COST, DEFAULT_STARTING_CHIPS},
};

/// Room configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoomConfig {
    /// Display name for the room.
    pub name: String,

    /// Players required before a round can open.
    pub min_players: usize,

    /// Seat cap.
    pub max_players: usize,

    /// Stack every player sits down with.
    pub starting_chips: Chips,

    /// Paid into the pot by every player when a round opens.
    pub ante: Chips,

    /// Fixed price of a `continue` betting action.
    pub continue_cost: Chips,

    /// Cards dealt to each player.
    pub hand_size: usize,

    /// Delay between a round ending and the table reopening.
    pub round_end_delay_ms: u64,

    /// Advertised per-phase deadline for external schedulers.
    pub phase_timeout_secs: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "Coruscant Shift".to_string(),
            min_players: MIN_PLAYERS,
            max_players: MAX_SEATS,
            starting_chips: DEFAULT_STARTING_CHIPS,
            ante: DEFAULT_ANTE,
            continue_cost: DEFAULT_CONTINUE_COST,
            hand_size: HAND_SIZE,
            round_end_delay_ms: 5_000,
            phase_timeout_secs: 30,
        }
    }
}

impl RoomConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_players < MIN_PLAYERS {
            return Err(format!("Need at least {MIN_PLAYERS} players for a round"));
        }
        if self.max_players < self.min_players || self.max_players > MAX_SEATS {
            return Err(format!(
                "Max players must be between min players and {MAX_SEATS}"
            ));
        }
        if self.hand_size == 0 {
            return Err("Hand size must be at least 1".to_string());
        }
        // A seat consumes at most two hands' worth of cards: the deal, plus
        // a full redraw at the shift and a tiebreaker draw offset by the
        // card every seat must keep selected.
        if 2 * self.hand_size * self.max_players > DECK_SIZE {
            return Err(format!(
                "{} seats with {}-card hands can exhaust the {DECK_SIZE}-card deck",
                self.max_players, self.hand_size
            ));
        }
        if self.ante == 0 || self.continue_cost == 0 {
            return Err("Ante and continue cost must be positive".to_string());
        }
        if self.starting_chips < self.ante {
            return Err("Starting chips must cover at least one ante".to_string());
        }
        Ok(())
    }
}

impl From<&RoomConfig> for GameSettings {
    fn from(config: &RoomConfig) -> Self {
        Self {
            starting_chips: config.starting_chips,
            ante: config.ante,
            continue_cost: config.continue_cost,
            min_players: config.min_players,
            max_players: config.max_players,
            hand_size: config.hand_size,
        }
    }
}
