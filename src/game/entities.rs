//! Game entities: players, the per-room aggregate, and public views.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use super::{
    cards::{Card, Deck, DiceRoll, Suit, Value},
    constants::{HAND_SIZE, MAX_SEATS, MIN_PLAYERS},
    errors::GameError,
    phases::GamePhase,
};

/// Type alias for whole chips. Stakes are small integers; an unsigned type
/// makes negative balances unrepresentable.
pub type Chips = u32;

/// Stable player identifier, unique within a room.
pub type PlayerId = Uuid;

/// Room identifier.
pub type RoomId = Uuid;

// Default table stakes. A starting stack bankrolls twenty antes, or ten
// rounds of ante plus a continue at both betting phases.
pub const DEFAULT_STARTING_CHIPS: Chips = 100;
pub const DEFAULT_ANTE: Chips = 5;
pub const DEFAULT_CONTINUE_COST: Chips = 5;

/// The two legal betting actions.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BettingAction {
    Continue,
    Fold,
}

impl fmt::Display for BettingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Continue => "continues",
            Self::Fold => "folds",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    InProgress,
    Ended,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Ended => "ended",
        };
        write!(f, "{repr}")
    }
}

/// Game configuration settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub starting_chips: Chips,
    pub ante: Chips,
    pub continue_cost: Chips,
    pub min_players: usize,
    pub max_players: usize,
    pub hand_size: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            starting_chips: DEFAULT_STARTING_CHIPS,
            ante: DEFAULT_ANTE,
            continue_cost: DEFAULT_CONTINUE_COST,
            min_players: MIN_PLAYERS,
            max_players: MAX_SEATS,
            hand_size: HAND_SIZE,
        }
    }
}

/// A seated player.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub chips: Chips,
    /// Private hand, in deal order.
    pub hand: Vec<Card>,
    /// The player's public wager for the round.
    pub selected_cards: Vec<Card>,
    /// False once folded out of the round.
    pub is_active: bool,
    pub has_acted: bool,
    pub betting_action: Option<BettingAction>,
}

impl Player {
    #[must_use]
    pub fn new(name: &str, chips: Chips) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            chips,
            hand: Vec::new(),
            selected_cards: Vec::new(),
            is_active: true,
            has_acted: false,
            betting_action: None,
        }
    }

    /// Clear per-round state ahead of a new deal.
    pub fn reset_for_round(&mut self) {
        self.hand.clear();
        self.selected_cards.clear();
        self.is_active = true;
        self.reset_betting_flags();
    }

    /// Clear per-betting-phase state.
    pub fn reset_betting_flags(&mut self) {
        self.has_acted = false;
        self.betting_action = None;
    }
}

/// Public projection of a player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub chips: Chips,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            chips: player.chips,
        }
    }
}

/// Per-player slice of a [`GameView`]. Hands stay private; only their size
/// is published. Selections are the public wager.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub chips: Chips,
    pub hand_size: usize,
    pub selected_cards: Vec<Card>,
    pub is_active: bool,
    pub has_acted: bool,
    pub betting_action: Option<BettingAction>,
}

/// Public projection of a room's [`GameState`], shipped with every
/// `gameStateUpdated` event and snapshot query.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GameView {
    pub id: RoomId,
    pub status: GameStatus,
    pub current_phase: GamePhase,
    pub players: Vec<PlayerView>,
    pub deck_size: usize,
    pub pot: Chips,
    pub current_dice_roll: Option<DiceRoll>,
    pub target_number: Option<Value>,
    pub preferred_suit: Option<Suit>,
    pub round_number: u32,
    pub dealer_index: usize,
    pub continue_cost: Chips,
    pub betting_phase_started: bool,
    pub betting_round_complete: bool,
    pub current_player: Option<PlayerId>,
    pub host_id: Option<PlayerId>,
}

/// Result of removing a player mid-session.
#[derive(Clone, Debug)]
pub struct RemovedPlayer {
    pub name: String,
    /// True when the last player left and the room should be torn down.
    pub room_destroyed: bool,
    /// True when the departure finished an in-flight betting round.
    pub betting_completed: bool,
    pub advanced_to: Option<GamePhase>,
}

/// The aggregate root: one per room, exclusively owned by the room's actor.
#[derive(Clone, Debug)]
pub struct GameState {
    pub id: RoomId,
    pub status: GameStatus,
    pub current_phase: GamePhase,
    /// Seating order; also the dealer rotation order.
    pub players: Vec<Player>,
    pub deck: Deck,
    pub pot: Chips,
    pub current_dice_roll: Option<DiceRoll>,
    pub target_number: Option<Value>,
    pub preferred_suit: Option<Suit>,
    /// 0 before the first round, 1 once it starts.
    pub round_number: u32,
    pub dealer_index: usize,
    /// Fixed price of a `continue` betting action.
    pub continue_cost: Chips,
    pub betting_phase_started: bool,
    pub betting_round_complete: bool,
    /// Whose turn it is to bet, while a betting phase runs.
    pub current_player: Option<PlayerId>,
    /// Ids of players who have already opened a round as dealer.
    pub dealers_used: HashSet<PlayerId>,
    pub host_id: Option<PlayerId>,
    /// Set by the betting subsystem when a fold leaves exactly one active
    /// player; consumed exactly once by `end_round`.
    pub pending_winner: Option<PlayerId>,
    /// Antes for the upcoming round are already in the pot.
    pub(crate) antes_collected: bool,
    pub(crate) settings: GameSettings,
}

impl GameState {
    #[must_use]
    pub fn new(id: RoomId, settings: GameSettings) -> Self {
        Self {
            id,
            status: GameStatus::Waiting,
            current_phase: GamePhase::Setup,
            players: Vec::with_capacity(settings.max_players),
            deck: Deck::new(),
            pot: 0,
            current_dice_roll: None,
            target_number: None,
            preferred_suit: None,
            round_number: 0,
            dealer_index: 0,
            continue_cost: settings.continue_cost,
            betting_phase_started: false,
            betting_round_complete: false,
            current_player: None,
            dealers_used: HashSet::new(),
            host_id: None,
            pending_winner: None,
            antes_collected: false,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub(crate) fn player_index(&self, id: &PlayerId) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.id == *id)
            .ok_or(GameError::PlayerNotFound)
    }

    #[must_use]
    pub fn active_player_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active).count()
    }

    /// Seat a new player. The first to join hosts the room.
    pub fn add_player(&mut self, name: &str) -> Result<PlayerSummary, GameError> {
        match self.status {
            GameStatus::InProgress => return Err(GameError::GameAlreadyInProgress),
            GameStatus::Ended => return Err(GameError::GameOver),
            GameStatus::Waiting => {}
        }
        if self.players.len() >= self.settings.max_players {
            return Err(GameError::CapacityReached);
        }
        if self.players.iter().any(|p| p.name == name) {
            return Err(GameError::AlreadyJoined);
        }
        let player = Player::new(name, self.settings.starting_chips);
        let summary = PlayerSummary::from(&player);
        if self.host_id.is_none() {
            self.host_id = Some(player.id);
        }
        self.players.push(player);
        Ok(summary)
    }

    /// Remove a player, fixing up the dealer seat, the host, any in-flight
    /// betting scan, and the pending winner.
    pub fn remove_player(&mut self, id: &PlayerId) -> Result<RemovedPlayer, GameError> {
        let idx = self.player_index(id)?;
        let player = self.players.remove(idx);
        if idx < self.dealer_index {
            self.dealer_index -= 1;
        }
        if self.dealer_index >= self.players.len() {
            self.dealer_index = 0;
        }
        if self.host_id == Some(player.id) {
            self.host_id = self.players.first().map(|p| p.id);
        }
        if self.pending_winner == Some(player.id) {
            self.pending_winner = None;
        }
        let mut outcome = RemovedPlayer {
            name: player.name,
            room_destroyed: self.players.is_empty(),
            betting_completed: false,
            advanced_to: None,
        };
        if self.status == GameStatus::InProgress && !outcome.room_destroyed {
            // A mid-round departure behaves like a fold.
            if self.pending_winner.is_none()
                && self.round_in_flight()
                && self.active_player_count() == 1
            {
                self.pending_winner = self.players.iter().find(|p| p.is_active).map(|p| p.id);
            }
            if self.betting_phase_started && !self.betting_round_complete {
                match self.next_to_act() {
                    Some(next) => self.current_player = Some(next.id),
                    None => {
                        let to = self.finish_betting_round()?;
                        outcome.betting_completed = true;
                        outcome.advanced_to = Some(to);
                    }
                }
            }
        }
        Ok(outcome)
    }

    pub(crate) fn round_in_flight(&self) -> bool {
        !matches!(self.current_phase, GamePhase::Setup | GamePhase::RoundEnd)
    }

    /// Whether every seated player can afford the next ante.
    #[must_use]
    pub fn can_collect_antes(&self) -> bool {
        self.players.iter().all(|p| p.chips >= self.settings.ante)
    }

    /// Deduct the ante from every seated player into the pot. All balances
    /// are validated before any is touched.
    pub fn collect_antes(&mut self) -> Result<(), GameError> {
        let ante = self.settings.ante;
        if let Some(short) = self.players.iter().find(|p| p.chips < ante) {
            return Err(GameError::InsufficientChips {
                required: ante,
                available: short.chips,
            });
        }
        for player in &mut self.players {
            player.chips -= ante;
        }
        self.pot += ante * self.players.len() as Chips;
        self.antes_collected = true;
        Ok(())
    }

    /// Move the whole pot to `winner`, returning the amount awarded.
    pub(crate) fn award_pot(&mut self, winner: &PlayerId) -> Result<Chips, GameError> {
        let idx = self.player_index(winner)?;
        let amount = self.pot;
        self.players[idx].chips += amount;
        self.pot = 0;
        Ok(amount)
    }

    pub(crate) fn reset_players_for_round(&mut self) {
        for player in &mut self.players {
            player.reset_for_round();
        }
    }

    /// Public projection for `gameStateUpdated` and snapshot queries.
    #[must_use]
    pub fn view(&self) -> GameView {
        GameView {
            id: self.id,
            status: self.status,
            current_phase: self.current_phase,
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    chips: p.chips,
                    hand_size: p.hand.len(),
                    selected_cards: p.selected_cards.clone(),
                    is_active: p.is_active,
                    has_acted: p.has_acted,
                    betting_action: p.betting_action,
                })
                .collect(),
            deck_size: self.deck.len(),
            pot: self.pot,
            current_dice_roll: self.current_dice_roll,
            target_number: self.target_number,
            preferred_suit: self.preferred_suit,
            round_number: self.round_number,
            dealer_index: self.dealer_index,
            continue_cost: self.continue_cost,
            betting_phase_started: self.betting_phase_started,
            betting_round_complete: self.betting_round_complete,
            current_player: self.current_player,
            host_id: self.host_id,
        }
    }
}
