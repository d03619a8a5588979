//! Append-only, sequenced record of everything a room tells the outside
//! world.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    cards::DiceRoll,
    entities::{BettingAction, Chips, GameView, PlayerId, PlayerSummary, RoomId},
};

/// Position in a room's event log. Strictly increasing from 1; the
/// authoritative total order of everything that happened in the room.
pub type SequenceNumber = u64;

/// One variant per outbound notification; consumers match exhaustively.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum GameEvent {
    GameStateUpdated {
        state: GameView,
    },
    PlayerJoined {
        player: PlayerSummary,
    },
    PlayerLeft {
        name: String,
    },
    ErrorOccurred {
        message: String,
    },
    BettingPhaseStarted {
        room_id: RoomId,
    },
    PlayerActed {
        player_id: PlayerId,
        action: BettingAction,
    },
    BettingPhaseCompleted {
        room_id: RoomId,
    },
    DiceRolled {
        room_id: RoomId,
        dice_roll: DiceRoll,
    },
    CardsSelected {
        room_id: RoomId,
        player_id: PlayerId,
    },
    CardsImproved {
        room_id: RoomId,
        player_id: PlayerId,
    },
    RoundEnded {
        winner: PlayerSummary,
        pot: Chips,
        tiebreaker_used: bool,
    },
    GameEnded {
        winner: PlayerSummary,
        final_chips: Chips,
        all_players: Vec<PlayerSummary>,
    },
}

/// Envelope appended to the room's event log.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub sequence_number: SequenceNumber,
    /// Player the event originated from, when applicable.
    pub player_id: Option<PlayerId>,
    pub event: GameEvent,
}

impl EventRecord {
    /// JSON rendering for the transport boundary.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Per-room append-only event log.
#[derive(Clone, Debug)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_sequence: SequenceNumber,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_sequence: 1,
        }
    }

    /// Append `event`, stamping an id, a timestamp, and the next sequence
    /// number. Returns the stored record.
    pub fn append(&mut self, event: GameEvent, player_id: Option<PlayerId>) -> EventRecord {
        let record = EventRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sequence_number: self.next_sequence,
            player_id,
            event,
        };
        self.next_sequence += 1;
        self.records.push(record.clone());
        record
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with a sequence number strictly greater than `after`.
    /// Readers only ever see a stable prefix of the log.
    #[must_use]
    pub fn records_since(&self, after: SequenceNumber) -> &[EventRecord] {
        let start = self.records.partition_point(|r| r.sequence_number <= after);
        &self.records[start..]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
