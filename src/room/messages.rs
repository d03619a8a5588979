//! Room actor message types.

use tokio::sync::{mpsc, oneshot};

use crate::game::{
    DiceRoll, EventRecord, GameError, GameView, PlayerId, PlayerSummary, RoundSummary,
    SequenceNumber,
};

/// Messages routed to a `RoomActor`: one variant per inbound command, each
/// carrying its own response channel.
#[derive(Debug)]
pub enum RoomMessage {
    /// Seat a new player.
    Join {
        name: String,
        response: oneshot::Sender<Result<PlayerSummary, GameError>>,
    },

    /// Remove a player; destroys the room when the last one leaves.
    Leave {
        player_id: PlayerId,
        response: oneshot::Sender<Result<LeaveOutcome, GameError>>,
    },

    /// Open a round. `dealer_id` is the caller's claim to the deal.
    StartRound {
        dealer_id: Option<PlayerId>,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Roll the gold and silver dice for the round.
    RollDice {
        response: oneshot::Sender<Result<DiceRoll, GameError>>,
    },

    /// Stake a wager from the dealt hand.
    SelectCards {
        player_id: PlayerId,
        indices: Vec<usize>,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Pay the continue cost and stay in the round.
    ContinuePlaying {
        player_id: PlayerId,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Leave the round, forfeiting any claim on the pot.
    Fold {
        player_id: PlayerId,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Finalize the wager from the post-shift hand.
    ImproveCards {
        player_id: PlayerId,
        indices: Vec<usize>,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Resolve the round. `immediate` skips the reopening delay.
    EndRound {
        immediate: bool,
        response: oneshot::Sender<Result<RoundSummary, GameError>>,
    },

    /// Apply the current phase's deadline action. A stale epoch is a no-op.
    PhaseTimeout {
        epoch: u64,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Internal: delayed tail of `EndRound`, scheduled by the actor itself.
    FinishRoundReset { epoch: u64 },

    /// Read-only state snapshot.
    GetSnapshot {
        response: oneshot::Sender<RoomSnapshot>,
    },

    /// Stable prefix of the event log after a sequence number.
    GetEvents {
        after: SequenceNumber,
        response: oneshot::Sender<Vec<EventRecord>>,
    },

    /// Subscribe to event fan-out.
    Subscribe {
        player_id: PlayerId,
        sender: mpsc::Sender<EventRecord>,
    },

    /// Drop a subscription.
    Unsubscribe { player_id: PlayerId },

    /// Close the room.
    Close { response: oneshot::Sender<()> },
}

/// Result of a leave request.
#[derive(Clone, Debug)]
pub struct LeaveOutcome {
    pub name: String,
    pub room_destroyed: bool,
}

/// Read-only snapshot, carrying the timer epoch external schedulers must
/// echo back with `PhaseTimeout`.
#[derive(Clone, Debug)]
pub struct RoomSnapshot {
    pub epoch: u64,
    pub game: GameView,
}
