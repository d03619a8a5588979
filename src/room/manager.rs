//! Room manager: spawns room actors and routes commands to them.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{RwLock, mpsc, oneshot};

use super::{
    actor::{RoomActor, RoomHandle},
    config::RoomConfig,
    messages::{LeaveOutcome, RoomMessage, RoomSnapshot},
};
use crate::game::{
    DiceRoll, EventRecord, GameError, PlayerId, PlayerSummary, RoomId, RoundSummary,
    SequenceNumber,
};

/// The single routing point for every room: maps room ids to actor handles
/// and forwards inbound commands.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,
}

impl RoomManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create and spawn a new room.
    pub async fn create_room(&self, config: RoomConfig) -> Result<RoomId, GameError> {
        config.validate().map_err(GameError::InvalidConfig)?;
        let (actor, handle) = RoomActor::new(config);
        let room_id = handle.room_id();

        let mut rooms = self.rooms.write().await;
        rooms.insert(room_id, handle);
        drop(rooms);

        tokio::spawn(actor.run());
        log::info!("created and spawned room {room_id}");
        Ok(room_id)
    }

    /// Get a room handle.
    pub async fn room(&self, room_id: RoomId) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).cloned()
    }

    async fn require_room(&self, room_id: RoomId) -> Result<RoomHandle, GameError> {
        self.room(room_id).await.ok_or(GameError::RoomNotFound)
    }

    /// Count of rooms currently running.
    pub async fn active_room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }

    /// Seat a player in a room.
    pub async fn join_room(
        &self,
        room_id: RoomId,
        name: &str,
    ) -> Result<PlayerSummary, GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::Join {
                name: name.to_string(),
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Remove a player; the room is torn down once the last one leaves.
    pub async fn leave_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::Leave {
                player_id,
                response: tx,
            })
            .await?;
        let outcome = rx.await.map_err(|_| GameError::RoomClosed)??;
        if outcome.room_destroyed {
            let mut rooms = self.rooms.write().await;
            rooms.remove(&room_id);
            drop(rooms);
            log::info!("room {room_id} destroyed (empty)");
        }
        Ok(outcome)
    }

    /// Open a round.
    pub async fn start_round(
        &self,
        room_id: RoomId,
        dealer_id: Option<PlayerId>,
    ) -> Result<(), GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::StartRound {
                dealer_id,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Roll the round's dice.
    pub async fn roll_dice(&self, room_id: RoomId) -> Result<DiceRoll, GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle.send(RoomMessage::RollDice { response: tx }).await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Stake a wager from the dealt hand.
    pub async fn select_cards(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        indices: Vec<usize>,
    ) -> Result<(), GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::SelectCards {
                player_id,
                indices,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Pay the continue cost and stay in the round.
    pub async fn continue_playing(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<(), GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::ContinuePlaying {
                player_id,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Fold out of the round.
    pub async fn fold(&self, room_id: RoomId, player_id: PlayerId) -> Result<(), GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::Fold {
                player_id,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Finalize the wager from the post-shift hand.
    pub async fn improve_cards(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        indices: Vec<usize>,
    ) -> Result<(), GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::ImproveCards {
                player_id,
                indices,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Resolve the round and award the pot.
    pub async fn end_round(
        &self,
        room_id: RoomId,
        immediate: bool,
    ) -> Result<RoundSummary, GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::EndRound {
                immediate,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Apply the current phase's deadline action on behalf of an external
    /// scheduler. `epoch` must come from a prior snapshot.
    pub async fn phase_timeout(&self, room_id: RoomId, epoch: u64) -> Result<(), GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::PhaseTimeout {
                epoch,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)?
    }

    /// Read-only snapshot of a room.
    pub async fn snapshot(&self, room_id: RoomId) -> Result<RoomSnapshot, GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::GetSnapshot { response: tx })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)
    }

    /// Stable prefix of a room's event log after `after`.
    pub async fn events_since(
        &self,
        room_id: RoomId,
        after: SequenceNumber,
    ) -> Result<Vec<EventRecord>, GameError> {
        let handle = self.require_room(room_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::GetEvents {
                after,
                response: tx,
            })
            .await?;
        rx.await.map_err(|_| GameError::RoomClosed)
    }

    /// Subscribe a player's channel to the room's event fan-out.
    pub async fn subscribe(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        sender: mpsc::Sender<EventRecord>,
    ) -> Result<(), GameError> {
        let handle = self.require_room(room_id).await?;
        handle
            .send(RoomMessage::Subscribe { player_id, sender })
            .await
    }

    /// Drop a player's subscription.
    pub async fn unsubscribe(&self, room_id: RoomId, player_id: PlayerId) -> Result<(), GameError> {
        let handle = self.require_room(room_id).await?;
        handle.send(RoomMessage::Unsubscribe { player_id }).await
    }

    /// Close a room and forget it.
    pub async fn close_room(&self, room_id: RoomId) -> Result<(), GameError> {
        if let Some(handle) = self.room(room_id).await {
            let (tx, rx) = oneshot::channel();
            handle.send(RoomMessage::Close { response: tx }).await?;
            let _ = rx.await;
        }
        let mut rooms = self.rooms.write().await;
        rooms.remove(&room_id);
        drop(rooms);
        log::info!("closed room {room_id}");
        Ok(())
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
