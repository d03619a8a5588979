//! Room actor: the single writer for a room's game state.
//!
//! Every inbound command for a room arrives as one message and is applied
//! as one scheduling step, so no two commands can interleave their
//! validate-then-mutate sequences. Events are appended to the room's log
//! and fanned out to subscribers in command order.

use std::collections::HashMap;

use tokio::{
    sync::mpsc,
    time::{Duration, sleep},
};
use uuid::Uuid;

use super::{
    config::RoomConfig,
    messages::{LeaveOutcome, RoomMessage, RoomSnapshot},
};
use crate::game::{
    BettingAction, BettingOutcome, DiceRoll, EventLog, EventRecord, GameError, GameEvent,
    GamePhase, GameState, GameStatus, PlayerId, PlayerSummary, RoomId, RoundSummary,
};

const INBOX_CAPACITY: usize = 100;

/// Handle for sending messages to a room actor.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    #[must_use]
    pub fn new(sender: mpsc::Sender<RoomMessage>, room_id: RoomId) -> Self {
        Self { sender, room_id }
    }

    #[must_use]
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Send a message to the room.
    pub async fn send(&self, message: RoomMessage) -> Result<(), GameError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| GameError::RoomClosed)
    }
}

/// Room actor owning one room's [`GameState`] and event log.
pub struct RoomActor {
    id: RoomId,
    config: RoomConfig,
    state: GameState,
    events: EventLog,
    inbox: mpsc::Receiver<RoomMessage>,

    /// Sender side of the inbox, kept for self-scheduled messages.
    self_sender: mpsc::Sender<RoomMessage>,

    /// Event fan-out targets, keyed by player.
    subscribers: HashMap<PlayerId, mpsc::Sender<EventRecord>>,

    /// Bumped whenever the phase or status changes. Scheduled messages echo
    /// the epoch they were created under; a stale one is dropped instead of
    /// mutating a room that has moved on.
    epoch: u64,

    /// Set on a fatal invariant violation; every later command is refused
    /// with the same error.
    poisoned: Option<GameError>,

    is_closed: bool,
}

impl RoomActor {
    /// Create a new room actor and its handle.
    #[must_use]
    pub fn new(config: RoomConfig) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let id = Uuid::new_v4();
        let state = GameState::new(id, (&config).into());
        let handle = RoomHandle::new(sender.clone(), id);
        let actor = Self {
            id,
            config,
            state,
            events: EventLog::new(),
            inbox,
            self_sender: sender,
            subscribers: HashMap::new(),
            epoch: 0,
            poisoned: None,
            is_closed: false,
        };
        (actor, handle)
    }

    /// Run the room's message loop until the room closes.
    pub async fn run(mut self) {
        log::info!("room {} '{}' starting", self.id, self.config.name);
        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.is_closed {
                break;
            }
        }
        log::info!("room {} '{}' closed", self.id, self.config.name);
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join { name, response } => {
                let result = self.handle_join(&name);
                let _ = response.send(result);
            }

            RoomMessage::Leave {
                player_id,
                response,
            } => {
                let result = self.handle_leave(&player_id);
                let _ = response.send(result);
            }

            RoomMessage::StartRound {
                dealer_id,
                response,
            } => {
                let result = self.handle_start_round(dealer_id.as_ref());
                let _ = response.send(result);
            }

            RoomMessage::RollDice { response } => {
                let result = self.handle_roll_dice();
                let _ = response.send(result);
            }

            RoomMessage::SelectCards {
                player_id,
                indices,
                response,
            } => {
                let result = self.handle_select_cards(&player_id, &indices);
                let _ = response.send(result);
            }

            RoomMessage::ContinuePlaying {
                player_id,
                response,
            } => {
                let result = self.handle_continue(&player_id);
                let _ = response.send(result);
            }

            RoomMessage::Fold {
                player_id,
                response,
            } => {
                let result = self.handle_fold(&player_id);
                let _ = response.send(result);
            }

            RoomMessage::ImproveCards {
                player_id,
                indices,
                response,
            } => {
                let result = self.handle_improve_cards(&player_id, &indices);
                let _ = response.send(result);
            }

            RoomMessage::EndRound {
                immediate,
                response,
            } => {
                let result = self.handle_end_round(immediate);
                let _ = response.send(result);
            }

            RoomMessage::PhaseTimeout { epoch, response } => {
                let result = self.handle_phase_timeout(epoch);
                let _ = response.send(result);
            }

            RoomMessage::FinishRoundReset { epoch } => {
                self.handle_finish_round_reset(epoch);
            }

            RoomMessage::GetSnapshot { response } => {
                let _ = response.send(RoomSnapshot {
                    epoch: self.epoch,
                    game: self.state.view(),
                });
            }

            RoomMessage::GetEvents { after, response } => {
                let _ = response.send(self.events.records_since(after).to_vec());
            }

            RoomMessage::Subscribe { player_id, sender } => {
                self.subscribers.insert(player_id, sender);
                log::debug!("room {}: player {player_id} subscribed", self.id);
            }

            RoomMessage::Unsubscribe { player_id } => {
                self.subscribers.remove(&player_id);
                log::debug!("room {}: player {player_id} unsubscribed", self.id);
            }

            RoomMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    /// Gate every state-changing command: a poisoned room refuses
    /// everything, and the dealer-rotation invariant is re-checked before
    /// any mutation. Returns the phase/status pair used by `commit` to
    /// decide whether the epoch moves.
    fn begin(&mut self) -> Result<(GamePhase, GameStatus), GameError> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        if let Err(err) = self.state.validate_dealer_rotation() {
            log::error!("room {}: invariant violation: {err}", self.id);
            self.poisoned = Some(err.clone());
            return Err(err);
        }
        Ok((self.state.current_phase, self.state.status))
    }

    fn poison(&mut self, err: &GameError) {
        if err.is_fatal() {
            log::error!("room {}: fatal engine error: {err}", self.id);
            self.poisoned = Some(err.clone());
        }
    }

    /// Record this command's events plus the trailing `gameStateUpdated`,
    /// bumping the timer epoch if the phase or status moved.
    fn commit(
        &mut self,
        before: (GamePhase, GameStatus),
        events: Vec<(GameEvent, Option<PlayerId>)>,
    ) {
        if (self.state.current_phase, self.state.status) != before {
            self.epoch += 1;
        }
        for (event, player_id) in events {
            self.publish(event, player_id);
        }
        let state = self.state.view();
        self.publish(GameEvent::GameStateUpdated { state }, None);
    }

    fn publish(&mut self, event: GameEvent, player_id: Option<PlayerId>) {
        let record = self.events.append(event, player_id);
        let room_id = self.id;
        self.subscribers
            .retain(|subscriber, sender| match sender.try_send(record.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("room {room_id}: subscriber {subscriber} full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("room {room_id}: subscriber {subscriber} disconnected, removing");
                    false
                }
            });
    }

    /// Run the controller-internal follow-ups a phase advance demands: the
    /// sabacc shift fires as soon as the first betting phase completes, and
    /// each freshly opened betting phase is announced.
    fn follow_phase_advance(
        &mut self,
        advanced_to: Option<GamePhase>,
        events: &mut Vec<(GameEvent, Option<PlayerId>)>,
    ) -> Result<(), GameError> {
        match advanced_to {
            Some(GamePhase::FirstBetting) => {
                events.push((GameEvent::BettingPhaseStarted { room_id: self.id }, None));
            }
            Some(GamePhase::SabaccShift) => {
                if let Err(err) = self.state.handle_sabacc_shift() {
                    self.poison(&err);
                    return Err(err);
                }
                events.push((GameEvent::BettingPhaseStarted { room_id: self.id }, None));
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_join(&mut self, name: &str) -> Result<PlayerSummary, GameError> {
        let before = self.begin()?;
        let summary = self.state.add_player(name)?;
        log::info!(
            "room {}: {} joined with {} chips",
            self.id,
            summary.name,
            summary.chips
        );
        self.commit(
            before,
            vec![(
                GameEvent::PlayerJoined {
                    player: summary.clone(),
                },
                Some(summary.id),
            )],
        );
        Ok(summary)
    }

    fn handle_leave(&mut self, player_id: &PlayerId) -> Result<LeaveOutcome, GameError> {
        let before = self.begin()?;
        let removed = self.state.remove_player(player_id)?;
        self.subscribers.remove(player_id);
        let outcome = LeaveOutcome {
            name: removed.name.clone(),
            room_destroyed: removed.room_destroyed,
        };
        if outcome.room_destroyed {
            // Tear down before anything else can fire; scheduled messages
            // die with the inbox.
            self.is_closed = true;
            log::info!("room {}: last player left, destroying room", self.id);
            return Ok(outcome);
        }
        let mut events = vec![(
            GameEvent::PlayerLeft { name: removed.name },
            Some(*player_id),
        )];
        if removed.betting_completed {
            events.push((GameEvent::BettingPhaseCompleted { room_id: self.id }, None));
        }
        self.follow_phase_advance(removed.advanced_to, &mut events)?;
        log::info!("room {}: {} left", self.id, outcome.name);
        self.commit(before, events);
        Ok(outcome)
    }

    fn handle_start_round(&mut self, dealer_id: Option<&PlayerId>) -> Result<(), GameError> {
        let before = self.begin()?;
        if let Err(err) = self.state.start_round(dealer_id) {
            self.poison(&err);
            return Err(err);
        }
        self.commit(before, Vec::new());
        Ok(())
    }

    fn handle_roll_dice(&mut self) -> Result<DiceRoll, GameError> {
        let before = self.begin()?;
        let roll = self.state.roll_dice_for_round()?;
        self.commit(
            before,
            vec![(
                GameEvent::DiceRolled {
                    room_id: self.id,
                    dice_roll: roll,
                },
                None,
            )],
        );
        Ok(roll)
    }

    fn handle_select_cards(
        &mut self,
        player_id: &PlayerId,
        indices: &[usize],
    ) -> Result<(), GameError> {
        let before = self.begin()?;
        let outcome = self.state.select_cards(player_id, indices)?;
        let mut events = vec![(
            GameEvent::CardsSelected {
                room_id: self.id,
                player_id: *player_id,
            },
            Some(*player_id),
        )];
        self.follow_phase_advance(outcome.advanced_to, &mut events)?;
        self.commit(before, events);
        Ok(())
    }

    fn handle_continue(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        let before = self.begin()?;
        let outcome = self.state.continue_playing(player_id)?;
        self.finish_betting_action(*player_id, outcome, before)
    }

    fn handle_fold(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        let before = self.begin()?;
        let outcome = self.state.fold(player_id)?;
        self.finish_betting_action(*player_id, outcome, before)
    }

    fn finish_betting_action(
        &mut self,
        player_id: PlayerId,
        outcome: BettingOutcome,
        before: (GamePhase, GameStatus),
    ) -> Result<(), GameError> {
        let mut events = vec![(
            GameEvent::PlayerActed {
                player_id,
                action: outcome.action,
            },
            Some(player_id),
        )];
        if outcome.betting_complete {
            events.push((GameEvent::BettingPhaseCompleted { room_id: self.id }, None));
        }
        self.follow_phase_advance(outcome.advanced_to, &mut events)?;
        self.commit(before, events);
        Ok(())
    }

    fn handle_improve_cards(
        &mut self,
        player_id: &PlayerId,
        indices: &[usize],
    ) -> Result<(), GameError> {
        let before = self.begin()?;
        self.state.improve_cards(player_id, indices)?;
        self.commit(
            before,
            vec![(
                GameEvent::CardsImproved {
                    room_id: self.id,
                    player_id: *player_id,
                },
                Some(*player_id),
            )],
        );
        Ok(())
    }

    fn handle_end_round(&mut self, immediate: bool) -> Result<RoundSummary, GameError> {
        let before = self.begin()?;
        let summary = match self.state.end_round() {
            Ok(summary) => summary,
            Err(err) => {
                self.poison(&err);
                return Err(err);
            }
        };
        let mut events = vec![(
            GameEvent::RoundEnded {
                winner: summary.winner.clone(),
                pot: summary.pot,
                tiebreaker_used: summary.tiebreaker_used,
            },
            None,
        )];
        if let Some(game_over) = &summary.game_over {
            events.push((
                GameEvent::GameEnded {
                    winner: game_over.winner.clone(),
                    final_chips: game_over.final_chips,
                    all_players: game_over.all_players.clone(),
                },
                None,
            ));
        } else if immediate {
            self.state.finish_round_reset()?;
        }
        self.commit(before, events);
        if summary.game_over.is_none() && !immediate {
            self.schedule_round_reset();
        }
        Ok(summary)
    }

    /// Re-enter the delayed `round_end -> setup` transition through our own
    /// queue, stamped with the current epoch.
    fn schedule_round_reset(&self) {
        let sender = self.self_sender.clone();
        let epoch = self.epoch;
        let delay = Duration::from_millis(self.config.round_end_delay_ms);
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = sender.send(RoomMessage::FinishRoundReset { epoch }).await;
        });
    }

    fn handle_phase_timeout(&mut self, epoch: u64) -> Result<(), GameError> {
        if epoch != self.epoch {
            log::debug!("room {}: dropping stale phase timeout (epoch {epoch})", self.id);
            return Ok(());
        }
        let before = self.begin()?;
        let outcome = self.state.apply_phase_timeout()?;
        if outcome.is_noop() {
            return Ok(());
        }
        let mut events = Vec::new();
        for player_id in &outcome.auto_selected {
            events.push((
                GameEvent::CardsSelected {
                    room_id: self.id,
                    player_id: *player_id,
                },
                Some(*player_id),
            ));
        }
        for player_id in &outcome.auto_folded {
            events.push((
                GameEvent::PlayerActed {
                    player_id: *player_id,
                    action: BettingAction::Fold,
                },
                Some(*player_id),
            ));
        }
        for player_id in &outcome.auto_improved {
            events.push((
                GameEvent::CardsImproved {
                    room_id: self.id,
                    player_id: *player_id,
                },
                Some(*player_id),
            ));
        }
        if outcome.betting_completed {
            events.push((GameEvent::BettingPhaseCompleted { room_id: self.id }, None));
        }
        self.follow_phase_advance(outcome.advanced_to, &mut events)?;
        self.commit(before, events);
        Ok(())
    }

    fn handle_finish_round_reset(&mut self, epoch: u64) {
        if epoch != self.epoch || self.poisoned.is_some() {
            log::debug!("room {}: dropping stale round reset (epoch {epoch})", self.id);
            return;
        }
        let before = (self.state.current_phase, self.state.status);
        if let Err(err) = self.state.finish_round_reset() {
            log::debug!("room {}: round reset skipped: {err}", self.id);
            return;
        }
        self.commit(before, Vec::new());
    }
}
