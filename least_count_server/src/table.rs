//! The table actor.
//!
//! One task owns the [`Game`] and the outbound queue of every seated
//! connection. Connection tasks only talk to it through a [`TableHandle`], so
//! every join, leave and action, together with the broadcast it triggers, is
//! applied to completion before the next message is looked at.

use least_count_core::{ClientMessage, Game, JoinError, PlayerAction, PlayerId, ServerMessage};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

pub const INBOX_CAPACITY: usize = 128;
pub const OUTBOX_CAPACITY: usize = 32;

/// Queue drained by a connection's writer task.
pub type Outbox = mpsc::Sender<ServerMessage>;

#[derive(Debug)]
pub enum TableMessage {
    Join {
        player_id: PlayerId,
        nickname: String,
        outbox: Outbox,
        response: oneshot::Sender<Result<(), JoinError>>,
    },
    Leave {
        player_id: PlayerId,
    },
    Action {
        player_id: PlayerId,
        message: ClientMessage,
    },
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table is closed")]
    Closed,
    #[error(transparent)]
    Join(#[from] JoinError),
}

/// Cheap, cloneable sender side of the table actor.
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
}

impl TableHandle {
    /// Seats `player_id`. On success `outbox` starts receiving a `Welcome` and snapshots.
    pub async fn join(&self, player_id: PlayerId, nickname: String, outbox: Outbox) -> Result<(), TableError> {
        let (response, rx) = oneshot::channel();
        self.send(TableMessage::Join { player_id, nickname, outbox, response }).await?;
        rx.await.map_err(|_| TableError::Closed)??;
        Ok(())
    }

    /// Safe to call more than once and after the table already dropped the player.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), TableError> {
        self.send(TableMessage::Leave { player_id }).await
    }

    pub async fn act(&self, player_id: PlayerId, message: ClientMessage) -> Result<(), TableError> {
        self.send(TableMessage::Action { player_id, message }).await
    }

    async fn send(&self, message: TableMessage) -> Result<(), TableError> {
        self.sender.send(message).await.map_err(|_| TableError::Closed)
    }
}

pub struct TableActor {
    game: Game,
    inbox: mpsc::Receiver<TableMessage>,
    connections: HashMap<PlayerId, Outbox>,
}

impl TableActor {
    pub fn new(game: Game) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let actor = TableActor { game, inbox, connections: HashMap::new() };
        (actor, TableHandle { sender })
    }

    /// Runs until every [`TableHandle`] is dropped.
    pub async fn run(mut self) {
        info!(cards_per_player = self.game.cards_per_player(), "table open");
        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
        }
        info!("table closed");
    }

    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join { player_id, nickname, outbox, response } => {
                let result = self.game.join(player_id, &nickname).map(|_| ());
                match &result {
                    Ok(()) => {
                        self.connections.insert(player_id, outbox);
                        if !self.deliver(player_id, ServerMessage::Welcome { your_id: player_id }) {
                            self.disconnect(player_id);
                        }
                        self.broadcast();
                    }
                    Err(error) => info!(%player_id, %error, "join refused"),
                }
                let _ = response.send(result);
            }
            TableMessage::Leave { player_id } => {
                if self.disconnect(player_id) {
                    self.broadcast();
                }
            }
            TableMessage::Action { player_id, message } => {
                let result = PlayerAction::try_from(message)
                    .and_then(|action| self.game.handle_action(player_id, action));
                match result {
                    Ok(()) => self.broadcast(),
                    Err(error) => {
                        debug!(%player_id, %error, "action rejected");
                        if !self.deliver(player_id, error.into()) && self.disconnect(player_id) {
                            self.broadcast();
                        }
                    }
                }
            }
        }
    }

    /// Pushes a fresh view to every seated player.
    ///
    /// A peer whose queue is closed or full is dropped from the table, and the
    /// remaining players get another pass reflecting that.
    fn broadcast(&mut self) {
        loop {
            let mut failed = Vec::new();
            for (player_id, view) in self.game.snapshots() {
                if !self.deliver(player_id, ServerMessage::GameStateSnapshot(view)) {
                    failed.push(player_id);
                }
            }
            if failed.is_empty() {
                return;
            }
            for player_id in failed {
                warn!(%player_id, "dropping unreachable player");
                self.disconnect(player_id);
            }
        }
    }

    /// Non-blocking hand-off to the connection's writer task.
    fn deliver(&self, player_id: PlayerId, message: ServerMessage) -> bool {
        let Some(outbox) = self.connections.get(&player_id) else {
            return false;
        };
        match outbox.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(%player_id, "outbound queue full");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Forgets the connection and unseats the player. Returns whether anything changed.
    fn disconnect(&mut self, player_id: PlayerId) -> bool {
        let had_connection = self.connections.remove(&player_id).is_some();
        let was_seated = self.game.leave(player_id);
        had_connection || was_seated
    }
}
