use crate::error::JoinError;
use crate::state::*;
use tracing::info;

// --- Seating ---

impl Game {
    /// Seats a new connection.
    ///
    /// Joining is only possible while no round is running. The join that brings
    /// the table to [`MIN_PLAYERS`] deals the first round. A blank nickname
    /// becomes `"Player <n>"`.
    pub fn join(&mut self, id: PlayerId, nickname: &str) -> Result<&Player, JoinError> {
        if self.players.contains_key(&id) {
            return Err(JoinError::AlreadyJoined);
        }
        if self.is_started() {
            return Err(JoinError::GameInProgress);
        }
        let max = self.max_players();
        if self.players.len() >= max {
            return Err(JoinError::TableFull(max));
        }

        let nickname = match nickname.trim() {
            "" => format!("Player {}", self.players.len() + 1),
            name => name.to_string(),
        };
        info!(%id, %nickname, "player joined");
        self.players.insert(id, Player::new(id, nickname));
        self.turn_order.push(id);

        if self.players.len() >= MIN_PLAYERS {
            self.start_game();
        }
        Ok(&self.players[&id])
    }

    /// Removes a player. Returns `false` if they were not seated.
    ///
    /// The turn moves on before the player is purged, their pending discard
    /// lands on the discard pile and their hand goes under the deck. Dropping
    /// below [`MIN_PLAYERS`] suspends a started game.
    pub fn leave(&mut self, id: PlayerId) -> bool {
        if !self.players.contains_key(&id) {
            return false;
        }

        if self.current_turn == Some(id) {
            self.advance_turn();
            if self.current_turn == Some(id) {
                self.current_turn = None;
            }
        }
        self.turn_order.retain(|p| *p != id);
        if let Some(player) = self.players.remove(&id) {
            info!(%id, nickname = %player.nickname, "player left");
            for card in player.hand {
                self.deck.put_bottom(card);
            }
        }
        if let Some(result) = self.round_result.as_mut() {
            result.remove(&id);
        }

        if self.players.len() < MIN_PLAYERS {
            if self.is_started() {
                info!(remaining = self.players.len(), "not enough players, game suspended");
                self.phase = GamePhase::Suspended;
            }
            self.resolve_pending();
            self.current_turn = None;
        }
        true
    }
}
