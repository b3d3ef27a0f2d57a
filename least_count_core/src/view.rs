use crate::card::Card;
use crate::state::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What one player is allowed to see of the table.
///
/// Only the viewer's own hand is included; everybody else is reduced to a
/// card count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerView {
    pub your_id: PlayerId,
    pub own_hand: Vec<Card>,
    pub player_summaries: BTreeMap<PlayerId, PlayerSummary>,
    pub turn_order: Vec<PlayerId>,
    pub deck_size: usize,
    pub discard_top: Option<Card>,
    pub pending_discard: Option<PendingDiscard>,
    pub current_turn_player_id: Option<PlayerId>,
    pub game_started: bool,
    pub phase: GamePhase,
    pub round_result: Option<RoundOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSummary {
    pub nickname: String,
    pub hand_size: usize,
}

impl Game {
    /// Projects the table for `viewer`. `None` if the viewer is not seated.
    pub fn view_for(&self, viewer: &PlayerId) -> Option<PlayerView> {
        let me = self.players.get(viewer)?;

        let player_summaries = self
            .players
            .values()
            .map(|p| (p.id, PlayerSummary { nickname: p.nickname.clone(), hand_size: p.hand.len() }))
            .collect();

        Some(PlayerView {
            your_id: *viewer,
            own_hand: me.hand.clone(),
            player_summaries,
            turn_order: self.turn_order.clone(),
            deck_size: self.deck.len(),
            discard_top: self.discard_pile.top().copied(),
            pending_discard: self.pending_discard.clone(),
            current_turn_player_id: self.current_turn,
            game_started: self.is_started(),
            phase: self.phase,
            round_result: self.round_result.as_ref().and_then(|r| r.get(viewer).copied()),
        })
    }

    /// One view per seated player, in turn order.
    pub fn snapshots(&self) -> Vec<(PlayerId, PlayerView)> {
        self.turn_order
            .iter()
            .filter_map(|id| self.view_for(id).map(|view| (*id, view)))
            .collect()
    }
}
