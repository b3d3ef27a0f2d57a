use crate::card::{Card, DECK_SIZE, Pile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type PlayerId = Uuid;

pub const MIN_PLAYERS: usize = 2;
pub const DEFAULT_CARDS_PER_PLAYER: usize = 7;

/// The single authoritative table.
///
/// Every mutation goes through the methods in `logic` and `registry`; the
/// server keeps exactly one of these inside its table actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub(crate) players: HashMap<PlayerId, Player>,
    // Fixed at game start, walked cyclically. Joins append, leaves remove in place.
    pub(crate) turn_order: Vec<PlayerId>,
    pub(crate) deck: Pile,
    pub(crate) discard_pile: Pile,
    pub(crate) pending_discard: Option<PendingDiscard>,
    pub(crate) current_turn: Option<PlayerId>,
    pub(crate) phase: GamePhase,
    pub(crate) round_result: Option<HashMap<PlayerId, RoundOutcome>>,
    pub(crate) cards_per_player: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub hand: Vec<Card>,
}

/// Cards thrown this half-turn, waiting for a draw, a pick-up or a skip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingDiscard {
    pub cards: Vec<Card>,
    pub owner: PlayerId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    NotStarted,
    /// Current player must discard.
    AwaitingDiscard,
    /// Current player has discarded and must draw, pick up, or skip.
    AwaitingResolution,
    /// Someone called `show`; only `new_game` moves on from here.
    RoundOver,
    /// A started game lost players below the minimum. Cards stay where they are.
    Suspended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoundOutcome {
    Winner,
    Loser,
}

/// A decoded, validated-for-shape player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Discard(Card),
    Draw,
    DrawFromDiscard,
    SameNumberSkip,
    Show,
    NewGame,
}

impl GamePhase {
    /// Whether a round is dealt and in play or just finished.
    pub fn is_started(self) -> bool {
        matches!(
            self,
            GamePhase::AwaitingDiscard | GamePhase::AwaitingResolution | GamePhase::RoundOver
        )
    }
}

impl Player {
    pub fn new(id: PlayerId, nickname: String) -> Self {
        Player { id, nickname, hand: Vec::new() }
    }

    pub fn hand_value(&self) -> u32 {
        self.hand.iter().map(Card::value).sum()
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new(DEFAULT_CARDS_PER_PLAYER)
    }
}

impl Game {
    pub fn new(cards_per_player: usize) -> Self {
        Game {
            players: HashMap::new(),
            turn_order: Vec::new(),
            deck: Pile::new(),
            discard_pile: Pile::new(),
            pending_discard: None,
            current_turn: None,
            phase: GamePhase::NotStarted,
            round_result: None,
            cards_per_player,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.phase.is_started()
    }

    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.current_turn
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }

    pub fn deck(&self) -> &Pile {
        &self.deck
    }

    pub fn discard_pile(&self) -> &Pile {
        &self.discard_pile
    }

    pub fn pending_discard(&self) -> Option<&PendingDiscard> {
        self.pending_discard.as_ref()
    }

    pub fn round_result(&self) -> Option<&HashMap<PlayerId, RoundOutcome>> {
        self.round_result.as_ref()
    }

    pub fn cards_per_player(&self) -> usize {
        self.cards_per_player
    }

    /// Largest table that still leaves one card for the opening discard.
    pub fn max_players(&self) -> usize {
        (DECK_SIZE - 1) / self.cards_per_player.max(1)
    }

    /// Cards currently accounted for across deck, hands, discard pile and pending discard.
    pub fn cards_in_play(&self) -> usize {
        self.deck.len()
            + self.players.values().map(|p| p.hand.len()).sum::<usize>()
            + self.discard_pile.len()
            + self.pending_discard.as_ref().map_or(0, |p| p.cards.len())
    }
}
