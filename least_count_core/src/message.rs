use crate::card::Card;
use crate::error::ActionError;
use crate::state::{PlayerAction, PlayerId};
use crate::view::PlayerView;
use serde::{Deserialize, Serialize};

// --- Client -> server ---
// Joining and leaving follow the connection itself, so only turn actions travel here.

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    DiscardCard,
    DrawCard,
    DrawFromDiscardPile,
    SameNumberSkip,
    Show,
    NewGame,
}

/// `{"action": "discard_card", "card": "Jack of Hearts"}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
}

// --- Server -> client ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    /// Sent once, privately, right after the connection took a seat.
    Welcome { your_id: PlayerId },
    /// The table as this connection is allowed to see it.
    /// Pushed to everybody after every accepted change.
    GameStateSnapshot(PlayerView),
    /// A refused action, a malformed message or a refused join.
    /// Only the connection that caused it receives this.
    Error { message: String },
}

impl TryFrom<ClientMessage> for PlayerAction {
    type Error = ActionError;

    fn try_from(msg: ClientMessage) -> Result<Self, Self::Error> {
        Ok(match msg.action {
            ActionKind::DiscardCard => PlayerAction::Discard(msg.card.ok_or(ActionError::MissingCard)?),
            ActionKind::DrawCard => PlayerAction::Draw,
            ActionKind::DrawFromDiscardPile => PlayerAction::DrawFromDiscard,
            ActionKind::SameNumberSkip => PlayerAction::SameNumberSkip,
            ActionKind::Show => PlayerAction::Show,
            ActionKind::NewGame => PlayerAction::NewGame,
        })
    }
}

impl From<PlayerAction> for ClientMessage {
    fn from(action: PlayerAction) -> Self {
        let (action, card) = match action {
            PlayerAction::Discard(card) => (ActionKind::DiscardCard, Some(card)),
            PlayerAction::Draw => (ActionKind::DrawCard, None),
            PlayerAction::DrawFromDiscard => (ActionKind::DrawFromDiscardPile, None),
            PlayerAction::SameNumberSkip => (ActionKind::SameNumberSkip, None),
            PlayerAction::Show => (ActionKind::Show, None),
            PlayerAction::NewGame => (ActionKind::NewGame, None),
        };
        ClientMessage { action, card }
    }
}

impl From<ActionError> for ServerMessage {
    fn from(error: ActionError) -> Self {
        ServerMessage::Error { message: error.to_string() }
    }
}
