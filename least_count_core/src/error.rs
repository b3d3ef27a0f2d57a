//! Errors reported back to the acting client. None of them change game state.

use crate::card::Card;
use thiserror::Error;

/// Why a turn action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("the game has not started")]
    GameNotStarted,
    #[error("the round is over, start a new game")]
    RoundOver,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("you have already discarded this turn")]
    AlreadyDiscarded,
    #[error("you must discard before drawing")]
    MustDiscardFirst,
    #[error("{0} is not in your hand")]
    CardNotInHand(Card),
    #[error("discard_card needs a card")]
    MissingCard,
    #[error("the deck is empty")]
    DeckEmpty,
    #[error("the discard pile is empty")]
    DiscardPileEmpty,
    #[error("none of your discarded cards match the top of the discard pile")]
    RankMismatch,
    #[error("at least {0} players are needed")]
    NotEnoughPlayers(usize),
    #[error("unknown player")]
    UnknownPlayer,
}

/// Why a connection could not take a seat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("a game is already in progress")]
    GameInProgress,
    #[error("this connection has already joined")]
    AlreadyJoined,
    #[error("the table is full ({0} players)")]
    TableFull(usize),
}
