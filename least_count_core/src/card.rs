use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DECK_SIZE: usize = 52;

// --- Core data structures ---

/// Suit
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

/// Rank
///
/// Ace scores low (1), so it sits before Two in the derived ordering.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven, Rank::Eight,
        Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];

    /// Scoring value used by group discards, same-number skips and `show`.
    pub fn value(self) -> u32 {
        match self {
            Rank::Ace => 1,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 11,
            Rank::Queen => 12,
            Rank::King => 13,
        }
    }
}

/// A single playing card.
///
/// On the wire a card travels in its display form, e.g. `"10 of Hearts"`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub fn value(&self) -> u32 {
        self.rank.value()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardParseError {
    #[error("expected \"<rank> of <suit>\", got {0:?}")]
    Format(String),
    #[error("unknown rank {0:?}")]
    Rank(String),
    #[error("unknown suit {0:?}")]
    Suit(String),
}

// --- Display / parsing ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Hearts => "Hearts",
            Suit::Diamonds => "Diamonds",
            Suit::Clubs => "Clubs",
            Suit::Spades => "Spades",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rank::Jack => write!(f, "Jack"),
            Rank::Queen => write!(f, "Queen"),
            Rank::King => write!(f, "King"),
            Rank::Ace => write!(f, "Ace"),
            pip => write!(f, "{}", pip.value()),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} of {}", self.rank, self.suit)
    }
}

impl FromStr for Suit {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Suit::ALL
            .into_iter()
            .find(|suit| suit.to_string() == s)
            .ok_or_else(|| CardParseError::Suit(s.to_string()))
    }
}

impl FromStr for Rank {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.to_string() == s)
            .ok_or_else(|| CardParseError::Rank(s.to_string()))
    }
}

impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rank, suit) = s
            .trim()
            .split_once(" of ")
            .ok_or_else(|| CardParseError::Format(s.to_string()))?;
        Ok(Card::new(rank.parse()?, suit.parse()?))
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.to_string()
    }
}

impl TryFrom<String> for Card {
    type Error = CardParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// --- Piles ---

/// An ordered stack of cards. The top is the end of the vector.
///
/// Used both for the draw deck and the discard pile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pile {
    pub(crate) cards: Vec<Card>,
}

impl Pile {
    pub fn new() -> Self {
        Self::default()
    }

    /// All 52 cards, suit by suit, unshuffled.
    pub fn full_deck() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                cards.push(Card { rank, suit });
            }
        }
        Pile { cards }
    }

    /// A full deck in uniformly random order.
    pub fn shuffled_deck() -> Self {
        let mut deck = Self::full_deck();
        deck.shuffle(&mut rand::rng());
        deck
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes and returns the top card.
    pub fn deal(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Slides a card under the whole pile, so it is dealt last.
    pub fn put_bottom(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Extend<Card> for Pile {
    fn extend<T: IntoIterator<Item = Card>>(&mut self, iter: T) {
        self.cards.extend(iter);
    }
}
