//! Table fixtures shared by the unit tests.

use crate::card::*;
use crate::state::*;

pub fn card(rank: Rank, suit: Suit) -> Card {
    Card::new(rank, suit)
}

/// Two joined players; joining the second one deals a shuffled round.
pub fn two_player_game() -> (Game, PlayerId, PlayerId) {
    let mut game = Game::default();
    let a = PlayerId::new_v4();
    let b = PlayerId::new_v4();
    game.join(a, "Alice").unwrap();
    game.join(b, "Bob").unwrap();
    (game, a, b)
}

/// Seats `n` players without dealing, so a test can deal a rigged deck.
pub fn seat(game: &mut Game, n: usize) -> Vec<PlayerId> {
    (0..n)
        .map(|i| {
            let id = PlayerId::new_v4();
            game.players.insert(id, Player::new(id, format!("Player {}", i + 1)));
            game.turn_order.push(id);
            id
        })
        .collect()
}

pub fn seat_two(game: &mut Game) -> (PlayerId, PlayerId) {
    let ids = seat(game, 2);
    (ids[0], ids[1])
}

/// A full 52 card deck that deals `top` first, in order, then the remaining
/// cards in suit order starting from the Two of Hearts.
pub fn rigged_deck(top: &[Card]) -> Pile {
    let mut cards: Vec<Card> = Pile::full_deck()
        .cards()
        .iter()
        .filter(|c| !top.contains(c))
        .rev()
        .copied()
        .collect();
    cards.extend(top.iter().rev());
    Pile { cards }
}

/// The first `n` cards in suit order whose value differs from every card in `avoid`.
pub fn filler(n: usize, avoid: &[Card]) -> Vec<Card> {
    Pile::full_deck()
        .cards()
        .iter()
        .filter(|c| avoid.iter().all(|a| a.value() != c.value()))
        .take(n)
        .copied()
        .collect()
}
