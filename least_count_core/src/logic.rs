use crate::card::*;
use crate::error::ActionError;
use crate::state::*;
use std::collections::HashMap;
use tracing::{debug, info, warn};

// --- Core game flow ---

impl Game {
    /// Deals a fresh round if the table is idle and has enough players.
    ///
    /// Returns `false` and leaves everything untouched when a round is already
    /// running or fewer than [`MIN_PLAYERS`] have joined.
    pub fn start_game(&mut self) -> bool {
        if self.is_started() {
            return false;
        }
        if self.players.len() < MIN_PLAYERS {
            info!(players = self.players.len(), "not enough players to start");
            return false;
        }
        self.deal_round(Pile::shuffled_deck());
        true
    }

    /// Resets the table from `deck` and deals a round.
    ///
    /// - clears hands, discard pile, pending discard and round result
    /// - deals `cards_per_player` cards round-robin in turn order
    /// - turns one more card face up as the opening discard
    /// - hands the first turn to `turn_order[0]`
    pub(crate) fn deal_round(&mut self, deck: Pile) {
        self.deck = deck;
        self.discard_pile.clear();
        self.pending_discard = None;
        self.round_result = None;
        for player in self.players.values_mut() {
            player.hand.clear();
        }

        for _ in 0..self.cards_per_player {
            for id in &self.turn_order {
                let Some(card) = self.deck.deal() else { break };
                if let Some(player) = self.players.get_mut(id) {
                    player.hand.push(card);
                }
            }
        }
        if let Some(card) = self.deck.deal() {
            self.discard_pile.push(card);
        }

        self.current_turn = self.turn_order.first().copied();
        self.phase = GamePhase::AwaitingDiscard;
        info!(
            players = self.turn_order.len(),
            deck = self.deck.len(),
            first = ?self.current_turn,
            "round dealt"
        );
    }

    /// Single entry point for decoded client actions.
    pub fn handle_action(&mut self, player_id: PlayerId, action: PlayerAction) -> Result<(), ActionError> {
        debug!(%player_id, ?action, "handling action");
        match action {
            PlayerAction::Discard(card) => self.discard_card(player_id, card),
            PlayerAction::Draw => self.draw_card(player_id),
            PlayerAction::DrawFromDiscard => self.draw_from_discard(player_id),
            PlayerAction::SameNumberSkip => self.same_rank_skip(player_id),
            PlayerAction::Show => self.show(player_id),
            PlayerAction::NewGame => self.new_game(player_id),
        }
    }

    /// Throws every card in hand that shares `card`'s value into the pending discard.
    pub fn discard_card(&mut self, player_id: PlayerId, card: Card) -> Result<(), ActionError> {
        self.check_turn(player_id)?;
        if self.pending_discard.is_some() {
            return Err(ActionError::AlreadyDiscarded);
        }
        let player = self.players.get_mut(&player_id).ok_or(ActionError::UnknownPlayer)?;
        if !player.hand.contains(&card) {
            return Err(ActionError::CardNotInHand(card));
        }

        let value = card.value();
        let (thrown, kept): (Vec<Card>, Vec<Card>) =
            std::mem::take(&mut player.hand).into_iter().partition(|c| c.value() == value);
        player.hand = kept;

        debug!(%player_id, count = thrown.len(), value, "discarded");
        self.pending_discard = Some(PendingDiscard { cards: thrown, owner: player_id });
        self.phase = GamePhase::AwaitingResolution;
        Ok(())
    }

    /// Draws from the deck, then settles the pending discard and passes the turn.
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<(), ActionError> {
        self.check_resolution(player_id)?;
        let card = self.deck.deal().ok_or(ActionError::DeckEmpty)?;
        self.take_into_hand(player_id, card);
        self.advance_turn();
        Ok(())
    }

    /// Picks up the discard pile's top card instead of drawing from the deck.
    pub fn draw_from_discard(&mut self, player_id: PlayerId) -> Result<(), ActionError> {
        self.check_resolution(player_id)?;
        let card = self.discard_pile.deal().ok_or(ActionError::DiscardPileEmpty)?;
        self.take_into_hand(player_id, card);
        self.advance_turn();
        Ok(())
    }

    /// Ends the turn without drawing when a pending card matches the discard pile's top value.
    pub fn same_rank_skip(&mut self, player_id: PlayerId) -> Result<(), ActionError> {
        self.check_resolution(player_id)?;
        let top = self.discard_pile.top().ok_or(ActionError::DiscardPileEmpty)?.value();
        let matches = self
            .pending_discard
            .as_ref()
            .is_some_and(|pending| pending.cards.iter().any(|c| c.value() == top));
        if !matches {
            return Err(ActionError::RankMismatch);
        }
        debug!(%player_id, top, "same number skip");
        self.advance_turn();
        Ok(())
    }

    /// Ends the round. Lowest hand total wins; ties all win.
    ///
    /// Any player may call this at any point of a running round.
    pub fn show(&mut self, player_id: PlayerId) -> Result<(), ActionError> {
        if !self.players.contains_key(&player_id) {
            return Err(ActionError::UnknownPlayer);
        }
        match self.phase {
            GamePhase::NotStarted | GamePhase::Suspended => return Err(ActionError::GameNotStarted),
            GamePhase::RoundOver => return Err(ActionError::RoundOver),
            GamePhase::AwaitingDiscard | GamePhase::AwaitingResolution => {}
        }

        self.resolve_pending();
        let lowest = self.players.values().map(Player::hand_value).min().unwrap_or(0);
        let result: HashMap<_, _> = self
            .players
            .values()
            .map(|p| {
                let outcome = if p.hand_value() == lowest { RoundOutcome::Winner } else { RoundOutcome::Loser };
                (p.id, outcome)
            })
            .collect();

        info!(%player_id, lowest, "show called, round over");
        self.round_result = Some(result);
        self.phase = GamePhase::RoundOver;
        Ok(())
    }

    /// Throws the current round away and deals a new one.
    pub fn new_game(&mut self, player_id: PlayerId) -> Result<(), ActionError> {
        if !self.players.contains_key(&player_id) {
            return Err(ActionError::UnknownPlayer);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(ActionError::NotEnoughPlayers(MIN_PLAYERS));
        }
        info!(%player_id, "new game requested");
        self.deal_round(Pile::shuffled_deck());
        Ok(())
    }

    // --- Helpers ---

    /// Passes the turn to the next player in turn order.
    ///
    /// A leftover pending discard is moved onto the discard pile first. If the
    /// current player is somehow missing from the turn order the turn goes back
    /// to the first remaining player.
    pub(crate) fn advance_turn(&mut self) {
        self.resolve_pending();

        let position = self
            .current_turn
            .and_then(|id| self.turn_order.iter().position(|p| *p == id));
        self.current_turn = match position {
            Some(idx) => Some(self.turn_order[(idx + 1) % self.turn_order.len()]),
            None => {
                warn!(
                    current = ?self.current_turn,
                    order = ?self.turn_order,
                    "current player is not in the turn order, resetting turn"
                );
                self.turn_order.first().copied()
            }
        };
        if self.phase == GamePhase::AwaitingResolution {
            self.phase = GamePhase::AwaitingDiscard;
        }
        debug!(next = ?self.current_turn, "turn advanced");
    }

    /// Moves the pending discard, if any, onto the discard pile.
    pub(crate) fn resolve_pending(&mut self) {
        if let Some(pending) = self.pending_discard.take() {
            self.discard_pile.extend(pending.cards);
        }
    }

    fn take_into_hand(&mut self, player_id: PlayerId, card: Card) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.hand.push(card);
        }
    }

    fn check_turn(&self, player_id: PlayerId) -> Result<(), ActionError> {
        if !self.players.contains_key(&player_id) {
            return Err(ActionError::UnknownPlayer);
        }
        match self.phase {
            GamePhase::NotStarted | GamePhase::Suspended => return Err(ActionError::GameNotStarted),
            GamePhase::RoundOver => return Err(ActionError::RoundOver),
            GamePhase::AwaitingDiscard | GamePhase::AwaitingResolution => {}
        }
        if self.current_turn != Some(player_id) {
            return Err(ActionError::NotYourTurn);
        }
        Ok(())
    }

    fn check_resolution(&self, player_id: PlayerId) -> Result<(), ActionError> {
        self.check_turn(player_id)?;
        if self.pending_discard.is_none() {
            return Err(ActionError::MustDiscardFirst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use proptest::prelude::*;

    #[test]
    fn test_two_players_auto_start() {
        let (game, a, b) = two_player_game();
        assert_eq!(game.phase(), GamePhase::AwaitingDiscard);
        assert_eq!(game.player(&a).unwrap().hand.len(), 7);
        assert_eq!(game.player(&b).unwrap().hand.len(), 7);
        assert_eq!(game.discard_pile().len(), 1);
        assert_eq!(game.deck().len(), 52 - 14 - 1);
        assert_eq!(game.current_player_id(), Some(a));
        assert_eq!(game.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_group_discard_then_draw() {
        let mut game = Game::default();
        let (a, b) = seat_two(&mut game);
        let jack_h = card(Rank::Jack, Suit::Hearts);
        let jack_c = card(Rank::Jack, Suit::Clubs);
        game.deal_round(rigged_deck(&[jack_h, card(Rank::Two, Suit::Clubs), jack_c]));

        game.discard_card(a, jack_h).unwrap();
        let pending = game.pending_discard().unwrap();
        assert_eq!(pending.owner, a);
        assert_eq!(pending.cards.len(), 2);
        assert!(pending.cards.contains(&jack_h) && pending.cards.contains(&jack_c));
        assert_eq!(game.player(&a).unwrap().hand.len(), 5);
        assert!(game.player(&a).unwrap().hand.iter().all(|c| c.rank != Rank::Jack));
        assert_eq!(game.current_player_id(), Some(a));
        assert_eq!(game.cards_in_play(), DECK_SIZE);

        let deck_before = game.deck().len();
        game.draw_card(a).unwrap();
        assert_eq!(game.player(&a).unwrap().hand.len(), 6);
        assert_eq!(game.discard_pile().len(), 3);
        assert_eq!(game.deck().len(), deck_before - 1);
        assert!(game.pending_discard().is_none());
        assert_eq!(game.current_player_id(), Some(b));
        assert_eq!(game.phase(), GamePhase::AwaitingDiscard);
        assert_eq!(game.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_same_number_skip_succeeds_on_match() {
        let mut game = Game::default();
        let (a, b) = seat_two(&mut game);
        let five_h = card(Rank::Five, Suit::Hearts);
        let five_s = card(Rank::Five, Suit::Spades);
        // 14 cards dealt, the 15th becomes the opening discard.
        let mut top = vec![five_h];
        top.extend(filler(13, &[five_h, five_s]));
        top.push(five_s);
        game.deal_round(rigged_deck(&top));
        assert_eq!(game.discard_pile().top(), Some(&five_s));

        let hand_before = game.player(&a).unwrap().hand.len();
        let deck_before = game.deck().len();
        game.discard_card(a, five_h).unwrap();
        game.same_rank_skip(a).unwrap();

        assert_eq!(game.player(&a).unwrap().hand.len(), hand_before - 1);
        assert_eq!(game.deck().len(), deck_before);
        assert_eq!(game.discard_pile().top(), Some(&five_h));
        assert_eq!(game.current_player_id(), Some(b));
    }

    #[test]
    fn test_same_number_skip_mismatch_changes_nothing() {
        let mut game = Game::default();
        let (a, _b) = seat_two(&mut game);
        let king = card(Rank::King, Suit::Hearts);
        let two = card(Rank::Two, Suit::Diamonds);
        let mut top = vec![king];
        top.extend(filler(13, &[king, two]));
        top.push(two);
        game.deal_round(rigged_deck(&top));
        assert_eq!(game.discard_pile().top(), Some(&two));

        game.discard_card(a, king).unwrap();
        let snapshot = game.clone();
        assert_eq!(game.same_rank_skip(a), Err(ActionError::RankMismatch));
        assert_eq!(game, snapshot);
        assert_eq!(game.phase(), GamePhase::AwaitingResolution);

        // Still free to draw.
        game.draw_card(a).unwrap();
    }

    #[test]
    fn test_discard_before_draw() {
        let (mut game, a, _b) = two_player_game();
        assert_eq!(game.draw_card(a), Err(ActionError::MustDiscardFirst));
        assert_eq!(game.draw_from_discard(a), Err(ActionError::MustDiscardFirst));
        assert_eq!(game.same_rank_skip(a), Err(ActionError::MustDiscardFirst));

        let first = game.player(&a).unwrap().hand[0];
        game.discard_card(a, first).unwrap();
        let second = game.player(&a).unwrap().hand[0];
        assert_eq!(game.discard_card(a, second), Err(ActionError::AlreadyDiscarded));
    }

    #[test]
    fn test_wrong_player_and_missing_card() {
        let (mut game, a, b) = two_player_game();
        let b_card = game.player(&b).unwrap().hand[0];
        assert_eq!(game.discard_card(b, b_card), Err(ActionError::NotYourTurn));
        assert_eq!(game.discard_card(a, b_card), Err(ActionError::CardNotInHand(b_card)));
        assert_eq!(
            game.handle_action(PlayerId::new_v4(), PlayerAction::Draw),
            Err(ActionError::UnknownPlayer)
        );
    }

    #[test]
    fn test_draw_from_discard_takes_top() {
        let (mut game, a, b) = two_player_game();
        let top = *game.discard_pile().top().unwrap();
        let first = game.player(&a).unwrap().hand[0];
        game.discard_card(a, first).unwrap();
        game.draw_from_discard(a).unwrap();

        assert!(game.player(&a).unwrap().hand.contains(&top));
        assert_eq!(game.discard_pile().top().map(Card::value), Some(first.value()));
        assert_eq!(game.current_player_id(), Some(b));
        assert_eq!(game.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_draw_from_empty_deck_is_recoverable() {
        let (mut game, a, b) = two_player_game();
        let drained: Vec<_> = std::iter::from_fn(|| game.deck.deal()).collect();
        game.discard_pile.extend(drained);

        let first = game.player(&a).unwrap().hand[0];
        game.discard_card(a, first).unwrap();
        assert_eq!(game.draw_card(a), Err(ActionError::DeckEmpty));
        assert_eq!(game.phase(), GamePhase::AwaitingResolution);
        game.draw_from_discard(a).unwrap();
        assert_eq!(game.current_player_id(), Some(b));
    }

    #[test]
    fn test_show_lowest_total_wins_and_ties_share() {
        let (mut game, a, b) = two_player_game();
        let c = PlayerId::new_v4();
        game.players.insert(c, Player::new(c, "Carol".into()));
        game.players.get_mut(&a).unwrap().hand = vec![card(Rank::Ace, Suit::Hearts), card(Rank::Two, Suit::Hearts)];
        game.players.get_mut(&b).unwrap().hand = vec![card(Rank::Three, Suit::Clubs)];
        game.players.get_mut(&c).unwrap().hand = vec![card(Rank::King, Suit::Clubs)];

        game.show(b).unwrap();
        let result = game.round_result().unwrap();
        assert_eq!(result[&a], RoundOutcome::Winner);
        assert_eq!(result[&b], RoundOutcome::Winner);
        assert_eq!(result[&c], RoundOutcome::Loser);
        assert_eq!(game.phase(), GamePhase::RoundOver);

        let any = game.player(&a).unwrap().hand[0];
        assert_eq!(game.discard_card(a, any), Err(ActionError::RoundOver));
        assert_eq!(game.show(a), Err(ActionError::RoundOver));
    }

    #[test]
    fn test_show_during_resolution_settles_pending() {
        let (mut game, a, b) = two_player_game();
        let first = game.player(&a).unwrap().hand[0];
        game.discard_card(a, first).unwrap();
        game.show(b).unwrap();
        assert!(game.pending_discard().is_none());
        assert_eq!(game.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_new_game_redeals() {
        let (mut game, a, b) = two_player_game();
        game.show(a).unwrap();
        game.new_game(b).unwrap();
        assert!(game.round_result().is_none());
        assert_eq!(game.phase(), GamePhase::AwaitingDiscard);
        assert_eq!(game.player(&a).unwrap().hand.len(), 7);
        assert_eq!(game.player(&b).unwrap().hand.len(), 7);
        assert_eq!(game.deck().len(), 37);
        assert_eq!(game.current_player_id(), Some(a));
    }

    #[test]
    fn test_start_game_needs_two_players() {
        let mut game = Game::default();
        assert!(!game.start_game());
        game.join(PlayerId::new_v4(), "Solo").unwrap();
        assert!(!game.start_game());
        assert_eq!(game.phase(), GamePhase::NotStarted);
        assert_eq!(game.current_player_id(), None);
    }

    #[test]
    fn test_advance_turn_recovers_from_missing_current() {
        let (mut game, a, _b) = two_player_game();
        game.current_turn = Some(PlayerId::new_v4());
        game.advance_turn();
        assert_eq!(game.current_player_id(), Some(a));
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Discard(usize),
        Draw,
        FromDiscard,
        Skip,
        Show,
        NewGame,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => (0usize..20).prop_map(Step::Discard),
            3 => Just(Step::Draw),
            2 => Just(Step::FromDiscard),
            2 => Just(Step::Skip),
            1 => Just(Step::Show),
            1 => Just(Step::NewGame),
        ]
    }

    proptest! {
        #[test]
        fn prop_cards_are_conserved(players in 2usize..6, steps in prop::collection::vec(step(), 0..120)) {
            let mut game = Game::default();
            let ids = seat(&mut game, players);
            prop_assert!(game.start_game());

            for step in steps {
                let current = game.current_player_id().unwrap_or(ids[0]);
                let action = match step {
                    Step::Discard(i) => match game.player(&current).and_then(|p| p.hand.get(i % p.hand.len().max(1))) {
                        Some(card) => PlayerAction::Discard(*card),
                        None => PlayerAction::Draw,
                    },
                    Step::Draw => PlayerAction::Draw,
                    Step::FromDiscard => PlayerAction::DrawFromDiscard,
                    Step::Skip => PlayerAction::SameNumberSkip,
                    Step::Show => PlayerAction::Show,
                    Step::NewGame => PlayerAction::NewGame,
                };
                let _ = game.handle_action(current, action);

                prop_assert_eq!(game.cards_in_play(), DECK_SIZE);
                prop_assert_eq!(game.pending_discard().is_some(), game.phase() == GamePhase::AwaitingResolution);
                if game.phase() != GamePhase::RoundOver {
                    let turn = game.current_player_id();
                    prop_assert!(turn.is_some_and(|id| game.turn_order().contains(&id)));
                }
            }
        }
    }
}
