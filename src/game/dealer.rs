//! Dealer play and round resolution.

use tracing::warn;

use crate::result::GameResult;

use super::{Game, GamePhase};

/// The dealer draws below this value and stands on it, soft or hard.
const DEALER_STANDS_ON: u8 = 17;

impl Game {
    /// Dealer plays their hand according to the house rules.
    ///
    /// The dealer draws until reaching 17 or higher and stands on soft 17.
    /// Running out of cards mid-draw ends the round as a push instead of
    /// leaving it unresolved.
    pub(super) fn play_dealer_turn(&mut self) {
        while self.dealer_hand.value() < DEALER_STANDS_ON {
            match self.deck.draw() {
                Ok(card) => self.dealer_hand.add_card(card),
                Err(err) => {
                    warn!(
                        dealer_value = self.dealer_hand.value(),
                        "dealer could not draw ({err}); settling as push"
                    );
                    self.finish(GameResult::Push);
                    return;
                }
            }
        }

        let result = self.determine_winner();
        self.finish(result);
    }

    fn determine_winner(&self) -> GameResult {
        let player_value = self.player_hand.value();
        let dealer_value = self.dealer_hand.value();

        if self.player_hand.is_busted() {
            GameResult::DealerWin
        } else if self.dealer_hand.is_busted() || player_value > dealer_value {
            GameResult::PlayerWin
        } else if dealer_value > player_value {
            GameResult::DealerWin
        } else {
            GameResult::Push
        }
    }

    /// Records the result and closes the round.
    pub(super) fn finish(&mut self, result: GameResult) {
        self.result = Some(result);
        self.phase = GamePhase::GameOver;
    }

    pub(super) fn result_message(&self) -> &'static str {
        match self.result {
            Some(GameResult::PlayerBlackjack) => "Blackjack! You win!",
            Some(GameResult::PlayerWin) => "You win!",
            Some(GameResult::DealerWin) if self.player_hand.is_busted() => "Bust! Dealer wins.",
            Some(GameResult::DealerWin) => "Dealer wins.",
            Some(GameResult::Push) => "Push - tie game.",
            Some(GameResult::Surrender) => "Surrendered - half your bet returned.",
            None => "",
        }
    }
}
