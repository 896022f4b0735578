//! Betting and the opening deal.

use crate::error::BetError;
use crate::result::GameResult;

use super::{Game, GamePhase};

impl Game {
    /// Places the bet and deals the opening hands.
    ///
    /// Cards go player, dealer, player, dealer. Naturals are resolved
    /// immediately, so the round may already be over when this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if a bet was already placed, the amount is zero, or
    /// the deck runs out mid-deal. After [`BetError::DealFailed`] the hands
    /// are partially dealt and the game must be discarded.
    pub fn place_bet(&mut self, amount: u64) -> Result<(), BetError> {
        if self.phase != GamePhase::WaitingForBet {
            return Err(BetError::InvalidPhase);
        }
        if amount == 0 {
            return Err(BetError::InvalidAmount);
        }

        self.bet = amount;
        if let Some(rng) = self.rng.as_mut() {
            self.deck.shuffle(rng);
        }

        for to_player in [true, false, true, false] {
            let card = self.deck.draw().map_err(BetError::DealFailed)?;
            if to_player {
                self.player_hand.add_card(card);
            } else {
                self.dealer_hand.add_card(card);
            }
        }

        self.resolve_naturals();
        Ok(())
    }

    fn resolve_naturals(&mut self) {
        let result = match (
            self.player_hand.is_blackjack(),
            self.dealer_hand.is_blackjack(),
        ) {
            (true, true) => Some(GameResult::Push),
            (true, false) => Some(GameResult::PlayerBlackjack),
            (false, true) => Some(GameResult::DealerWin),
            (false, false) => None,
        };

        match result {
            Some(result) => self.finish(result),
            None => self.phase = GamePhase::PlayerTurn,
        }
    }
}
