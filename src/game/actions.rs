//! Player actions: hit, stand, double down and surrender.

use crate::card::Card;
use crate::error::ActionError;
use crate::result::GameResult;

use super::{Game, GamePhase, PlayerAction};

impl Game {
    /// Fails unless the round is waiting on the player.
    pub(crate) fn ensure_player_turn(&self, action: PlayerAction) -> Result<(), ActionError> {
        if self.phase != GamePhase::PlayerTurn {
            return Err(ActionError::InvalidPhase(action_name(action)));
        }
        Ok(())
    }

    /// Fails unless `action` is still allowed on the opening two cards.
    pub(crate) fn ensure_initial_hand(&self, action: PlayerAction) -> Result<(), ActionError> {
        let initial = self.player_hand.len() == 2;
        let allowed = match action {
            PlayerAction::DoubleDown => initial && !self.doubled,
            _ => initial,
        };
        if !allowed {
            return Err(ActionError::NotInitialHand(action_name(action)));
        }
        Ok(())
    }

    /// Player action: Hit (draw a card).
    ///
    /// A bust ends the round as a dealer win.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the player's turn or the deck is empty.
    /// The game is left unchanged on error.
    pub fn hit(&mut self) -> Result<Card, ActionError> {
        self.ensure_player_turn(PlayerAction::Hit)?;

        let card = self.deck.draw()?;
        self.player_hand.add_card(card);

        if self.player_hand.is_busted() {
            self.finish(GameResult::DealerWin);
        }

        Ok(card)
    }

    /// Player action: Stand (keep current hand).
    ///
    /// The dealer plays out their hand before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the player's turn.
    pub fn stand(&mut self) -> Result<(), ActionError> {
        self.ensure_player_turn(PlayerAction::Stand)?;

        self.player_stood = true;
        self.phase = GamePhase::DealerTurn;
        self.play_dealer_turn();

        Ok(())
    }

    /// Player action: Double down (double bet, receive one card, then stand).
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the player's turn, the hand is past its
    /// first two cards or already doubled, or the deck is empty. The game is
    /// left unchanged on error.
    pub fn double_down(&mut self) -> Result<Card, ActionError> {
        self.ensure_player_turn(PlayerAction::DoubleDown)?;
        self.ensure_initial_hand(PlayerAction::DoubleDown)?;

        let card = self.deck.draw()?;
        self.bet *= 2;
        self.doubled = true;
        self.player_hand.add_card(card);

        if self.player_hand.is_busted() {
            self.finish(GameResult::DealerWin);
        } else {
            self.phase = GamePhase::DealerTurn;
            self.play_dealer_turn();
        }

        Ok(card)
    }

    /// Player action: Surrender (forfeit half the bet).
    ///
    /// No card is drawn and the round ends immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the player's turn or the hand is past
    /// its first two cards.
    pub fn surrender(&mut self) -> Result<(), ActionError> {
        self.ensure_player_turn(PlayerAction::Surrender)?;
        self.ensure_initial_hand(PlayerAction::Surrender)?;

        self.finish(GameResult::Surrender);
        Ok(())
    }
}

const fn action_name(action: PlayerAction) -> &'static str {
    match action {
        PlayerAction::Hit => "hit",
        PlayerAction::Stand => "stand",
        PlayerAction::DoubleDown => "double down",
        PlayerAction::Surrender => "surrender",
    }
}
