//! Single-round blackjack engine.

use std::fmt::Write as _;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::card::{Card, Deck};
use crate::hand::Hand;
use crate::money::format_dollars;
use crate::result::GameResult;

mod actions;
mod bet;
mod dealer;
pub mod state;

pub use state::{GamePhase, PlayerAction};

/// One round of blackjack between a single player and the dealer.
///
/// The game owns its deck and both hands for the lifetime of the round. All
/// transitions take `&mut self` and finish synchronously: a stand or double
/// down plays the dealer out before returning, so callers always observe a
/// settled state once the phase reaches [`GamePhase::GameOver`].
#[derive(Debug, Clone)]
pub struct Game {
    deck: Deck,
    player_hand: Hand,
    dealer_hand: Hand,
    phase: GamePhase,
    /// Stake in cents, doubled on a double down.
    bet: u64,
    result: Option<GameResult>,
    doubled: bool,
    player_stood: bool,
    /// `None` for a stacked deck that must not be shuffled.
    rng: Option<ChaCha8Rng>,
}

impl Game {
    /// Creates a new game with a full deck that is shuffled when the bet is
    /// placed.
    ///
    /// # Example
    ///
    /// ```
    /// use bjcasino::{Game, GamePhase};
    ///
    /// let mut game = Game::new(42);
    /// game.place_bet(1_000).unwrap();
    /// assert_ne!(game.phase(), GamePhase::WaitingForBet);
    /// ```
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_parts(Deck::new(), Some(ChaCha8Rng::seed_from_u64(seed)))
    }

    /// Creates a game over a stacked deck that is never shuffled.
    ///
    /// Cards are drawn in slice order: player, dealer, player, dealer, then
    /// any hits and dealer draws.
    #[must_use]
    pub fn with_deck(cards: &[Card]) -> Self {
        Self::with_parts(Deck::from_cards(cards), None)
    }

    const fn with_parts(deck: Deck, rng: Option<ChaCha8Rng>) -> Self {
        Self {
            deck,
            player_hand: Hand::new(),
            dealer_hand: Hand::new(),
            phase: GamePhase::WaitingForBet,
            bet: 0,
            result: None,
            doubled: false,
            player_stood: false,
            rng,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Returns the current stake in cents.
    #[must_use]
    pub const fn bet(&self) -> u64 {
        self.bet
    }

    /// Returns the result, once the round is over.
    #[must_use]
    pub const fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Returns the player's hand.
    #[must_use]
    pub const fn player_hand(&self) -> &Hand {
        &self.player_hand
    }

    /// Returns the dealer's hand.
    #[must_use]
    pub const fn dealer_hand(&self) -> &Hand {
        &self.dealer_hand
    }

    /// Returns whether the player doubled down this round.
    #[must_use]
    pub const fn is_doubled(&self) -> bool {
        self.doubled
    }

    /// Returns whether the player stood this round.
    #[must_use]
    pub const fn player_stood(&self) -> bool {
        self.player_stood
    }

    /// Returns whether the round has finished.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Returns the number of cards left in the deck.
    #[must_use]
    pub fn cards_remaining(&self) -> usize {
        self.deck.len()
    }

    /// Returns the amount credited back to the player for this round.
    ///
    /// Zero until a result is known.
    #[must_use]
    pub fn calculate_payout(&self) -> u64 {
        self.result.map_or(0, |result| result.payout(self.bet))
    }

    /// Returns the actions legal right now.
    ///
    /// Double down and surrender are only offered on the opening two cards.
    #[must_use]
    pub fn valid_actions(&self) -> Vec<PlayerAction> {
        if self.phase != GamePhase::PlayerTurn {
            return Vec::new();
        }

        let mut actions = vec![PlayerAction::Hit, PlayerAction::Stand];
        let initial_hand = self.player_hand.len() == 2;

        if initial_hand && !self.doubled {
            actions.push(PlayerAction::DoubleDown);
        }
        if initial_hand {
            actions.push(PlayerAction::Surrender);
        }

        actions
    }

    /// Renders the table for the client.
    ///
    /// The dealer's hole card is only hidden during the player's turn. The
    /// result and payout lines appear once the round is over.
    #[must_use]
    pub fn render_state(&self, hide_dealer_hole_card: bool) -> String {
        let mut out = format!("Bet: ${}\n", format_dollars(self.bet));

        if self.player_hand.is_empty() {
            let _ = writeln!(out, "Player Hand: {}", self.player_hand.render());
        } else {
            let _ = writeln!(
                out,
                "Player Hand: {} (Value: {})",
                self.player_hand.render(),
                self.player_hand.value()
            );
        }

        if self.dealer_hand.is_empty() {
            let _ = writeln!(out, "Dealer Hand: {}", self.dealer_hand.render());
        } else if hide_dealer_hole_card && self.phase == GamePhase::PlayerTurn {
            let _ = writeln!(out, "Dealer Hand: {}", self.dealer_hand.render_hidden());
        } else {
            let _ = writeln!(
                out,
                "Dealer Hand: {} (Value: {})",
                self.dealer_hand.render(),
                self.dealer_hand.value()
            );
        }

        if self.phase == GamePhase::GameOver {
            let _ = write!(
                out,
                "\nResult: {}\nPayout: ${}\n",
                self.result_message(),
                format_dollars(self.calculate_payout())
            );
        }

        out
    }
}
