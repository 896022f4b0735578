//! Game phase and action types.

use std::fmt;

/// Phase of a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No bet yet; hands are empty.
    WaitingForBet,
    /// Waiting for player actions.
    PlayerTurn,
    /// Dealer plays out their hand.
    DealerTurn,
    /// Round has ended and the result is final.
    GameOver,
}

/// A move the player can make during their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    /// Draw one card.
    Hit,
    /// Keep the current hand.
    Stand,
    /// Double the bet and draw exactly one card.
    DoubleDown,
    /// Give up half the bet.
    Surrender,
}

impl PlayerAction {
    /// Returns the protocol verb for the action.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Stand => "STAND",
            Self::DoubleDown => "DOUBLEDOWN",
            Self::Surrender => "SURRENDER",
        }
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}
