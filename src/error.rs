//! Error types for game operations.

use thiserror::Error;

/// Errors that can occur when drawing from the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeckError {
    /// No cards left in the deck.
    #[error("deck is empty")]
    Exhausted,
}

/// Errors that can occur when placing a bet and dealing the opening hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BetError {
    /// A bet has already been placed for this round.
    #[error("cannot place bet in current phase")]
    InvalidPhase,
    /// Bet amount is zero.
    #[error("bet must be positive")]
    InvalidAmount,
    /// The deck ran out during the opening deal.
    #[error("failed to deal: {0}")]
    DealFailed(#[source] DeckError),
}

/// Errors that can occur during player actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Invalid game phase for this action.
    #[error("cannot {0} in current phase")]
    InvalidPhase(&'static str),
    /// Double down or surrender attempted after the first action.
    #[error("can only {0} on initial hand")]
    NotInitialHand(&'static str),
    /// No cards left in the deck.
    #[error(transparent)]
    DeckExhausted(#[from] DeckError),
}
