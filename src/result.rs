//! Round outcome types.

/// Outcome of a finished round, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    /// Player beat the dealer (including a dealer bust).
    PlayerWin,
    /// Dealer beat the player (including a player bust or dealer natural).
    DealerWin,
    /// Tie; the stake is returned.
    Push,
    /// Player was dealt a natural and the dealer was not.
    PlayerBlackjack,
    /// Player gave up half the stake.
    Surrender,
}

impl GameResult {
    /// Returns the amount credited back for a stake of `bet`.
    ///
    /// Halves truncate toward zero, so odd-cent stakes lose the remainder.
    #[must_use]
    pub const fn payout(self, bet: u64) -> u64 {
        match self {
            Self::PlayerBlackjack => bet + bet * 3 / 2,
            Self::PlayerWin => bet * 2,
            Self::Push => bet,
            Self::DealerWin => 0,
            Self::Surrender => bet / 2,
        }
    }

    /// Returns whether the round counts as a win in the statistics.
    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Self::PlayerWin | Self::PlayerBlackjack)
    }

    /// Returns whether the round counts as a loss in the statistics.
    #[must_use]
    pub const fn is_loss(self) -> bool {
        matches!(self, Self::DealerWin | Self::Surrender)
    }
}
