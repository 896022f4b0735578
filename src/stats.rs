//! Cumulative per-account play statistics.

use crate::result::GameResult;

/// Lifetime statistics for one account. Amounts are in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Rounds settled.
    pub games_played: u64,
    /// Rounds won, naturals included.
    pub games_won: u64,
    /// Rounds lost, surrenders included.
    pub games_lost: u64,
    /// Sum of final stakes.
    pub total_bet: u64,
    /// Sum of payouts credited back.
    pub total_won: u64,
    /// Largest stake on a winning round.
    pub biggest_win: u64,
    /// Largest amount lost in one round.
    pub biggest_loss: u64,
}

impl Stats {
    /// Folds one settled round into the totals.
    ///
    /// `bet` is the final stake (doubled if the player doubled down). A
    /// surrender counts as a loss of the forfeited half only; a push changes
    /// neither the win nor the loss counters.
    pub fn record(&mut self, bet: u64, result: GameResult) {
        let payout = result.payout(bet);

        self.games_played += 1;
        self.total_bet += bet;
        self.total_won += payout;

        if result.is_win() {
            self.games_won += 1;
            self.biggest_win = self.biggest_win.max(bet);
        } else if result.is_loss() {
            self.games_lost += 1;
            self.biggest_loss = self.biggest_loss.max(bet - payout);
        }
    }
}
