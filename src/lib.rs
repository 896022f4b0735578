//! A line-protocol blackjack casino server.
//!
//! The engine ([`Game`], [`Hand`], [`Deck`]) plays one round between a single
//! player and the dealer. The [`server`] module puts it behind a
//! newline-delimited text protocol, with accounts, balances and statistics
//! kept in a SQLite [`Vault`] and logins handled by [`Auth`].
//!
//! # Example
//!
//! ```
//! use bjcasino::{Card, Game, GamePhase, GameResult, Suit};
//!
//! let mut game = Game::with_deck(&[
//!     Card::new(Suit::Spades, 1),
//!     Card::new(Suit::Hearts, 9),
//!     Card::new(Suit::Clubs, 13),
//!     Card::new(Suit::Diamonds, 7),
//! ]);
//! game.place_bet(1_000).unwrap();
//!
//! assert_eq!(game.phase(), GamePhase::GameOver);
//! assert_eq!(game.result(), Some(GameResult::PlayerBlackjack));
//! assert_eq!(game.calculate_payout(), 2_500);
//! ```

pub mod card;
pub mod config;
pub mod error;
pub mod game;
pub mod hand;
pub mod money;
pub mod result;
pub mod security;
pub mod server;
pub mod stats;
mod sync;
pub mod vault;

// Re-export main types
pub use card::{Card, DECK_SIZE, Deck, Suit};
pub use config::ServerConfig;
pub use error::{ActionError, BetError, DeckError};
pub use game::{Game, GamePhase, PlayerAction};
pub use hand::Hand;
pub use result::GameResult;
pub use security::{Auth, AuthError};
pub use server::{Reply, Session};
pub use stats::Stats;
pub use vault::{Account, StoreError, Vault};
