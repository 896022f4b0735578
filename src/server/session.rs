//! Per-connection command router.
//!
//! A [`Session`] owns the connection's login token and at most one [`Game`].
//! Each input line is turned into exactly one [`Reply`], prefixed `OK` or
//! `ERROR`.

use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::error::{ActionError, BetError};
use crate::game::{Game, GamePhase, PlayerAction};
use crate::money::{AmountError, format_dollars, parse_dollars};
use crate::security::{Auth, AuthError, unix_now};
use crate::vault::{Account, StoreError};

/// Builds the game for each new round.
pub type GameFactory = Box<dyn FnMut() -> Game + Send>;

const HELP: &str = "Available commands:
  SIGNUP <username> <password>  create an account
  LOGIN <username> <password>   log in
  LOGOUT                        log out
  WHOAMI                        show the logged-in user
  BALANCE                       show your balance
  STATS                         show your statistics
  BET <amount>                  start a round, e.g. BET 10 or BET 12.50
  HIT                           draw a card
  STAND                         end your turn
  DOUBLEDOWN                    double the bet and draw one card
  SURRENDER                     give up half the bet
  HELP                          show this list
  QUIT                          disconnect";

/// Errors reported to the client as a single `ERROR` line.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No valid session.
    #[error("not logged in")]
    NotAuthenticated,
    /// Verb not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// Wrong number of arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// A round is still being played.
    #[error("a game is already in progress")]
    GameInProgress,
    /// No round has been started.
    #[error("no active game (use BET to start one)")]
    NoActiveGame,
    /// Balance does not cover the stake.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// Bad bet amount.
    #[error(transparent)]
    Amount(#[from] AmountError),
    /// Bet or deal failure.
    #[error(transparent)]
    Bet(#[from] BetError),
    /// Illegal player action.
    #[error(transparent)]
    Action(#[from] ActionError),
    /// Credential or login failure.
    #[error(transparent)]
    Auth(AuthError),
    /// Store failure; details are logged, not sent.
    #[error("internal error, please try again")]
    Internal,
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientFunds => Self::InsufficientFunds,
            other => {
                error!(%other, "store failure");
                Self::Internal
            }
        }
    }
}

impl From<AuthError> for CommandError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidSession => Self::NotAuthenticated,
            AuthError::Store(store) => store.into(),
            AuthError::Hash => {
                error!("password hashing failed");
                Self::Internal
            }
            other => Self::Auth(other),
        }
    }
}

/// One response, written to the client as a single line block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Response text without the trailing newline.
    pub text: String,
    /// Whether the connection should be closed after writing.
    pub close: bool,
}

impl Reply {
    fn ok(body: impl AsRef<str>) -> Self {
        let body = body.as_ref();
        let text = if body.is_empty() {
            "OK".to_owned()
        } else if body.starts_with('\n') {
            format!("OK{body}")
        } else {
            format!("OK {body}")
        };
        Self { text, close: false }
    }

    fn error(err: &CommandError) -> Self {
        Self {
            text: format!("ERROR {err}"),
            close: false,
        }
    }

    /// Returns whether this is a success response.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.text.starts_with("OK")
    }
}

/// Connection state: login token and the current round.
pub struct Session {
    auth: Auth,
    token: Option<String>,
    game: Option<Game>,
    /// Account whose stake is escrowed in `game`.
    round_owner: Option<i64>,
    new_game: GameFactory,
}

impl Session {
    /// Creates a session that deals freshly shuffled decks.
    #[must_use]
    pub fn new(auth: Auth) -> Self {
        Self::with_game_factory(auth, Box::new(|| Game::new(rand::random())))
    }

    /// Creates a session that gets each round's game from `new_game`.
    #[must_use]
    pub fn with_game_factory(auth: Auth, new_game: GameFactory) -> Self {
        Self {
            auth,
            token: None,
            game: None,
            round_owner: None,
            new_game,
        }
    }

    /// Returns the current or last round.
    #[must_use]
    pub const fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Returns whether a round has been dealt but not finished.
    #[must_use]
    pub fn has_unfinished_game(&self) -> bool {
        self.game.as_ref().is_some_and(|game| !game.is_over())
    }

    /// Returns whether a login token is held.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Handles one input line. Blank lines produce no reply.
    pub fn handle_line(&mut self, line: &str) -> Option<Reply> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next()?.to_ascii_uppercase();
        let args: Vec<&str> = tokens.collect();

        debug!(%verb, argc = args.len(), "command");
        Some(
            self.dispatch(&verb, &args)
                .unwrap_or_else(|err| Reply::error(&err)),
        )
    }

    fn dispatch(&mut self, verb: &str, args: &[&str]) -> Result<Reply, CommandError> {
        match verb {
            "SIGNUP" => self.signup(args),
            "LOGIN" => self.login(args),
            "LOGOUT" => self.logout(),
            "WHOAMI" => {
                let account = self.account()?;
                Ok(Reply::ok(format!("Logged in as {}", account.username)))
            }
            "BALANCE" => {
                let account = self.account()?;
                Ok(Reply::ok(format!(
                    "Balance: ${}",
                    format_dollars(account.balance)
                )))
            }
            "STATS" => self.stats(),
            "HELP" => Ok(Reply::ok(HELP)),
            "QUIT" | "EXIT" => Ok(Reply {
                text: "OK Goodbye!".to_owned(),
                close: true,
            }),
            "BET" => self.bet(args),
            "HIT" => self.play(PlayerAction::Hit),
            "STAND" => self.play(PlayerAction::Stand),
            "DOUBLEDOWN" | "DOUBLE" => self.play(PlayerAction::DoubleDown),
            "SURRENDER" => self.play(PlayerAction::Surrender),
            other => Err(CommandError::UnknownCommand(other.to_owned())),
        }
    }

    /// Resolves the held token to a fresh account row.
    fn account(&mut self) -> Result<Account, CommandError> {
        let token = self.token.as_deref().ok_or(CommandError::NotAuthenticated)?;
        match self.auth.validate(token) {
            Ok(account) => Ok(account),
            Err(err) => {
                let err = CommandError::from(err);
                if matches!(err, CommandError::NotAuthenticated) {
                    self.token = None;
                }
                Err(err)
            }
        }
    }

    fn signup(&self, args: &[&str]) -> Result<Reply, CommandError> {
        let [username, password] = args else {
            return Err(CommandError::Usage("SIGNUP <username> <password>"));
        };

        let account = self.auth.register(username, password)?;
        Ok(Reply::ok(format!(
            "Account created for {}. Starting balance: ${}",
            account.username,
            format_dollars(account.balance)
        )))
    }

    fn login(&mut self, args: &[&str]) -> Result<Reply, CommandError> {
        let [username, password] = args else {
            return Err(CommandError::Usage("LOGIN <username> <password>"));
        };

        let (token, account) = self.auth.login(username, password)?;
        // An unfinished round can only be resumed by the account that staked it.
        if self.has_unfinished_game() && self.round_owner != Some(account.id) {
            self.auth.logout(&token)?;
            return Err(CommandError::GameInProgress);
        }

        if let Some(previous) = self.token.replace(token) {
            self.auth.logout(&previous)?;
        }
        if self.has_unfinished_game() {
            info!(account_id = account.id, "resumed round after login");
        } else {
            self.clear_round();
        }

        Ok(Reply::ok(format!(
            "Welcome, {}! Balance: ${}",
            account.username,
            format_dollars(account.balance)
        )))
    }

    fn logout(&mut self) -> Result<Reply, CommandError> {
        let token = self.token.as_deref().ok_or(CommandError::NotAuthenticated)?;
        if self.has_unfinished_game() {
            return Err(CommandError::GameInProgress);
        }

        self.auth.logout(token)?;
        self.token = None;
        self.clear_round();
        Ok(Reply::ok("Logged out."))
    }

    fn stats(&mut self) -> Result<Reply, CommandError> {
        let account = self.account()?;
        let stats = self.auth.vault().stats(account.id)?;

        let mut body = format!("Statistics for {}", account.username);
        let _ = write!(
            body,
            "\nGames played: {}\nGames won: {}\nGames lost: {}\nTotal bet: ${}\nTotal won: ${}\nBiggest win: ${}\nBiggest loss: ${}",
            stats.games_played,
            stats.games_won,
            stats.games_lost,
            format_dollars(stats.total_bet),
            format_dollars(stats.total_won),
            format_dollars(stats.biggest_win),
            format_dollars(stats.biggest_loss),
        );
        Ok(Reply::ok(body))
    }

    fn bet(&mut self, args: &[&str]) -> Result<Reply, CommandError> {
        let [amount] = args else {
            return Err(CommandError::Usage("BET <amount>"));
        };
        let account = self.account()?;
        if self.has_unfinished_game() {
            return Err(CommandError::GameInProgress);
        }

        let amount = parse_dollars(amount)?;
        if amount > account.balance {
            return Err(CommandError::InsufficientFunds);
        }

        let vault = Arc::clone(self.auth.vault());
        vault.debit(account.id, amount, unix_now())?;

        let mut game = (self.new_game)();
        if let Err(err) = game.place_bet(amount) {
            error!(account_id = account.id, %err, "opening deal failed; refunding stake");
            self.clear_round();
            vault.credit(account.id, amount, unix_now())?;
            return Err(err.into());
        }

        info!(
            account_id = account.id,
            bet = amount,
            phase = ?game.phase(),
            "round started"
        );
        self.game = Some(game);
        self.round_owner = Some(account.id);
        self.settle_if_over(account.id)?;
        Ok(self.game_reply(Some("Game started!")))
    }

    fn play(&mut self, action: PlayerAction) -> Result<Reply, CommandError> {
        let account = self.account()?;
        let vault = self.auth.vault();
        let game = self.game.as_mut().ok_or(CommandError::NoActiveGame)?;

        match action {
            PlayerAction::Hit => {
                game.hit()?;
            }
            PlayerAction::Stand => game.stand()?,
            PlayerAction::DoubleDown => {
                game.ensure_player_turn(action)?;
                game.ensure_initial_hand(action)?;

                let extra = game.bet();
                vault.debit(account.id, extra, unix_now())?;
                if let Err(err) = game.double_down() {
                    vault.credit(account.id, extra, unix_now())?;
                    return Err(err.into());
                }
            }
            PlayerAction::Surrender => game.surrender()?,
        }

        debug!(account_id = account.id, %action, phase = ?game.phase(), "action applied");
        self.settle_if_over(account.id)?;

        let head = match action {
            PlayerAction::DoubleDown => Some("Doubled down!"),
            PlayerAction::Surrender => Some("Surrendered!"),
            PlayerAction::Hit | PlayerAction::Stand => None,
        };
        Ok(self.game_reply(head))
    }

    /// Credits the payout and records statistics once the round is over.
    fn settle_if_over(&self, account_id: i64) -> Result<(), CommandError> {
        let Some(game) = self.game.as_ref().filter(|game| game.is_over()) else {
            return Ok(());
        };
        let Some(result) = game.result() else {
            return Ok(());
        };

        let payout = game.calculate_payout();
        let balance = self
            .auth
            .vault()
            .settle(account_id, payout, unix_now(), |stats| {
                stats.record(game.bet(), result);
            })?;

        info!(
            account_id,
            ?result,
            bet = game.bet(),
            payout,
            balance,
            "round settled"
        );
        Ok(())
    }

    fn clear_round(&mut self) {
        self.game = None;
        self.round_owner = None;
    }

    fn game_reply(&self, head: Option<&str>) -> Reply {
        let Some(game) = self.game.as_ref() else {
            return Reply::ok(head.unwrap_or_default());
        };

        let mut body = String::new();
        if let Some(head) = head {
            body.push_str(head);
        }
        body.push('\n');
        body.push_str(game.render_state(true).trim_end());

        if game.phase() == GamePhase::PlayerTurn {
            let actions: Vec<&str> = game.valid_actions().iter().map(|a| a.verb()).collect();
            let _ = write!(body, "\nActions: {}", actions.join(", "));
        }

        Reply::ok(body)
    }
}
