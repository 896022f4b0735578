//! SQLite-backed store of accounts, balances, statistics and sessions.
//!
//! One connection is shared behind a mutex. Every public method takes the
//! lock once, so each read-modify-write on a row is atomic with respect to
//! other connections.

use std::path::Path;

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::debug;

use crate::stats::Stats;
use crate::sync::Mutex;

/// Balance given to every new account: $10,000.00.
pub const STARTING_BALANCE: u64 = 1_000_000;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No account with that id or username.
    #[error("account not found")]
    AccountNotFound,
    /// Unknown, logged-out or expired session token.
    #[error("session not found or expired")]
    SessionNotFound,
    /// Username is registered already.
    #[error("username already exists")]
    UsernameTaken,
    /// Balance would go negative.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// Amount does not fit the database column.
    #[error("amount out of range")]
    AmountOutOfRange,
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Row id.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Balance in cents.
    pub balance: u64,
    /// Unix seconds.
    pub created_at: i64,
}

/// A login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Opaque token handed to the client.
    pub token: String,
    /// Owner of the session.
    pub account_id: i64,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds; the session is invalid from this instant on.
    pub expires_at: i64,
}

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        balance INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        account_id INTEGER NOT NULL REFERENCES accounts (id),
        created_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS account_stats (
        account_id INTEGER PRIMARY KEY REFERENCES accounts (id),
        games_played INTEGER NOT NULL DEFAULT 0,
        games_won INTEGER NOT NULL DEFAULT 0,
        games_lost INTEGER NOT NULL DEFAULT 0,
        total_bet INTEGER NOT NULL DEFAULT 0,
        total_won INTEGER NOT NULL DEFAULT 0,
        biggest_win INTEGER NOT NULL DEFAULT 0,
        biggest_loss INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_account_id ON sessions (account_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions (expires_at);
";

const ACCOUNT_COLUMNS: &str = "id, username, password_hash, balance, created_at";

fn sql_amount(amount: u64) -> Result<i64, StoreError> {
    i64::try_from(amount).map_err(|_| StoreError::AmountOutOfRange)
}

fn amount_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        balance: amount_column(row, 3)?,
        created_at: row.get(4)?,
    })
}

fn stats_from_row(row: &Row<'_>) -> rusqlite::Result<Stats> {
    Ok(Stats {
        games_played: amount_column(row, 0)?,
        games_won: amount_column(row, 1)?,
        games_lost: amount_column(row, 2)?,
        total_bet: amount_column(row, 3)?,
        total_won: amount_column(row, 4)?,
        biggest_win: amount_column(row, 5)?,
        biggest_loss: amount_column(row, 6)?,
    })
}

fn read_stats(conn: &Connection, account_id: i64) -> Result<Stats, StoreError> {
    conn.query_row(
        "SELECT games_played, games_won, games_lost, total_bet, total_won, biggest_win, biggest_loss
         FROM account_stats WHERE account_id = ?1",
        params![account_id],
        stats_from_row,
    )
    .optional()?
    .ok_or(StoreError::AccountNotFound)
}

fn write_stats(conn: &Connection, account_id: i64, stats: &Stats) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE account_stats SET
             games_played = ?1, games_won = ?2, games_lost = ?3,
             total_bet = ?4, total_won = ?5, biggest_win = ?6, biggest_loss = ?7
         WHERE account_id = ?8",
        params![
            sql_amount(stats.games_played)?,
            sql_amount(stats.games_won)?,
            sql_amount(stats.games_lost)?,
            sql_amount(stats.total_bet)?,
            sql_amount(stats.total_won)?,
            sql_amount(stats.biggest_win)?,
            sql_amount(stats.biggest_loss)?,
            account_id,
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::AccountNotFound);
    }
    Ok(())
}

fn read_balance(conn: &Connection, account_id: i64) -> Result<u64, StoreError> {
    conn.query_row(
        "SELECT balance FROM accounts WHERE id = ?1",
        params![account_id],
        |row| amount_column(row, 0),
    )
    .optional()?
    .ok_or(StoreError::AccountNotFound)
}

/// Persistent account store.
pub struct Vault {
    conn: Mutex<Connection>,
    starting_balance: u64,
}

impl Vault {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// created.
    pub fn open(path: &Path, starting_balance: u64) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?, starting_balance)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory(starting_balance: u64) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, starting_balance)
    }

    fn init(conn: Connection, starting_balance: u64) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            starting_balance,
        })
    }

    /// Returns the balance new accounts start with.
    #[must_use]
    pub const fn starting_balance(&self) -> u64 {
        self.starting_balance
    }

    /// Registers a new account with zeroed statistics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UsernameTaken`] for a duplicate username.
    pub fn create_account(
        &self,
        username: &str,
        password_hash: &str,
        now: i64,
    ) -> Result<Account, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO accounts (username, password_hash, balance, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![username, password_hash, sql_amount(self.starting_balance)?, now],
        );
        match inserted {
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::UsernameTaken);
            }
            other => other?,
        };

        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO account_stats (account_id) VALUES (?1)",
            params![id],
        )?;
        tx.commit()?;

        debug!(account_id = id, username, "account created");
        Ok(Account {
            id,
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            balance: self.starting_balance,
            created_at: now,
        })
    }

    /// Looks up an account by username.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if there is no such account.
    pub fn account_by_username(&self, username: &str) -> Result<Account, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1"),
            params![username],
            account_from_row,
        )
        .optional()?
        .ok_or(StoreError::AccountNotFound)
    }

    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if there is no such account.
    pub fn account_by_id(&self, account_id: i64) -> Result<Account, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
            params![account_id],
            account_from_row,
        )
        .optional()?
        .ok_or(StoreError::AccountNotFound)
    }

    /// Returns the balance in cents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if there is no such account.
    pub fn balance(&self, account_id: i64) -> Result<u64, StoreError> {
        read_balance(&self.conn.lock(), account_id)
    }

    /// Overwrites the balance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if there is no such account.
    pub fn set_balance(&self, account_id: i64, balance: u64, now: i64) -> Result<(), StoreError> {
        let changed = self.conn.lock().execute(
            "UPDATE accounts SET balance = ?1, updated_at = ?2 WHERE id = ?3",
            params![sql_amount(balance)?, now, account_id],
        )?;
        if changed == 0 {
            return Err(StoreError::AccountNotFound);
        }
        Ok(())
    }

    /// Removes `amount` from the balance if it is covered, returning the new
    /// balance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InsufficientFunds`] if the balance is smaller
    /// than `amount`; the balance is left untouched.
    pub fn debit(&self, account_id: i64, amount: u64, now: i64) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE accounts SET balance = balance - ?1, updated_at = ?2
             WHERE id = ?3 AND balance >= ?1",
            params![sql_amount(amount)?, now, account_id],
        )?;
        let balance = read_balance(&conn, account_id)?;
        if changed == 0 {
            return Err(StoreError::InsufficientFunds);
        }
        Ok(balance)
    }

    /// Adds `amount` to the balance, returning the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if there is no such account.
    pub fn credit(&self, account_id: i64, amount: u64, now: i64) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE accounts SET balance = balance + ?1, updated_at = ?2 WHERE id = ?3",
            params![sql_amount(amount)?, now, account_id],
        )?;
        if changed == 0 {
            return Err(StoreError::AccountNotFound);
        }
        read_balance(&conn, account_id)
    }

    /// Returns the account's statistics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if there is no such account.
    pub fn stats(&self, account_id: i64) -> Result<Stats, StoreError> {
        read_stats(&self.conn.lock(), account_id)
    }

    /// Overwrites the account's statistics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if there is no such account.
    pub fn set_stats(&self, account_id: i64, stats: &Stats) -> Result<(), StoreError> {
        write_stats(&self.conn.lock(), account_id, stats)
    }

    /// Reads, modifies and writes the statistics in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if there is no such account.
    pub fn update_stats(
        &self,
        account_id: i64,
        update: impl FnOnce(&mut Stats),
    ) -> Result<Stats, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut stats = read_stats(&tx, account_id)?;
        update(&mut stats);
        write_stats(&tx, account_id, &stats)?;
        tx.commit()?;
        Ok(stats)
    }

    /// Credits a round's payout and folds it into the statistics in one
    /// transaction, returning the new balance.
    ///
    /// Either both changes land or neither does.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if the account or its
    /// statistics row is missing.
    pub fn settle(
        &self,
        account_id: i64,
        payout: u64,
        now: i64,
        update: impl FnOnce(&mut Stats),
    ) -> Result<u64, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE accounts SET balance = balance + ?1, updated_at = ?2 WHERE id = ?3",
            params![sql_amount(payout)?, now, account_id],
        )?;
        if changed == 0 {
            return Err(StoreError::AccountNotFound);
        }

        let mut stats = read_stats(&tx, account_id)?;
        update(&mut stats);
        write_stats(&tx, account_id, &stats)?;

        let balance = read_balance(&tx, account_id)?;
        tx.commit()?;
        Ok(balance)
    }

    /// Stores a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_session(&self, session: &AuthSession) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO sessions (token, account_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.account_id,
                session.created_at,
                session.expires_at
            ],
        )?;
        Ok(())
    }

    /// Returns the session for `token` if it has not expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SessionNotFound`] for unknown or expired tokens.
    pub fn session(&self, token: &str, now: i64) -> Result<AuthSession, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT token, account_id, created_at, expires_at FROM sessions
             WHERE token = ?1 AND expires_at > ?2",
            params![token, now],
            |row| {
                Ok(AuthSession {
                    token: row.get(0)?,
                    account_id: row.get(1)?,
                    created_at: row.get(2)?,
                    expires_at: row.get(3)?,
                })
            },
        )
        .optional()?
        .ok_or(StoreError::SessionNotFound)
    }

    /// Deletes a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.conn
            .lock()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    /// Deletes every session expired at `now`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn purge_expired_sessions(&self, now: i64) -> Result<usize, StoreError> {
        let removed = self
            .conn
            .lock()
            .execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
        Ok(removed)
    }
}
