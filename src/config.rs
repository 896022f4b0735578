//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::security::SESSION_TTL;
use crate::vault::STARTING_BALANCE;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 9090;

/// Configuration for a casino server.
///
/// Use the builder pattern to customize settings:
///
/// ```
/// use std::time::Duration;
/// use bjcasino::ServerConfig;
///
/// let config = ServerConfig::default()
///     .with_read_timeout(Duration::from_secs(30))
///     .with_starting_balance(50_000);
/// assert_eq!(config.starting_balance, 50_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: SocketAddr,
    /// SQLite database file. `None` keeps everything in memory.
    pub database: Option<PathBuf>,
    /// Idle time after which a connection is dropped.
    pub read_timeout: Duration,
    /// Period of the expired-session sweep.
    pub sweep_interval: Duration,
    /// Lifetime of a login session.
    pub session_ttl: Duration,
    /// Balance in cents credited to new accounts.
    pub starting_balance: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            database: Some(PathBuf::from("casino.db")),
            read_timeout: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
            session_ttl: SESSION_TTL,
            starting_balance: STARTING_BALANCE,
        }
    }
}

impl ServerConfig {
    /// Sets the listen address.
    #[must_use]
    pub const fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Sets the database file, or `None` for an in-memory store.
    #[must_use]
    pub fn with_database(mut self, database: Option<PathBuf>) -> Self {
        self.database = database;
        self
    }

    /// Sets the idle read timeout.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets how often expired sessions are purged.
    ///
    /// A zero interval is raised to one second.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(Duration::from_secs(1));
        self
    }

    /// Sets the session lifetime.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Sets the balance new accounts start with, in cents.
    #[must_use]
    pub const fn with_starting_balance(mut self, cents: u64) -> Self {
        self.starting_balance = cents;
        self
    }
}
