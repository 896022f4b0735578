//! TCP transport: accept loop, per-connection tasks and the session sweeper.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, MissedTickBehavior};
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use crate::config::ServerConfig;
use crate::security::{Auth, unix_now};
use crate::vault::{StoreError, Vault};

pub mod session;

pub use session::{CommandError, GameFactory, Reply, Session};

/// First line sent on every new connection.
pub const GREETING: &str = "OK Welcome to the casino! Type HELP for commands.";

/// Opens the store described by `config`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or initialised.
pub fn open_vault(config: &ServerConfig) -> Result<Arc<Vault>, StoreError> {
    let vault = match &config.database {
        Some(path) => Vault::open(path, config.starting_balance)?,
        None => Vault::open_in_memory(config.starting_balance)?,
    };
    Ok(Arc::new(vault))
}

/// Starts the periodic purge of expired sessions.
///
/// The sweep only touches the session table and never blocks game play.
pub fn spawn_session_sweeper(vault: Arc<Vault>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match vault.purge_expired_sessions(unix_now()) {
                Ok(0) => {}
                Ok(removed) => info!(removed, "purged expired sessions"),
                Err(err) => error!(%err, "session sweep failed"),
            }
        }
    })
}

/// Accepts connections forever, serving each on its own task.
///
/// # Errors
///
/// Only returns if the listener's local address cannot be read.
pub async fn run(listener: TcpListener, auth: Auth, config: &ServerConfig) -> io::Result<()> {
    info!(addr = %listener.local_addr()?, "casino listening");
    let _sweeper = spawn_session_sweeper(Arc::clone(auth.vault()), config.sweep_interval);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };

        let session = Session::new(auth.clone());
        let read_timeout = config.read_timeout;
        let span = info_span!("conn", %peer);
        tokio::spawn(
            async move {
                info!("client connected");
                match serve_connection(stream, session, read_timeout).await {
                    Ok(()) => info!("client disconnected"),
                    Err(err) => warn!(%err, "connection error"),
                }
            }
            .instrument(span),
        );
    }
}

/// Runs the line protocol on one byte stream until the client quits,
/// disconnects or stays idle for longer than `read_timeout`.
///
/// # Errors
///
/// Returns an error if reading or writing the stream fails.
pub async fn serve_connection<S>(
    stream: S,
    mut session: Session,
    read_timeout: Duration,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(format!("{GREETING}\n").as_bytes()).await?;

    loop {
        let line = match time::timeout(read_timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                info!(timeout = ?read_timeout, "read timed out");
                break;
            }
        };

        // Password hashing and SQLite calls block, so keep them off the reactor.
        let span = Span::current();
        let (returned, reply) = task::spawn_blocking(move || {
            let reply = span.in_scope(|| session.handle_line(&line));
            (session, reply)
        })
        .await
        .map_err(io::Error::other)?;
        session = returned;

        let Some(reply) = reply else {
            continue;
        };
        writer.write_all(format!("{}\n", reply.text).as_bytes()).await?;
        writer.flush().await?;

        if reply.close {
            break;
        }
    }

    if session.has_unfinished_game() {
        warn!("connection closed mid-round; escrowed stake is forfeited");
    }
    if let Err(err) = writer.shutdown().await {
        debug!(%err, "shutdown after close failed");
    }
    Ok(())
}
