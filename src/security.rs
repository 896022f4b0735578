//! Credential checks, password hashing and session management.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::vault::{Account, AuthSession, StoreError, Vault};

/// Shortest allowed username or password.
pub const MIN_CREDENTIAL_LEN: usize = 2;
/// Longest allowed username or password.
pub const MAX_CREDENTIAL_LEN: usize = 30;
/// Default lifetime of a login session.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password breaks the credential rules.
    #[error("{0}")]
    InvalidCredential(String),
    /// Username is registered already.
    #[error("username already exists")]
    UsernameTaken,
    /// Unknown user or wrong password; deliberately indistinguishable.
    #[error("invalid username or password")]
    InvalidLogin,
    /// Unknown, logged-out or expired token.
    #[error("invalid or expired session")]
    InvalidSession,
    /// Hashing failed.
    #[error("failed to hash password")]
    Hash,
    /// Store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken => Self::UsernameTaken,
            StoreError::SessionNotFound => Self::InvalidSession,
            other => Self::Store(other),
        }
    }
}

/// Returns the current time in unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

fn validate_credential(kind: &str, value: &str) -> Result<(), AuthError> {
    let len = value.chars().count();
    if len < MIN_CREDENTIAL_LEN {
        return Err(AuthError::InvalidCredential(format!(
            "{kind} must be at least {MIN_CREDENTIAL_LEN} characters long"
        )));
    }
    if len > MAX_CREDENTIAL_LEN {
        return Err(AuthError::InvalidCredential(format!(
            "{kind} must be no more than {MAX_CREDENTIAL_LEN} characters long"
        )));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidCredential(format!(
            "{kind} cannot contain whitespace"
        )));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AuthError::InvalidCredential(format!(
            "{kind} can only contain letters, numbers, and underscores"
        )));
    }
    Ok(())
}

/// Checks a username against the credential rules.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredential`] describing the first broken rule.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    validate_credential("username", username)
}

/// Checks a password against the credential rules and the username.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredential`] describing the first broken rule.
pub fn validate_password(password: &str, username: &str) -> Result<(), AuthError> {
    validate_credential("password", password)?;
    if password == username {
        return Err(AuthError::InvalidCredential(
            "password cannot be the same as username".to_owned(),
        ));
    }
    Ok(())
}

/// Hashes a password into an Argon2 PHC string with a random salt.
///
/// # Errors
///
/// Returns [`AuthError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|_| AuthError::Hash)?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Hash)
}

/// Returns whether `password` matches the stored PHC string.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Account registration and session lifecycle on top of a [`Vault`].
#[derive(Clone)]
pub struct Auth {
    vault: Arc<Vault>,
    session_ttl: Duration,
}

impl Auth {
    /// Creates the service with the given session lifetime.
    #[must_use]
    pub const fn new(vault: Arc<Vault>, session_ttl: Duration) -> Self {
        Self { vault, session_ttl }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn vault(&self) -> &Arc<Vault> {
        &self.vault
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials break the rules or the username is
    /// taken.
    pub fn register(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        validate_username(username)?;
        validate_password(password, username)?;

        let hash = hash_password(password)?;
        let account = self.vault.create_account(username, &hash, unix_now())?;
        info!(account_id = account.id, username, "registered account");
        Ok(account)
    }

    /// Verifies credentials and opens a session, returning its token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidLogin`] for an unknown user or a wrong
    /// password.
    pub fn login(&self, username: &str, password: &str) -> Result<(String, Account), AuthError> {
        let account = match self.vault.account_by_username(username) {
            Ok(account) => account,
            Err(StoreError::AccountNotFound) => return Err(AuthError::InvalidLogin),
            Err(err) => return Err(err.into()),
        };

        if !verify_password(password, &account.password_hash) {
            warn!(username, "failed login attempt");
            return Err(AuthError::InvalidLogin);
        }

        let now = unix_now();
        let ttl = i64::try_from(self.session_ttl.as_secs()).unwrap_or(i64::MAX);
        let session = AuthSession {
            token: Uuid::new_v4().to_string(),
            account_id: account.id,
            created_at: now,
            expires_at: now.saturating_add(ttl),
        };
        self.vault.create_session(&session)?;

        info!(account_id = account.id, username, "logged in");
        Ok((session.token, account))
    }

    /// Ends a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.vault.delete_session(token)?;
        Ok(())
    }

    /// Resolves a token to its account, with a fresh balance.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSession`] for unknown or expired tokens.
    pub fn validate(&self, token: &str) -> Result<Account, AuthError> {
        let session = self.vault.session(token, unix_now())?;
        match self.vault.account_by_id(session.account_id) {
            Ok(account) => Ok(account),
            Err(StoreError::AccountNotFound) => Err(AuthError::InvalidSession),
            Err(err) => Err(err.into()),
        }
    }
}
