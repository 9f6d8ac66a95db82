//! The session manager: the in-memory store behind every magic link.
//!
//! It is responsible for:
//! - Minting sessions with a fresh secret and token
//! - Looking sessions up by secret (link click) or token (cookie)
//! - Burning the secret when the link is used
//! - Deleting sessions on logout
//! - Dropping long-expired sessions to bound memory
//!
//! # Concurrency note
//!
//! Unlike a single-owner registry, `SessionManager` is shared by every
//! request handler at once, so it carries its own lock. One
//! `parking_lot::Mutex` guards the record map and both indices together.
//! Every method takes the lock once, does O(1) map work and releases it;
//! nothing blocks on I/O while holding it.

use std::collections::HashMap;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::{Profile, Session, SessionConfig, SessionError, SessionId};

/// Number of random bytes behind each secret and token (256 bits).
const KEY_BYTES: usize = 32;

/// Store for all pending and logged-in sessions.
///
/// Share it between handlers as `Arc<SessionManager>`.
///
/// ## Lifecycle
///
/// ```text
/// create() ──→ consume_secret() ──→ authenticate() ... ──→ delete()
///    │               │                    │
///    ▼               ▼                    ▼
/// [Pending]    [LoggedIn, secret     [LoggedIn]
///                 burned]
///    │                                    │
///    └──── deadline passes ───────────────┴──→ [Expired] ──→ cleanup_expired()
/// ```
pub struct SessionManager {
    inner: Mutex<Inner>,
    config: SessionConfig,
}

/// Everything the lock protects.
///
/// `sessions` owns the records. `secrets` and `tokens` only map keys to
/// record ids and are kept in sync with `sessions` inside the same
/// critical section.
#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, Session>,
    secrets: HashMap<String, SessionId>,
    tokens: HashMap<String, SessionId>,
    next_id: u64,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Creates a pending session for `profile`.
    ///
    /// # Errors
    /// Returns [`SessionError::RandomSource`] if the OS random source
    /// fails. Nothing is stored in that case.
    pub fn create(&self, profile: Profile) -> Result<Session, SessionError> {
        loop {
            let secret = generate_key()?;
            let token = generate_key()?;

            let mut inner = self.inner.lock();
            if secret == token
                || inner.secrets.contains_key(&secret)
                || inner.tokens.contains_key(&token)
            {
                tracing::warn!("random key collision, regenerating");
                continue;
            }

            inner.next_id += 1;
            let id = SessionId::new(inner.next_id);
            let created_at = Instant::now();
            let session = Session {
                id,
                secret,
                token,
                profile,
                created_at,
                expires_at: created_at.checked_add(self.config.expiration),
                logged_in: false,
            };

            inner.secrets.insert(session.secret.clone(), id);
            inner.tokens.insert(session.token.clone(), id);
            inner.sessions.insert(id, session.clone());

            tracing::info!(session = %id, "session created");
            return Ok(session);
        }
    }

    /// Looks up a session by the secret from its emailed link.
    ///
    /// Returns `None` if the secret was never issued, has already been
    /// consumed by a login, or its session was deleted.
    pub fn get_by_secret(&self, secret: &str) -> Option<Session> {
        let inner = self.inner.lock();
        let id = inner.secrets.get(secret)?;
        inner.sessions.get(id).cloned()
    }

    /// Looks up a session by its cookie token.
    ///
    /// Pending sessions are returned too; use
    /// [`authenticate`](Self::authenticate) to gate requests.
    pub fn get_by_token(&self, token: &str) -> Option<Session> {
        let inner = self.inner.lock();
        let id = inner.tokens.get(token)?;
        inner.sessions.get(id).cloned()
    }

    /// Marks `session` as logged in and burns its secret.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: the session was deleted
    /// - [`SessionError::AlreadyConsumed`]: it is already logged in
    pub fn login(&self, session: &Session) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        let Inner {
            sessions, secrets, ..
        } = &mut *inner;

        let record = sessions
            .get_mut(&session.id)
            .ok_or(SessionError::NotFound)?;
        if record.logged_in {
            return Err(SessionError::AlreadyConsumed);
        }

        record.logged_in = true;
        secrets.remove(&record.secret);

        tracing::info!(session = %record.id, "session logged in");
        Ok(())
    }

    /// Looks up `secret`, checks it and logs its session in, all under one
    /// lock.
    ///
    /// This is what a link click should call. Two clicks racing on the same
    /// secret cannot both succeed: the first one removes the secret from
    /// the index before the lock is released.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: unknown or already consumed secret
    /// - [`SessionError::Expired`]: the link outlived its deadline; the
    ///   secret stays in place so later clicks get the same answer
    /// - [`SessionError::AlreadyConsumed`]: the session is logged in
    pub fn consume_secret(&self, secret: &str) -> Result<Session, SessionError> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let Inner {
            sessions, secrets, ..
        } = &mut *inner;

        let id = secrets.get(secret).copied().ok_or(SessionError::NotFound)?;
        let record = sessions.get_mut(&id).ok_or(SessionError::NotFound)?;

        if record.expired_at(now) {
            return Err(SessionError::Expired);
        }
        if record.logged_in {
            return Err(SessionError::AlreadyConsumed);
        }

        record.logged_in = true;
        secrets.remove(secret);

        tracing::info!(session = %id, "login link consumed");
        Ok(record.clone())
    }

    /// Resolves a cookie token to a logged-in, unexpired session.
    ///
    /// Pending sessions are reported as [`SessionError::NotFound`]: their
    /// token has not been handed to any browser yet, so a request carrying
    /// it is not trusted.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: unknown token or pending session
    /// - [`SessionError::Expired`]: the session outlived its deadline
    pub fn authenticate(&self, token: &str) -> Result<Session, SessionError> {
        let now = Instant::now();
        let inner = self.inner.lock();

        let record = inner
            .tokens
            .get(token)
            .and_then(|id| inner.sessions.get(id))
            .ok_or(SessionError::NotFound)?;

        if !record.logged_in {
            return Err(SessionError::NotFound);
        }
        if record.expired_at(now) {
            return Err(SessionError::Expired);
        }
        Ok(record.clone())
    }

    /// Removes `session` and both of its index entries.
    ///
    /// Returns `false` if it was already gone; calling this twice is
    /// harmless.
    pub fn delete(&self, session: &Session) -> bool {
        let mut inner = self.inner.lock();
        let Some(record) = inner.sessions.remove(&session.id) else {
            return false;
        };
        inner.secrets.remove(&record.secret);
        inner.tokens.remove(&record.token);

        tracing::info!(session = %record.id, "session deleted");
        true
    }

    /// Removes the session holding `token`, whatever its state.
    ///
    /// Returns `false` if no session holds it.
    pub fn delete_by_token(&self, token: &str) -> bool {
        let mut inner = self.inner.lock();
        let Some(id) = inner.tokens.remove(token) else {
            return false;
        };
        let Some(record) = inner.sessions.remove(&id) else {
            return false;
        };
        inner.secrets.remove(&record.secret);

        tracing::info!(session = %record.id, "session deleted by token");
        true
    }

    /// Drops every session whose deadline passed more than
    /// `config.sweep_retention` ago.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let retention = self.config.sweep_retention;
        let mut inner = self.inner.lock();
        let Inner {
            sessions,
            secrets,
            tokens,
            ..
        } = &mut *inner;

        let before = sessions.len();
        sessions.retain(|_, session| {
            let stale = session
                .expires_at
                .and_then(|deadline| deadline.checked_add(retention))
                .is_some_and(|cutoff| now > cutoff);
            if stale {
                secrets.remove(&session.secret);
                tokens.remove(&session.token);
            }
            !stale
        });

        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, "expired sessions cleaned up");
        }
        removed
    }

    /// Returns the number of stored sessions (any state).
    pub fn len(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Draws [`KEY_BYTES`] from the OS random source and encodes them as
/// unpadded base64url, giving a 43-character string safe in URLs and
/// cookies.
fn generate_key() -> Result<String, SessionError> {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::RandomSource(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

// =========================================================================
// Tests
// =========================================================================
