//! Session types: the data structures that describe one login attempt.
//!
//! A "session" is the server's record of an email address that asked for
//! a magic link. It tracks:
//! - WHO asked (`Profile`)
//! - HOW they prove it (a one-time secret, then a cookie token)
//! - WHETHER the link has been clicked (`logged_in`)
//! - WHEN it stops being valid (`created_at + expiration`)

use std::fmt;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session stays valid after creation. Applied uniformly
    /// at creation time and never extended.
    ///
    /// Default: 31 days.
    pub expiration: Duration,

    /// How long an expired session is kept before
    /// [`cleanup_expired`](crate::SessionManager::cleanup_expired) may drop
    /// it. While kept, lookups still report the session as expired rather
    /// than missing.
    ///
    /// Default: 24 hours.
    pub sweep_retention: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration: Duration::from_secs(31 * 24 * 60 * 60),
            sweep_retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Internal identifier of a session record.
///
/// Never leaves the server: clients only ever see the secret (in the
/// emailed link) or the token (in the cookie).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sess-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// The identity a user supplied when asking for a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub email: String,
}

impl Profile {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A snapshot of one session record.
///
/// The [`SessionManager`](crate::SessionManager) owns the real record;
/// what callers get back is a copy taken under the store lock. Mutating
/// a session always goes through the manager, so the snapshot's
/// `logged_in` flag reflects the moment it was taken.
///
/// ```text
///   PENDING ──(consume_secret / login)──→ AUTHENTICATED ──(delete)──→ GONE
///      │                                        │
///      └──────────(deadline passes)─────────────┴──→ expired
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) secret: String,
    pub(crate) token: String,
    pub(crate) profile: Profile,
    pub(crate) created_at: Instant,
    /// `None` when `created_at + expiration` overflows the clock, which
    /// only happens for absurdly long expirations. Such sessions never
    /// expire.
    pub(crate) expires_at: Option<Instant>,
    pub(crate) logged_in: bool,
}

impl Session {
    /// Internal identifier of the record this snapshot was taken from.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The one-time secret embedded in the emailed link.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The token stored in the browser cookie.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether the link had been clicked when this snapshot was taken.
    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    /// Returns `true` once `now > created_at + expiration`.
    ///
    /// Evaluated against the clock on every call, so it can flip from
    /// `false` to `true` on the same snapshot but never back.
    pub fn expired(&self) -> bool {
        self.expired_at(Instant::now())
    }

    /// Time left before the session expires, zero if it already has.
    /// `Duration::MAX` for sessions that never expire.
    pub fn remaining(&self) -> Duration {
        match self.expires_at {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        }
    }

    pub(crate) fn expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now > deadline)
    }
}
