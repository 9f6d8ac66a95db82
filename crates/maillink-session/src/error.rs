//! Error types for the session layer.

/// Errors that can occur while logging in or authenticating.
///
/// Plain lookups never fail: they return `Option`. These variants come
/// from the operations that check state on top of a lookup.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session holds the given secret or token.
    /// It was never issued, has already been consumed, or was deleted.
    #[error("session not found")]
    NotFound,

    /// The session exists but its deadline has passed.
    #[error("session expired")]
    Expired,

    /// The session is already logged in, so its secret cannot be used again.
    #[error("login link already used")]
    AlreadyConsumed,

    /// The operating system's random source failed while minting a
    /// secret or token. No session was created.
    #[error("random source failure: {0}")]
    RandomSource(String),
}
