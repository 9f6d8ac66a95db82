//! Unified error type for maillink.

use maillink_mail::MailError;
use maillink_page::PageError;
use maillink_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MaillinkError {
    /// A session-level error (random source, lookups).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A delivery error (address, template, SMTP).
    #[error(transparent)]
    Mail(#[from] MailError),

    /// A page template error.
    #[error(transparent)]
    Page(#[from] PageError),

    /// Binding or serving the listener failed.
    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}
