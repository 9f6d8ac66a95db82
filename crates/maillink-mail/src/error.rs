//! Error types for link delivery.

use maillink_page::PageError;

/// Errors that can occur while building or sending a login email.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The recipient or sender is not a valid email address.
    #[error("invalid email address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The configured base URL cannot be parsed.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The email template could not be loaded.
    #[error(transparent)]
    Template(#[from] PageError),

    /// The message could not be assembled.
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    /// The SMTP exchange failed (connection, authentication, rejection).
    #[error("failed to send email: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

impl MailError {
    /// Returns `true` when the failure is the user's input rather than the
    /// server's configuration or the mail relay.
    pub fn is_invalid_recipient(&self) -> bool {
        matches!(self, Self::InvalidAddress { .. })
    }
}
