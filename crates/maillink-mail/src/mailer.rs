//! The delivery hook the HTTP front calls after creating a session.
//!
//! # Why a trait?
//!
//! The server should not care whether links go out over SMTP, into a log
//! or into a test's inbox. [`Mailer`] is the seam: production uses
//! [`SmtpMailer`](crate::SmtpMailer), development uses [`LogMailer`], and
//! tests plug in a recorder.

use std::future::Future;

use maillink_session::Session;

use crate::{LoginEmail, MailError};

/// Delivers the one-time login link for a session.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one mailer is shared by every request
///   handler for the lifetime of the server.
/// - The returned future is `Send` so handlers can run on any worker
///   thread.
pub trait Mailer: Send + Sync + 'static {
    /// Sends the link for `session` to `session.profile().email`.
    ///
    /// `redirect_to` is where the user lands after the link logs them in;
    /// empty means the application's base URL.
    fn send(
        &self,
        session: &Session,
        redirect_to: &str,
    ) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// A [`Mailer`] that logs the link instead of sending it.
///
/// The link contains the session secret, so this is for local development
/// only.
#[derive(Debug, Clone)]
pub struct LogMailer {
    email: LoginEmail,
}

impl LogMailer {
    pub fn new(email: LoginEmail) -> Self {
        Self { email }
    }
}

impl Mailer for LogMailer {
    async fn send(
        &self,
        session: &Session,
        redirect_to: &str,
    ) -> Result<(), MailError> {
        let link = self.email.link(session, redirect_to);
        tracing::info!(
            session = %session.id(),
            email = %session.profile().email,
            %link,
            "login link (not sent)"
        );
        Ok(())
    }
}
