//! SMTP delivery using `lettre`'s async transport on Tokio.

use std::path::PathBuf;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use maillink_session::Session;

use crate::{LoginEmail, MailError, Mailer, parse_recipient};

/// Configuration for [`SmtpMailer`].
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Used as the sender's display name and in the subject line.
    pub app_name: String,

    /// Base URL the login link points at.
    pub app_url: String,

    /// Optional email body template (`app_name`, `email`, `link`).
    pub template_path: Option<PathBuf>,

    pub from_address: String,

    /// SMTP relay host. The connection is plain (no TLS), as for a local
    /// relay.
    pub host: String,
    pub port: u16,

    /// SMTP credentials. No authentication when `username` is empty.
    pub username: String,
    pub password: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            app_name: "E-mail proxy auth".to_string(),
            app_url: "http://127.0.0.1:8080/".to_string(),
            template_path: None,
            from_address: "admin@localhost".to_string(),
            host: "127.0.0.1".to_string(),
            port: 25,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// A [`Mailer`] that sends the login email through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    email: LoginEmail,
}

impl SmtpMailer {
    /// Prepares the transport. No connection is made until the first send.
    ///
    /// # Errors
    /// - [`MailError::InvalidAddress`]: bad `from_address`
    /// - [`MailError::InvalidBaseUrl`] / [`MailError::Template`]: see
    ///   [`LoginEmail::new`]
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let email = LoginEmail::new(
            &config.app_name,
            &config.app_url,
            config.template_path.as_deref(),
        )?;

        let address: Address = config.from_address.parse().map_err(|e| {
            MailError::InvalidAddress {
                address: config.from_address.clone(),
                reason: format!("{e}"),
            }
        })?;
        let from = Mailbox::new(Some(config.app_name.clone()), address);

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
                .port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }
        let transport: AsyncSmtpTransport<Tokio1Executor> = builder.build();

        tracing::info!(
            host = %config.host,
            port = config.port,
            from = %config.from_address,
            "SMTP mailer configured"
        );
        Ok(Self {
            transport,
            from,
            email,
        })
    }

    /// Assembles the message for `session` without sending it.
    ///
    /// # Errors
    /// [`MailError::InvalidAddress`] if the session's email cannot be used
    /// as a recipient.
    pub fn message(
        &self,
        session: &Session,
        redirect_to: &str,
    ) -> Result<Message, MailError> {
        // Bare address only, so the envelope recipient is the stored email.
        let to = Mailbox::new(None, parse_recipient(&session.profile().email)?);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(self.email.subject())
            .header(ContentType::TEXT_HTML)
            .body(self.email.body(session, redirect_to))?;
        Ok(message)
    }
}

impl Mailer for SmtpMailer {
    async fn send(
        &self,
        session: &Session,
        redirect_to: &str,
    ) -> Result<(), MailError> {
        let message = self.message(session, redirect_to)?;
        self.transport.send(message).await?;

        tracing::info!(session = %session.id(), "login link sent");
        Ok(())
    }
}
