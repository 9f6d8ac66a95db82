//! # maillink
//!
//! Passwordless ("magic link") authentication server.
//!
//! A user submits an email address, receives a one-time link, and clicking
//! it sets a session cookie. Every later request is authenticated by that
//! cookie until logout or expiry. Authenticated responses carry an
//! `X-Auth-Email` header so the server can sit behind a reverse proxy as
//! an auth gate.
//!
//! The crate ties the layers together: HTTP front (this crate) →
//! sessions ([`maillink_session`]) → delivery ([`maillink_mail`]) and
//! pages ([`maillink_page`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use maillink::prelude::*;
//!
//! # async fn start() -> Result<(), MaillinkError> {
//! let email = LoginEmail::new("My App", "http://127.0.0.1:8080/", None)?;
//! let server = MaillinkServerBuilder::new()
//!     .config(ServerConfig::default())
//!     .build(LogMailer::new(email))?;
//! server.run().await
//! # }
//! ```

mod config;
mod cookies;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::MaillinkError;
pub use server::{MaillinkServer, MaillinkServerBuilder};

/// Everything needed to configure and start a server.
pub mod prelude {
    pub use crate::{MaillinkError, MaillinkServer, MaillinkServerBuilder, ServerConfig};
    pub use maillink_mail::{LogMailer, LoginEmail, MailConfig, MailError, Mailer, SmtpMailer};
    pub use maillink_page::{PageConfig, Pages};
    pub use maillink_session::{Profile, Session, SessionConfig, SessionError, SessionManager};
}
