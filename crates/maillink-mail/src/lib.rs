//! Magic-link delivery for maillink.
//!
//! The HTTP front does not know how a link reaches the user. It only holds
//! something implementing [`Mailer`]:
//!
//! - [`SmtpMailer`]: renders the login email and sends it over SMTP
//! - [`LogMailer`]: writes the link to the log instead (local development)
//!
//! Both build the link with [`LoginEmail`], which joins the base URL, the
//! session secret and the post-login redirect target.

mod address;
mod email;
mod error;
mod mailer;
mod smtp;

pub use address::parse_recipient;
pub use email::LoginEmail;
pub use error::MailError;
pub use mailer::{LogMailer, Mailer};
pub use smtp::{MailConfig, SmtpMailer};
