//! Magic-link session management for maillink.
//!
//! This crate owns every login attempt the server knows about:
//!
//! 1. **Creation**: a user asks for a link, [`SessionManager::create`]
//!    mints a one-time secret (for the email) and a token (for the cookie)
//! 2. **Login**: the link is clicked, [`SessionManager::consume_secret`]
//!    burns the secret and marks the session as logged in
//! 3. **Authentication**: every later request presents the cookie token
//!    to [`SessionManager::authenticate`]
//! 4. **Expiry**: sessions carry a fixed deadline; an optional
//!    [`spawn_sweeper`] task drops long-dead records
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP front (maillink)       ← maps requests and cookies to store calls
//!     ↕
//! Session layer (this crate)  ← owns session records and their indices
//!     ↕
//! Delivery (maillink-mail)    ← reads the secret to build the emailed link
//! ```

mod error;
mod manager;
mod session;
mod sweep;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Profile, Session, SessionConfig, SessionId};
pub use sweep::spawn_sweeper;
