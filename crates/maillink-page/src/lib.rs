//! HTML rendering for maillink.
//!
//! Two pieces:
//!
//! - [`Template`]: a tiny `{{placeholder}}` engine that HTML-escapes
//!   every value it substitutes. Shared with the mail crate, which renders
//!   the login email with it.
//! - [`Pages`]: the four views the HTTP front serves: the login form, an
//!   error page, a success message and the logged-in landing page. They
//!   take plain strings and status codes, never session internals.

mod error;
mod pages;
mod template;

pub use error::PageError;
pub use pages::{PageConfig, Pages};
pub use template::Template;
