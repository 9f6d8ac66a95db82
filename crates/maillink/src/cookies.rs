//! The session cookie: issuing, clearing and reading it.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use cookie::{Cookie, SameSite};
use maillink_session::Session;
use time::OffsetDateTime;

use crate::ServerConfig;

/// Builds the cookie that carries `session`'s token.
///
/// It expires together with the session. Sessions too long-lived to
/// express as a timestamp get a browser-session cookie instead.
pub(crate) fn session_cookie(config: &ServerConfig, session: &Session) -> Cookie<'static> {
    let mut builder = base(config, session.token().to_owned());
    if let Some(expires) = time::Duration::try_from(session.remaining())
        .ok()
        .and_then(|remaining| OffsetDateTime::now_utc().checked_add(remaining))
    {
        builder = builder.expires(expires);
    }
    builder.build()
}

/// Builds a cookie that makes the browser drop the session cookie
/// immediately (expiry at the Unix epoch).
pub(crate) fn expired_cookie(config: &ServerConfig) -> Cookie<'static> {
    base(config, String::new())
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Returns the value of the cookie named `name`, if the request has one.
pub(crate) fn find_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

fn base(config: &ServerConfig, value: String) -> cookie::CookieBuilder<'static> {
    let builder = Cookie::build((config.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie);
    if config.secure_cookie {
        builder.same_site(SameSite::None)
    } else {
        builder
    }
}
