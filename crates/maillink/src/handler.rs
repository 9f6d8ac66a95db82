//! Request handling: link clicks, the login form and authenticated requests.
//!
//! Every path goes through [`handle`]. The flow is:
//!   1. `GET ?login=<secret>` → consume the secret, set the cookie, redirect
//!   2. No session cookie → login form (`GET`) or link request (`POST`)
//!   3. Session cookie → authenticate, then logout (`POST logout=…`) or
//!      the landing page with `X-Auth-Email`

use std::sync::Arc;

use axum::Form;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use cookie::Cookie;
use maillink_mail::{Mailer, parse_recipient};
use maillink_session::{Profile, Session, SessionError};

use crate::cookies::{expired_cookie, find_token, session_cookie};
use crate::server::AppState;

/// Header carrying the authenticated email, for a reverse proxy to forward.
pub(crate) const X_AUTH_EMAIL: HeaderName = HeaderName::from_static("x-auth-email");

/// Raw `key=value` pairs of a query string or urlencoded form body.
type Pairs = Vec<(String, String)>;

/// Returns the first value of `key`, or an empty string.
///
/// Repeated keys are not an error: the first occurrence wins.
fn first(pairs: &[(String, String)], key: &str) -> String {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

/// Query parameters understood on every path.
#[derive(Debug, Default)]
pub(crate) struct LinkParams {
    /// The one-time secret from an emailed link.
    login: String,
    /// Where to go after login.
    to: String,
}

impl LinkParams {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            login: first(pairs, "login"),
            to: first(pairs, "to"),
        }
    }
}

/// Form fields of the login and logout forms.
#[derive(Debug, Default)]
pub(crate) struct FormFields {
    email: String,
    logout: String,
}

impl FormFields {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            email: first(pairs, "email"),
            logout: first(pairs, "logout"),
        }
    }
}

/// Single entry point for all requests.
pub(crate) async fn handle<M: Mailer>(
    State(state): State<Arc<AppState<M>>>,
    method: Method,
    headers: HeaderMap,
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Response {
    // Unparseable queries and non-form bodies count as empty.
    let params = query
        .map(|Query(pairs)| LinkParams::from_pairs(&pairs))
        .unwrap_or_default();
    let form = form
        .map(|Form(pairs)| FormFields::from_pairs(&pairs))
        .unwrap_or_default();

    if method == Method::GET && !params.login.is_empty() {
        match state.sessions.consume_secret(&params.login) {
            Ok(session) => return complete_login(&state, &session, &params.to),
            Err(SessionError::Expired) => {
                return error_page(
                    &state,
                    "Link already expired, please request new",
                    StatusCode::BAD_REQUEST,
                );
            }
            Err(SessionError::AlreadyConsumed) => {
                return error_page(
                    &state,
                    "Link has been already used, please request new",
                    StatusCode::CONFLICT,
                );
            }
            // Unknown or used-up secret: carry on as if there was none.
            Err(e) => tracing::debug!(error = %e, "login link not accepted"),
        }
    }

    match find_token(&headers, &state.config.cookie_name) {
        Some(token) => authenticated(&state, &method, &token, &form),
        None => login_page(&state, &method, &params.to, &form).await,
    }
}

/// Sets the session cookie and sends the user on to `redirect_to`.
fn complete_login<M: Mailer>(
    state: &AppState<M>,
    session: &Session,
    redirect_to: &str,
) -> Response {
    // TODO: check redirect_to against an allow-list of hosts.
    let target = if redirect_to.is_empty() {
        state.config.base_url.as_str()
    } else {
        redirect_to
    };

    tracing::info!(session = %session.id(), "login completed");
    with_cookie(
        Redirect::temporary(target).into_response(),
        session_cookie(&state.config, session),
    )
}

/// Requests without a session cookie: show the form or mail a link.
async fn login_page<M: Mailer>(
    state: &AppState<M>,
    method: &Method,
    redirect_to: &str,
    form: &FormFields,
) -> Response {
    if method == Method::GET {
        return page(StatusCode::OK, state.pages.login(redirect_to));
    }
    if method != Method::POST {
        return error_page(state, "Method not allowed", StatusCode::METHOD_NOT_ALLOWED);
    }

    let email = form.email.trim();
    if email.is_empty() {
        return error_page(state, "No email provided", StatusCode::BAD_REQUEST);
    }
    // The session must carry exactly the mailbox the link goes to.
    let address = match parse_recipient(email) {
        Ok(address) => address,
        Err(e) => {
            tracing::debug!(error = %e, "rejected login request");
            return error_page(state, &e.to_string(), StatusCode::BAD_REQUEST);
        }
    };

    let session = match state.sessions.create(Profile::new(address.to_string())) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "failed to create session");
            return error_page(
                state,
                "Could not start a login, please try again",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };

    if let Err(e) = state.mailer.send(&session, redirect_to).await {
        // Nobody can ever receive this secret, so drop the session now.
        state.sessions.delete(&session);

        if e.is_invalid_recipient() {
            tracing::debug!(error = %e, "rejected login request");
            return error_page(state, &e.to_string(), StatusCode::BAD_REQUEST);
        }
        tracing::error!(session = %session.id(), error = %e, "failed to send login link");
        return error_page(
            state,
            "Could not send the login email, please try again later",
            StatusCode::INTERNAL_SERVER_ERROR,
        );
    }

    page(
        StatusCode::OK,
        state
            .pages
            .success("Please check your E-Mail inbox for further instructions."),
    )
}

/// Requests with a session cookie: logout or the landing page.
fn authenticated<M: Mailer>(
    state: &AppState<M>,
    method: &Method,
    token: &str,
    form: &FormFields,
) -> Response {
    let session = match state.sessions.authenticate(token) {
        Ok(session) => session,
        Err(SessionError::Expired) => {
            return with_cookie(
                error_page(state, "Session expired", StatusCode::FORBIDDEN),
                expired_cookie(&state.config),
            );
        }
        Err(e) => {
            tracing::debug!(error = %e, "session cookie rejected");
            return with_cookie(
                error_page(state, "Token not found", StatusCode::UNAUTHORIZED),
                expired_cookie(&state.config),
            );
        }
    };

    if method == Method::POST && !form.logout.is_empty() {
        state.sessions.delete(&session);
        return with_cookie(
            page(
                StatusCode::OK,
                state.pages.success("You have been successfully logged out"),
            ),
            expired_cookie(&state.config),
        );
    }

    let mut response = page(StatusCode::OK, state.pages.logged_in());
    match HeaderValue::from_str(&session.profile().email) {
        Ok(value) => {
            response.headers_mut().insert(X_AUTH_EMAIL, value);
        }
        Err(e) => {
            tracing::warn!(session = %session.id(), error = %e, "email is not a valid header value");
        }
    }
    response
}

fn page(status: StatusCode, html: String) -> Response {
    (status, Html(html)).into_response()
}

fn error_page<M: Mailer>(state: &AppState<M>, message: &str, status: StatusCode) -> Response {
    page(status, state.pages.error(message, status.as_u16()))
}

fn with_cookie(mut response: Response, cookie: Cookie<'_>) -> Response {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "cookie is not a valid header value"),
    }
    response
}
