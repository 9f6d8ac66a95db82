//! Integration tests for the HTTP front: the full magic-link flow driven
//! through the router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use cookie::{Cookie, SameSite};
use maillink::prelude::*;
use time::OffsetDateTime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tower::ServiceExt;

// =========================================================================
// Recording mailer
// =========================================================================

/// One captured delivery.
#[derive(Debug, Clone)]
struct Sent {
    email: String,
    secret: String,
    redirect_to: String,
}

/// Keeps every link it is asked to send instead of emailing it.
#[derive(Clone, Default)]
struct Inbox {
    sent: Arc<Mutex<Vec<Sent>>>,
}

impl Inbox {
    async fn last(&self) -> Sent {
        self.sent
            .lock()
            .await
            .last()
            .cloned()
            .expect("a link should have been sent")
    }

    async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Mailer for Inbox {
    async fn send(&self, session: &Session, redirect_to: &str) -> Result<(), MailError> {
        self.sent.lock().await.push(Sent {
            email: session.profile().email.clone(),
            secret: session.secret().to_owned(),
            redirect_to: redirect_to.to_owned(),
        });
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

struct TestServer {
    router: Router,
    sessions: Arc<SessionManager>,
    inbox: Inbox,
}

fn server_with(config: ServerConfig, expiration: Duration) -> TestServer {
    let inbox = Inbox::default();
    let server = MaillinkServerBuilder::new()
        .config(config)
        .session_config(SessionConfig {
            expiration,
            ..SessionConfig::default()
        })
        .build(inbox.clone())
        .expect("server should build");
    TestServer {
        router: server.router(),
        sessions: Arc::clone(server.sessions()),
        inbox,
    }
}

fn server() -> TestServer {
    server_with(ServerConfig::default(), Duration::from_secs(3600))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Reply {
    fn set_cookie(&self) -> Option<Cookie<'static>> {
        let raw = self.headers.get(SET_COOKIE)?.to_str().ok()?.to_owned();
        Some(Cookie::parse(raw).expect("valid Set-Cookie"))
    }
}

async fn call(router: &Router, req: Request<Body>) -> Reply {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    Reply {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(form.to_owned())).unwrap()
}

/// Requests a link for `email` and returns its secret.
async fn request_link(srv: &TestServer, email: &str) -> String {
    let form = format!("email={}", email.replace('@', "%40"));
    let reply = call(&srv.router, post("/", &form, None)).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    srv.inbox.last().await.secret
}

/// Requests a link, clicks it and returns the `Cookie` request header.
async fn log_in(srv: &TestServer, email: &str) -> String {
    let secret = request_link(srv, email).await;
    let reply = call(&srv.router, get(&format!("/?login={secret}"), None)).await;
    let cookie = reply.set_cookie().expect("login sets a cookie");
    format!("{}={}", cookie.name(), cookie.value())
}

// =========================================================================
// Login form
// =========================================================================

#[tokio::test]
async fn test_get_without_cookie_renders_login_form() {
    let srv = server();

    let reply = call(&srv.router, get("/", None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("name=\"email\""));
    assert!(reply.set_cookie().is_none());
}

#[tokio::test]
async fn test_post_empty_email_returns_bad_request() {
    let srv = server();

    let reply = call(&srv.router, post("/", "email=", None)).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("No email provided"));
    assert!(srv.sessions.is_empty());
}

#[tokio::test]
async fn test_post_email_sends_link_and_confirms() {
    let srv = server();

    let reply = call(&srv.router, post("/", "email=a%40b.com", None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Please check your E-Mail inbox"));
    assert_eq!(srv.inbox.count().await, 1);
    let sent = srv.inbox.last().await;
    assert_eq!(sent.email, "a@b.com");
    assert_eq!(sent.redirect_to, "");

    let session = srv.sessions.get_by_secret(&sent.secret).expect("pending session");
    assert!(!session.logged_in());
}

#[tokio::test]
async fn test_post_email_keeps_redirect_target() {
    let srv = server();

    let uri = "/?to=https%3A%2F%2Fapp.example%2Fhome";
    call(&srv.router, post(uri, "email=a%40b.com", None)).await;

    assert_eq!(srv.inbox.last().await.redirect_to, "https://app.example/home");
}

#[tokio::test]
async fn test_put_without_cookie_returns_method_not_allowed() {
    let srv = server();
    let req = Request::builder()
        .method("PUT")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let reply = call(&srv.router, req).await;

    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_post_display_name_email_returns_bad_request_without_session() {
    let srv = server();
    // "admin@corp.com" <me@attacker.example>
    let form = "email=%22admin%40corp.com%22+%3Cme%40attacker.example%3E";

    let reply = call(&srv.router, post("/", form, None)).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("invalid email address"), "{}", reply.body);
    assert!(srv.sessions.is_empty());
    assert_eq!(srv.inbox.count().await, 0);
}

#[tokio::test]
async fn test_post_email_stores_bare_address() {
    let srv = server();

    call(&srv.router, post("/", "email=+a%40b.com+", None)).await;

    let sent = srv.inbox.last().await;
    assert_eq!(sent.email, "a@b.com");
    let session = srv.sessions.get_by_secret(&sent.secret).unwrap();
    assert_eq!(session.profile().email, "a@b.com");
}

#[tokio::test]
async fn test_post_repeated_email_field_uses_first_value() {
    let srv = server();

    let reply = call(&srv.router, post("/", "email=a%40b.com&email=c%40d.com", None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(srv.inbox.last().await.email, "a@b.com");
}

// =========================================================================
// Link click
// =========================================================================

#[tokio::test]
async fn test_click_link_sets_cookie_and_redirects_to_target() {
    let srv = server();
    let secret = request_link(&srv, "a@b.com").await;

    let reply = call(&srv.router, get(&format!("/?login={secret}&to=%2Fdashboard"), None)).await;

    assert_eq!(reply.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(reply.headers.get(LOCATION).unwrap(), "/dashboard");

    let cookie = reply.set_cookie().expect("cookie set");
    assert_eq!(cookie.name(), "MAILSESS");
    assert_eq!(cookie.http_only(), Some(true));
    assert!(cookie.expires_datetime().unwrap() > OffsetDateTime::now_utc());

    let session = srv.sessions.get_by_token(cookie.value()).expect("token valid");
    assert!(session.logged_in());
    assert!(srv.sessions.get_by_secret(&secret).is_none(), "secret burned");
}

#[tokio::test]
async fn test_click_link_without_target_redirects_to_base_url() {
    let srv = server();
    let secret = request_link(&srv, "a@b.com").await;

    let reply = call(&srv.router, get(&format!("/?login={secret}"), None)).await;

    assert_eq!(reply.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(reply.headers.get(LOCATION).unwrap(), "http://127.0.0.1:8080/");
}

#[tokio::test]
async fn test_click_link_with_repeated_params_uses_first_values() {
    let srv = server();
    let secret = request_link(&srv, "a@b.com").await;

    let uri = format!("/?login={secret}&to=%2Fa&to=%2Fb&login=other");
    let reply = call(&srv.router, get(&uri, None)).await;

    assert_eq!(reply.status, StatusCode::TEMPORARY_REDIRECT, "{}", reply.body);
    assert_eq!(reply.headers.get(LOCATION).unwrap(), "/a");
    assert!(reply.set_cookie().is_some());
    assert!(srv.sessions.get_by_secret(&secret).is_none(), "secret burned");
}

#[tokio::test]
async fn test_click_link_twice_falls_through_to_login_form() {
    let srv = server();
    let secret = request_link(&srv, "a@b.com").await;
    call(&srv.router, get(&format!("/?login={secret}"), None)).await;

    let reply = call(&srv.router, get(&format!("/?login={secret}"), None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("name=\"email\""));
    assert!(reply.set_cookie().is_none());
}

#[tokio::test]
async fn test_click_expired_link_returns_bad_request() {
    let srv = server_with(ServerConfig::default(), Duration::ZERO);
    let secret = request_link(&srv, "a@b.com").await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let reply = call(&srv.router, get(&format!("/?login={secret}"), None)).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("Link already expired"));
    assert!(reply.set_cookie().is_none());
}

#[tokio::test]
async fn test_post_with_login_param_does_not_consume_secret() {
    let srv = server();
    let secret = request_link(&srv, "a@b.com").await;

    call(&srv.router, post(&format!("/?login={secret}"), "", None)).await;

    assert!(srv.sessions.get_by_secret(&secret).is_some());
}

#[tokio::test]
async fn test_concurrent_clicks_log_in_once() {
    let srv = server();
    let secret = request_link(&srv, "a@b.com").await;

    let clicks: Vec<_> = (0..16)
        .map(|_| {
            let router = srv.router.clone();
            let uri = format!("/?login={secret}");
            tokio::spawn(async move { call(&router, get(&uri, None)).await })
        })
        .collect();

    let mut redirects = 0;
    for click in clicks {
        if click.await.unwrap().status == StatusCode::TEMPORARY_REDIRECT {
            redirects += 1;
        }
    }
    assert_eq!(redirects, 1);
}

// =========================================================================
// Authenticated requests
// =========================================================================

#[tokio::test]
async fn test_get_with_cookie_returns_landing_page_and_email_header() {
    let srv = server();
    let cookie = log_in(&srv, "a@b.com").await;

    let reply = call(&srv.router, get("/", Some(&cookie))).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers.get("x-auth-email").unwrap(), "a@b.com");
    assert!(reply.body.contains("name=\"logout\""));
}

#[tokio::test]
async fn test_logout_deletes_session_and_expires_cookie() {
    let srv = server();
    let cookie = log_in(&srv, "a@b.com").await;

    let reply = call(&srv.router, post("/", "logout=1", Some(&cookie))).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("successfully logged out"));
    let cleared = reply.set_cookie().expect("cookie cleared");
    assert_eq!(cleared.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
    assert!(srv.sessions.is_empty());

    let after = call(&srv.router, get("/", Some(&cookie))).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_without_logout_field_keeps_session() {
    let srv = server();
    let cookie = log_in(&srv, "a@b.com").await;

    let reply = call(&srv.router, post("/", "other=1", Some(&cookie))).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(srv.sessions.len(), 1);
}

#[tokio::test]
async fn test_unknown_cookie_returns_unauthorized_and_clears_it() {
    let srv = server();

    let reply = call(&srv.router, get("/", Some("MAILSESS=forged"))).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.contains("Token not found"));
    let cleared = reply.set_cookie().expect("cookie cleared");
    assert_eq!(cleared.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
}

#[tokio::test]
async fn test_pending_session_token_is_not_accepted() {
    let srv = server();
    let secret = request_link(&srv, "a@b.com").await;
    let pending = srv.sessions.get_by_secret(&secret).unwrap();

    let reply = call(
        &srv.router,
        get("/", Some(&format!("MAILSESS={}", pending.token()))),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_returns_forbidden_and_clears_cookie() {
    let srv = server_with(ServerConfig::default(), Duration::ZERO);
    let session = srv.sessions.create(Profile::new("a@b.com")).unwrap();
    srv.sessions.login(&session).unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let reply = call(
        &srv.router,
        get("/", Some(&format!("MAILSESS={}", session.token()))),
    )
    .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.body.contains("Session expired"));
    let cleared = reply.set_cookie().expect("cookie cleared");
    assert_eq!(cleared.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
}

// =========================================================================
// Configuration
// =========================================================================

#[tokio::test]
async fn test_secure_cookie_and_custom_name() {
    let srv = server_with(
        ServerConfig {
            cookie_name: "SESS".into(),
            secure_cookie: true,
            ..ServerConfig::default()
        },
        Duration::from_secs(3600),
    );
    let secret = request_link(&srv, "a@b.com").await;

    let reply = call(&srv.router, get(&format!("/?login={secret}"), None)).await;
    let cookie = reply.set_cookie().expect("cookie set");

    assert_eq!(cookie.name(), "SESS");
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::None));

    // The default name is no longer recognised.
    let other = call(
        &srv.router,
        get("/", Some(&format!("MAILSESS={}", cookie.value()))),
    )
    .await;
    assert_eq!(other.status, StatusCode::OK);
    assert!(other.body.contains("name=\"email\""));
}

// =========================================================================
// Delivery failures
// =========================================================================

fn smtp_server() -> TestServer {
    let mailer = SmtpMailer::new(MailConfig {
        host: "127.0.0.1".into(),
        // Nothing listens on port 1, so every send fails fast.
        port: 1,
        ..MailConfig::default()
    })
    .expect("mailer should build");
    let server = MaillinkServerBuilder::new()
        .build(mailer)
        .expect("server should build");
    TestServer {
        router: server.router(),
        sessions: Arc::clone(server.sessions()),
        inbox: Inbox::default(),
    }
}

#[tokio::test]
async fn test_unreachable_relay_returns_server_error_and_drops_session() {
    let srv = smtp_server();

    let reply = call(&srv.router, post("/", "email=a%40b.com", None)).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(srv.sessions.is_empty());
}

#[tokio::test]
async fn test_invalid_address_returns_bad_request_without_session() {
    let srv = smtp_server();

    let reply = call(&srv.router, post("/", "email=not+an+address", None)).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("invalid email address"));
    assert!(srv.sessions.is_empty());
}

// =========================================================================
// Serving over TCP
// =========================================================================

#[tokio::test]
async fn test_serve_on_bound_listener_answers_requests() {
    let inbox = Inbox::default();
    let server = MaillinkServerBuilder::new()
        .build(inbox)
        .expect("server should build");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.serve(listener));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("name=\"email\""));
    handle.abort();
}
