//! `maillink`: the magic-link authentication server binary.
//!
//! Usage:
//!   maillink [--addr <addr>] [--base <url>] [--smtp-host <host>] ...
//!
//! Every flag can also be set through its `MAILLINK_*` environment
//! variable. `--log-only` writes login links to the log instead of
//! sending email.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use maillink::prelude::*;
use tracing::info;

/// Passwordless magic-link authentication server.
#[derive(Parser, Debug)]
#[command(name = "maillink", about = "Passwordless magic-link authentication server")]
struct Cli {
    /// Address the HTTP server listens on.
    #[arg(long, env = "MAILLINK_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Session cookie name.
    #[arg(long, env = "MAILLINK_COOKIE", default_value = "MAILSESS")]
    cookie: String,

    /// App name used on the login page and in emails.
    #[arg(long, env = "MAILLINK_APP", default_value = "E-mail proxy auth")]
    app: String,

    /// Base URL for links and default redirects.
    #[arg(long, env = "MAILLINK_BASE", default_value = "http://127.0.0.1:8080/")]
    base: String,

    /// Days a session stays valid after its link is requested.
    #[arg(long, env = "MAILLINK_EXPIRATION_DAYS", default_value_t = 31)]
    expiration_days: u64,

    /// Mark the cookie `Secure` with `SameSite=None` (HTTPS deployments).
    #[arg(long, env = "MAILLINK_SECURE_COOKIE")]
    secure_cookie: bool,

    /// Drop long-expired sessions every this many seconds.
    #[arg(long, env = "MAILLINK_SWEEP_SECS")]
    sweep_secs: Option<u64>,

    /// Page layout template (placeholders: app_name, app_url, title, {content}).
    #[arg(long, env = "MAILLINK_PAGE_TEMPLATE")]
    page_template: Option<PathBuf>,

    /// Login email template (placeholders: app_name, email, link).
    #[arg(long, env = "MAILLINK_EMAIL_TEMPLATE")]
    email_template: Option<PathBuf>,

    /// Sender address of login emails.
    #[arg(long, env = "MAILLINK_FROM", default_value = "admin@localhost")]
    from: String,

    /// SMTP relay host.
    #[arg(long, env = "MAILLINK_SMTP_HOST", default_value = "127.0.0.1")]
    smtp_host: String,

    /// SMTP relay port.
    #[arg(long, env = "MAILLINK_SMTP_PORT", default_value_t = 25)]
    smtp_port: u16,

    /// SMTP username; authentication is skipped when empty.
    #[arg(long, env = "MAILLINK_SMTP_USERNAME", default_value = "")]
    smtp_username: String,

    /// SMTP password.
    #[arg(
        long,
        env = "MAILLINK_SMTP_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    smtp_password: String,

    /// Log login links instead of sending them (development only).
    #[arg(long, env = "MAILLINK_LOG_ONLY")]
    log_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), MaillinkError> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let pages = Pages::new(PageConfig {
        app_name: cli.app.clone(),
        app_url: cli.base.clone(),
        layout_path: cli.page_template.clone(),
    })?;

    let builder = MaillinkServerBuilder::new()
        .config(ServerConfig {
            listen: cli.addr.clone(),
            cookie_name: cli.cookie.clone(),
            base_url: cli.base.clone(),
            secure_cookie: cli.secure_cookie,
            sweep_interval: cli.sweep_secs.map(Duration::from_secs),
        })
        .session_config(SessionConfig {
            expiration: Duration::from_secs(cli.expiration_days.saturating_mul(24 * 60 * 60)),
            ..SessionConfig::default()
        })
        .pages(pages);

    if cli.log_only {
        info!("--log-only: login links are written to the log, not emailed");
        let email = LoginEmail::new(&cli.app, &cli.base, cli.email_template.as_deref())?;
        builder.build(LogMailer::new(email))?.run().await
    } else {
        let mailer = SmtpMailer::new(MailConfig {
            app_name: cli.app,
            app_url: cli.base,
            template_path: cli.email_template,
            from_address: cli.from,
            host: cli.smtp_host,
            port: cli.smtp_port,
            username: cli.smtp_username,
            password: cli.smtp_password,
        })?;
        builder.build(mailer)?.run().await
    }
}
