//! `MaillinkServer` builder and serve loop.
//!
//! This is the entry point for running maillink. It ties together the
//! layers: HTTP front → session store → mailer and pages.

use std::sync::Arc;

use axum::Router;
use maillink_mail::Mailer;
use maillink_page::{PageConfig, Pages};
use maillink_session::{SessionConfig, SessionManager, spawn_sweeper};
use tokio::net::TcpListener;

use crate::handler::handle;
use crate::{MaillinkError, ServerConfig};

/// Shared state passed to every request handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The session
/// manager does its own locking, so nothing here needs an outer mutex.
pub(crate) struct AppState<M: Mailer> {
    pub(crate) sessions: Arc<SessionManager>,
    pub(crate) mailer: M,
    pub(crate) pages: Pages,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a maillink server.
///
/// # Example
///
/// ```rust,ignore
/// let server = MaillinkServerBuilder::new()
///     .config(ServerConfig { listen: "127.0.0.1:9000".into(), ..Default::default() })
///     .build(mailer)?;
/// server.run().await
/// ```
pub struct MaillinkServerBuilder {
    config: ServerConfig,
    session_config: SessionConfig,
    sessions: Option<Arc<SessionManager>>,
    pages: Option<Pages>,
}

impl MaillinkServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            session_config: SessionConfig::default(),
            sessions: None,
            pages: None,
        }
    }

    /// Sets the HTTP front configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session configuration. Ignored if a store is supplied
    /// with [`sessions`](Self::sessions).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Uses an existing session store instead of creating one.
    pub fn sessions(mut self, sessions: Arc<SessionManager>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Sets the page renderer. Defaults to the built-in layout.
    pub fn pages(mut self, pages: Pages) -> Self {
        self.pages = Some(pages);
        self
    }

    /// Builds the server around `mailer`. Nothing is bound until
    /// [`MaillinkServer::run`].
    pub fn build<M: Mailer>(self, mailer: M) -> Result<MaillinkServer<M>, MaillinkError> {
        let pages = match self.pages {
            Some(pages) => pages,
            None => Pages::new(PageConfig {
                app_url: self.config.base_url.clone(),
                ..PageConfig::default()
            })?,
        };
        let sessions = self
            .sessions
            .unwrap_or_else(|| Arc::new(SessionManager::new(self.session_config)));

        let state = Arc::new(AppState {
            sessions,
            mailer,
            pages,
            config: self.config,
        });
        Ok(MaillinkServer { state })
    }
}

impl Default for MaillinkServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured maillink server.
///
/// Created with [`MaillinkServerBuilder`]. Call [`run()`](Self::run) to
/// start accepting requests, or take its [`router()`](Self::router) to
/// embed it elsewhere.
pub struct MaillinkServer<M: Mailer> {
    state: Arc<AppState<M>>,
}

impl<M: Mailer> MaillinkServer<M> {
    /// The session store shared by all handlers.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.state.sessions
    }

    /// The axum router serving every path.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(handle::<M>)
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn run(self) -> Result<(), MaillinkError> {
        let listener = TcpListener::bind(&self.state.config.listen).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> Result<(), MaillinkError> {
        let sweeper = self
            .state
            .config
            .sweep_interval
            .map(|period| spawn_sweeper(Arc::clone(&self.state.sessions), period));

        tracing::info!(addr = %listener.local_addr()?, "maillink server running");
        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        tracing::info!("maillink server stopped");
        Ok(result?)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // Without a signal handler, serve until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
