//! Background task that keeps the store from growing without bound.
//!
//! Expiry itself is lazy (every lookup compares against the deadline), so
//! this task only frees memory. It is time-triggered and never runs as a
//! side effect of a request.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::SessionManager;

/// Spawns a task that calls
/// [`SessionManager::cleanup_expired`] every `period`.
///
/// The task runs until the returned handle is aborted or the runtime
/// shuts down. Must be called from within a Tokio runtime. A zero
/// `period` is raised to one second.
pub fn spawn_sweeper(
    sessions: Arc<SessionManager>,
    period: Duration,
) -> JoinHandle<()> {
    let period = if period.is_zero() {
        Duration::from_secs(1)
    } else {
        period
    };
    tracing::debug!(?period, "session sweeper started");

    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; skip it so a fresh store
        // is not swept at startup.
        interval.tick().await;

        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired();
            tracing::trace!(removed, remaining = sessions.len(), "sweep done");
        }
    })
}
