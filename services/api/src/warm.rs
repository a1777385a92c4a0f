//! Warm Session Pool
//!
//! Creating an agent session costs a round trip, so one session is created
//! ahead of time and parked in a single-slot holder. Each request takes it
//! (or creates one inline when the slot is empty), and after the response the
//! consumed session is deleted and a background task refills the slot.
//!
//! The slot and the rewarm task handle are the only shared mutable state. The
//! slot is guarded by an async mutex so that the fallback creation in
//! [`SessionWarmer::acquire`] runs under the same lock as every take and set.

use anyhow::{Context, Result};
use flight_core::session::{Session, SessionStore};
use std::sync::{
    Arc, PoisonError,
    atomic::{AtomicBool, Ordering},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{Instrument, debug, error, info, info_span, warn};

/// The result of a best-effort session deletion. Logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    Failed(String),
}

/// The result of one [`SessionWarmer::create_and_warm`] attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmOutcome {
    /// The new session now sits in the slot.
    Installed,
    /// The slot was already occupied; the new session was deleted.
    Surplus(CleanupOutcome),
    /// The store failed to create a session; the slot is unchanged.
    CreateFailed,
}

pub struct SessionWarmer {
    sessions: Arc<dyn SessionStore>,
    app_name: String,
    user_id: String,
    slot: Mutex<Option<Session>>,
    rewarm_task: std::sync::Mutex<Option<JoinHandle<WarmOutcome>>>,
    closed: AtomicBool,
}

impl SessionWarmer {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        app_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            app_name: app_name.into(),
            user_id: user_id.into(),
            slot: Mutex::new(None),
            rewarm_task: std::sync::Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Atomically reads and clears the slot.
    pub async fn take(&self) -> Option<Session> {
        self.slot.lock().await.take()
    }

    /// Installs `session` only if the slot is empty.
    ///
    /// On failure the session is handed back so the caller can dispose of it.
    pub async fn set_if_empty(&self, session: Session) -> Result<(), Session> {
        let mut slot = self.slot.lock().await;
        if slot.is_some() {
            return Err(session);
        }
        *slot = Some(session);
        Ok(())
    }

    /// Whether a warm session is currently parked.
    pub async fn is_warm(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Creates a new session and parks it, deleting it again if the slot was
    /// filled in the meantime.
    pub async fn create_and_warm(&self) -> WarmOutcome {
        info!("Creating a new session (warm).");
        let session = match self
            .sessions
            .create_session(&self.app_name, &self.user_id)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                error!(error = ?e, "Failed to create warm session");
                return WarmOutcome::CreateFailed;
            }
        };

        match self.set_if_empty(session).await {
            Ok(()) => {
                info!("Warm session created and set for reuse.");
                WarmOutcome::Installed
            }
            Err(surplus) => {
                let outcome = self.discard(&surplus, "surplus warm session").await;
                WarmOutcome::Surplus(outcome)
            }
        }
    }

    /// Hands a session to a request: the warm one if present, otherwise a
    /// freshly created one.
    ///
    /// The slot lock is held across the fallback creation. A creation failure
    /// is returned to the caller.
    pub async fn acquire(&self) -> Result<Session> {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.take() {
            debug!(session_id = %session.id, "Consumed warm session");
            return Ok(session);
        }

        info!("No warm session; creating synchronously for this request.");
        self.sessions
            .create_session(&self.app_name, &self.user_id)
            .await
            .context("Failed to create a session for the request")
    }

    /// Deletes `session`, logging instead of raising on failure.
    pub async fn discard(&self, session: &Session, reason: &str) -> CleanupOutcome {
        match self
            .sessions
            .delete_session(&session.app_name, &session.user_id, &session.id)
            .await
        {
            Ok(()) => {
                info!(session_id = %session.id, %reason, "Session deleted.");
                CleanupOutcome::Deleted
            }
            Err(e) => {
                warn!(session_id = %session.id, %reason, error = %e, "Failed to delete session");
                CleanupOutcome::Failed(e.to_string())
            }
        }
    }

    /// Whether a background rewarm is still pending.
    pub fn is_rewarming(&self) -> bool {
        self.rewarm_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Launches a background rewarm unless one is already pending or the pool
    /// has been shut down.
    ///
    /// Returns whether a new task was launched.
    pub fn schedule_rewarm(self: &Arc<Self>) -> bool {
        let mut task = self
            .rewarm_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::SeqCst) {
            debug!("Pool is shut down; not rewarming.");
            return false;
        }
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("Rewarm already pending; not launching another.");
            return false;
        }

        let warmer = Arc::clone(self);
        *task = Some(tokio::spawn(
            async move { warmer.create_and_warm().await }.instrument(info_span!("session_rewarm")),
        ));
        info!("Launched background warm-session task.");
        true
    }

    /// Post-response cleanup: delete the consumed session, then refill the slot.
    pub async fn retire(self: &Arc<Self>, session: Session) {
        self.discard(&session, "consumed").await;
        self.schedule_rewarm();
    }

    /// Stops further rewarms, waits for a pending one, then deletes the parked
    /// session.
    ///
    /// Cleanup tasks still running afterwards delete their session but no
    /// longer refill the slot.
    pub async fn shutdown(&self) {
        // Set before taking the handle: `schedule_rewarm` reads it under the same lock.
        self.closed.store(true, Ordering::SeqCst);
        let pending = self
            .rewarm_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = pending {
            if let Err(e) = task.await {
                warn!(error = %e, "Rewarm task did not complete cleanly");
            }
        }

        if let Some(session) = self.take().await {
            self.discard(&session, "shutdown").await;
        }
        info!("Warm session pool drained.");
    }
}
