//! Session Store
//!
//! Sessions are the unit of isolation handed to the agent runtime. This module
//! defines the `Session` record, the `SessionStore` contract used by the rest
//! of the system, and the in-process store used in production.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Errors reported by a `SessionStore`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: app={app_name} user={user_id} id={session_id}")]
    NotFound {
        app_name: String,
        user_id: String,
        session_id: String,
    },
}

/// An opaque handle to an agent session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Defines the contract for any backend that can hold session records.
///
/// Records are keyed by `(app_name, user_id, session_id)`. Implementations own
/// their consistency guarantees; callers never retry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates and persists a brand-new session.
    async fn create_session(&self, app_name: &str, user_id: &str) -> Result<Session>;

    /// Looks up a session, returning `None` when it does not exist.
    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>>;

    /// Deletes a session. Deleting an unknown session is an error.
    async fn delete_session(&self, app_name: &str, user_id: &str, session_id: &str)
    -> Result<()>;
}

type SessionKey = (String, String, String);

/// A process-local `SessionStore` backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionKey, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions across all apps and users.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn key(app_name: &str, user_id: &str, session_id: &str) -> SessionKey {
    (
        app_name.to_string(),
        user_id.to_string(),
        session_id.to_string(),
    )
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, app_name: &str, user_id: &str) -> Result<Session> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        self.sessions
            .lock()
            .await
            .insert(key(app_name, user_id, &session.id), session.clone());
        Ok(session)
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(&key(app_name, user_id, session_id)).cloned())
    }

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<()> {
        self.sessions
            .lock()
            .await
            .remove(&key(app_name, user_id, session_id))
            .map(|_| ())
            .ok_or_else(|| {
                SessionError::NotFound {
                    app_name: app_name.to_string(),
                    user_id: user_id.to_string(),
                    session_id: session_id.to_string(),
                }
                .into()
            })
    }
}
