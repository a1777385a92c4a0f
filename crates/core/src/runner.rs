//! Agent Runner
//!
//! Binds an application name, a session store and an agent runtime together so
//! that every run is tied to a live session record.

use crate::{
    agent::{AgentEventStream, AgentRuntime, Content},
    session::{SessionError, SessionStore},
};
use anyhow::Result;
use std::sync::Arc;

pub struct Runner {
    app_name: String,
    sessions: Arc<dyn SessionStore>,
    agent: Arc<dyn AgentRuntime>,
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        sessions: Arc<dyn SessionStore>,
        agent: Arc<dyn AgentRuntime>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            sessions,
            agent,
        }
    }

    /// Starts an agent run for `message` inside an existing session.
    ///
    /// Fails with `SessionError::NotFound` if the session was never created or
    /// has already been deleted.
    pub async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        message: Content,
    ) -> Result<AgentEventStream> {
        if self
            .sessions
            .get_session(&self.app_name, user_id, session_id)
            .await?
            .is_none()
        {
            return Err(SessionError::NotFound {
                app_name: self.app_name.clone(),
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
            }
            .into());
        }
        self.agent.run(user_id, session_id, message).await
    }
}
