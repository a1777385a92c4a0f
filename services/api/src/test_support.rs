//! Test doubles shared by the unit tests of this crate.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use flight_core::{
    agent::{AgentEvent, AgentEventStream, AgentRuntime, Content, Part, Progress},
    session::{InMemorySessionStore, Session, SessionStore},
};
use futures::stream;
use std::{
    future::Future,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

/// An in-memory store that counts calls and can be told to fail or stall.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemorySessionStore,
    creates: AtomicUsize,
    deletes: AtomicUsize,
    fail_creates: AtomicBool,
    fail_deletes: AtomicBool,
    create_delay_ms: AtomicU64,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create attempts, successful or not.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Delete attempts, successful or not.
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_create_delay(&self, delay: Duration) {
        self.create_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Sessions currently held by the store.
    pub async fn live(&self) -> usize {
        self.inner.len().await
    }

    pub async fn contains(&self, session: &Session) -> bool {
        self.inner
            .get_session(&session.app_name, &session.user_id, &session.id)
            .await
            .unwrap()
            .is_some()
    }
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn create_session(&self, app_name: &str, user_id: &str) -> Result<Session> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let delay = self.create_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(anyhow!("session store unavailable"));
        }
        self.inner.create_session(app_name, user_id).await
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        self.inner.get_session(app_name, user_id, session_id).await
    }

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(anyhow!("session store unavailable"));
        }
        self.inner.delete_session(app_name, user_id, session_id).await
    }
}

/// What a [`ScriptedAgent`] answers on every run.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Progress events followed by a final response with this text.
    Text(String),
    /// Progress events only; the stream ends without a final response.
    Silent,
    /// A progress event followed by a stream error.
    FailMidStream,
    /// A final response with this text, produced only after the delay.
    Delayed(Duration, String),
}

/// An agent runtime that replays a fixed reply and records the sessions used.
pub struct ScriptedAgent {
    reply: Reply,
    sessions_seen: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            sessions_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn sessions_seen(&self) -> Vec<String> {
        self.sessions_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedAgent {
    async fn run(
        &self,
        _user_id: &str,
        session_id: &str,
        _message: Content,
    ) -> Result<AgentEventStream> {
        self.sessions_seen
            .lock()
            .unwrap()
            .push(session_id.to_string());

        if let Reply::Delayed(delay, text) = &self.reply {
            let (delay, text) = (*delay, text.clone());
            return Ok(Box::pin(stream::once(async move {
                tokio::time::sleep(delay).await;
                Ok::<_, anyhow::Error>(final_answer(text))
            })));
        }

        let searching = Ok(AgentEvent::Progress(Progress::SearchQueries(vec![
            "flight status".to_string(),
        ])));
        let events = match &self.reply {
            Reply::Text(text) => vec![searching, Ok(final_answer(text.clone()))],
            Reply::Silent | Reply::Delayed(..) => vec![searching],
            Reply::FailMidStream => vec![searching, Err(anyhow!("agent stream broke"))],
        };
        Ok(Box::pin(stream::iter(events)))
    }
}

fn final_answer(text: String) -> AgentEvent {
    AgentEvent::Final(Content {
        role: "model".to_string(),
        parts: vec![Part::text(text)],
    })
}

/// Polls `check` until it holds, panicking after about two seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}
