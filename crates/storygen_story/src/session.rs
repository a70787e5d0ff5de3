//! In-memory agent sessions.

use std::collections::HashMap;

use storygen_error::{StoryError, StoryErrorKind};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// String key/value state shared by the agents of a session.
///
/// Writes replace earlier values for the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    values: HashMap<String, String>,
}

impl SessionState {
    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Whether `key` holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys currently set, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// A conversation between one user and one agent.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct Session {
    /// Session identifier
    id: String,
    /// Application the session belongs to
    app_name: String,
    /// Owning user
    user_id: String,
    /// Shared state
    state: SessionState,
}

impl Session {
    /// Mutable access to the session state.
    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }
}

type SessionKey = (String, String, String);

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(app_name: &str, user_id: &str, session_id: &str) -> SessionKey {
        (
            app_name.to_string(),
            user_id.to_string(),
            session_id.to_string(),
        )
    }

    /// Create a session with empty state.
    pub async fn create_session(&self, app_name: &str, user_id: &str) -> Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            state: SessionState::default(),
        };

        self.sessions.write().await.insert(
            Self::key(app_name, user_id, &session.id),
            session.clone(),
        );
        debug!(app_name, user_id, session_id = %session.id, "Session created");
        session
    }

    /// Snapshot of a session.
    pub async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Session, StoryError> {
        self.sessions
            .read()
            .await
            .get(&Self::key(app_name, user_id, session_id))
            .cloned()
            .ok_or_else(|| Self::not_found(user_id, session_id))
    }

    /// Replace a session's state.
    pub async fn update_state(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        state: SessionState,
    ) -> Result<(), StoryError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&Self::key(app_name, user_id, session_id))
            .ok_or_else(|| Self::not_found(user_id, session_id))?;
        session.state = state;
        Ok(())
    }

    /// Drop a session, returning it if it existed.
    pub async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Option<Session> {
        self.sessions
            .write()
            .await
            .remove(&Self::key(app_name, user_id, session_id))
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// True when no sessions exist.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn not_found(user_id: &str, session_id: &str) -> StoryError {
        StoryError::new(StoryErrorKind::SessionNotFound {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        })
    }
}
