//! Bounded per-session conversation history.
//!
//! Sessions are in-memory only and live for the process lifetime. The store
//! sits behind a trait so a durable backend can be substituted without
//! touching the query engine.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use uuid::Uuid;

/// One completed question/answer pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// What the user asked.
    pub user: String,
    /// What the assistant answered.
    pub assistant: String,
}

/// Trait for session history storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session and return its id.
    async fn create_session(&self) -> Result<String>;

    /// History for a session, oldest first. Unknown ids yield an empty
    /// history (sessions are created lazily on first record).
    async fn history(&self, session_id: &str) -> Result<Vec<Exchange>>;

    /// Append an exchange, evicting the oldest if over the bound.
    async fn record_exchange(&self, session_id: &str, exchange: Exchange) -> Result<()>;
}

/// In-memory session store bounded per session in exchange pairs.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, VecDeque<Exchange>>>,
    max_exchanges: usize,
}

impl MemorySessionStore {
    /// Create a store keeping at most `max_exchanges` pairs per session.
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_exchanges,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(id.clone(), VecDeque::new());
        Ok(id)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Exchange>> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions
            .get(session_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn record_exchange(&self, session_id: &str, exchange: Exchange) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        let history = sessions.entry(session_id.to_string()).or_default();

        history.push_back(exchange);
        while history.len() > self.max_exchanges {
            history.pop_front();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(n: usize) -> Exchange {
        Exchange {
            user: format!("question {}", n),
            assistant: format!("answer {}", n),
        }
    }

    #[tokio::test]
    async fn test_create_and_record() {
        let store = MemorySessionStore::new(2);
        let id = store.create_session().await.unwrap();

        assert!(store.history(&id).await.unwrap().is_empty());

        store.record_exchange(&id, exchange(1)).await.unwrap();
        let history = store.history(&id).await.unwrap();
        assert_eq!(history, vec![exchange(1)]);
    }

    #[tokio::test]
    async fn test_bound_evicts_oldest_first() {
        let store = MemorySessionStore::new(2);
        let id = store.create_session().await.unwrap();

        for n in 1..=3 {
            store.record_exchange(&id, exchange(n)).await.unwrap();
        }

        let history = store.history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history, vec![exchange(2), exchange(3)]);
    }

    #[tokio::test]
    async fn test_unknown_session_has_empty_history() {
        let store = MemorySessionStore::new(2);
        assert!(store.history("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_caller_supplied_id_created_lazily() {
        let store = MemorySessionStore::new(2);
        store
            .record_exchange("external-id", exchange(1))
            .await
            .unwrap();
        assert_eq!(store.history("external-id").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = MemorySessionStore::new(2);
        let a = store.create_session().await.unwrap();
        let b = store.create_session().await.unwrap();

        store.record_exchange(&a, exchange(1)).await.unwrap();
        assert!(store.history(&b).await.unwrap().is_empty());
    }
}
