//! RAG query engine: sessions plus the bounded tool loop.
//!
//! This is the boundary a transport (CLI, HTTP) calls: one query in, one
//! answer with sources and a session id out.

use crate::agent::{QueryRunner, SourceRef};
use crate::error::Result;
use crate::session::{Exchange, SessionStore};
use std::sync::Arc;
use tracing::{info, instrument};

/// Response to one query.
#[derive(Debug)]
pub struct QueryResponse {
    /// The generated answer.
    pub answer: String,
    /// Sources used for the answer, deduplicated in first-seen order.
    pub sources: Vec<SourceRef>,
    /// Session the exchange was recorded under.
    pub session_id: String,
}

impl QueryResponse {
    /// Format the response for terminal display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!("\n{}", source.label));
                if let Some(link) = &source.link {
                    output.push_str(&format!("\n  {}", link));
                }
            }
        }

        output
    }
}

/// Query engine for course questions.
pub struct RagEngine {
    runner: QueryRunner,
    sessions: Arc<dyn SessionStore>,
}

impl RagEngine {
    /// Create an engine over a runner and a session store.
    pub fn new(runner: QueryRunner, sessions: Arc<dyn SessionStore>) -> Self {
        Self { runner, sessions }
    }

    /// Answer a query within a session.
    ///
    /// A missing `session_id` creates a new session; its id is returned so
    /// the caller can continue the conversation. The exchange is recorded
    /// only after a successful run, so a failed query leaves the session's
    /// history exactly as it was.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<QueryResponse> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session().await?,
        };

        let history = self.sessions.history(&session_id).await?;
        let outcome = self.runner.run(query, &history).await?;

        info!(
            rounds = outcome.rounds,
            sources = outcome.sources.len(),
            "Query answered"
        );

        self.sessions
            .record_exchange(
                &session_id,
                Exchange {
                    user: query.to_string(),
                    assistant: outcome.answer.clone(),
                },
            )
            .await?;

        Ok(QueryResponse {
            answer: outcome.answer,
            sources: outcome.sources,
            session_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedModel;
    use crate::agent::{ModelReply, ToolContext};
    use crate::embedding::testing::HashEmbedder;
    use crate::index::CourseIndex;
    use crate::session::MemorySessionStore;
    use crate::vector_store::MemoryVectorStore;

    fn engine(replies: Vec<ModelReply>, max_history: usize) -> RagEngine {
        let index = Arc::new(CourseIndex::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(HashEmbedder),
        ));
        let runner = QueryRunner::new(
            Arc::new(ScriptedModel::new(replies)),
            ToolContext::new(index, 5),
            "system".to_string(),
            2,
        );
        RagEngine::new(runner, Arc::new(MemorySessionStore::new(max_history)))
    }

    #[tokio::test]
    async fn test_new_session_created_when_missing() {
        let engine = engine(vec![ModelReply::Answer("hi".to_string())], 2);

        let response = engine.query("hello", None).await.unwrap();
        assert_eq!(response.answer, "hi");
        assert!(!response.session_id.is_empty());
    }

    #[tokio::test]
    async fn test_session_id_is_stable_across_queries() {
        let engine = engine(vec![ModelReply::Answer("hi".to_string())], 2);

        let first = engine.query("one", None).await.unwrap();
        let second = engine
            .query("two", Some(&first.session_id))
            .await
            .unwrap();
        assert_eq!(first.session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_history_bounded_across_queries() {
        let engine = engine(vec![ModelReply::Answer("answer".to_string())], 2);

        let first = engine.query("q1", None).await.unwrap();
        for q in ["q2", "q3"] {
            engine.query(q, Some(&first.session_id)).await.unwrap();
        }

        let history = engine.sessions.history(&first.session_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].user, "q2");
        assert_eq!(history[1].user, "q3");
    }

    #[tokio::test]
    async fn test_failed_query_leaves_history_unmodified() {
        // Empty script: generate always errors.
        let engine = engine(vec![], 2);

        let session_id = engine.sessions.create_session().await.unwrap();
        engine
            .sessions
            .record_exchange(
                &session_id,
                Exchange {
                    user: "before".to_string(),
                    assistant: "ok".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(engine.query("boom", Some(&session_id)).await.is_err());

        let history = engine.sessions.history(&session_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, "before");
    }

    #[tokio::test]
    async fn test_display_format_includes_sources() {
        let response = QueryResponse {
            answer: "The answer.".to_string(),
            sources: vec![SourceRef {
                label: "Course X - Lesson 1".to_string(),
                link: Some("https://example.com/1".to_string()),
            }],
            session_id: "s".to_string(),
        };

        let display = response.format_for_display();
        assert!(display.contains("The answer."));
        assert!(display.contains("--- Sources ---"));
        assert!(display.contains("Course X - Lesson 1"));
        assert!(display.contains("https://example.com/1"));
    }
}
