//! Bounded tool-calling loop.
//!
//! One query is a sequence of model rounds: each round the model either
//! answers or requests tool invocations. The loop caps tool rounds so a
//! model that keeps asking for tools cannot spin forever; at the cap it is
//! asked once more with tools withheld, and a fixed fallback answer covers
//! the case where it still refuses to answer.

use super::tools::{parse_tool_call, SourceRef, ToolContext};
use super::{ChatMessage, ChatModel, ModelReply, ModelRequest, ToolInvocation};
use crate::error::Result;
use crate::session::Exchange;
use std::sync::Arc;
use tracing::{debug, info, warn};

const FALLBACK_ANSWER: &str =
    "I wasn't able to finish searching the course materials for this question. \
     Please try rephrasing it.";

/// Drives one query through the model/tool dialogue.
pub struct QueryRunner {
    model: Arc<dyn ChatModel>,
    tools: ToolContext,
    system_prompt: String,
    max_tool_rounds: usize,
}

/// Outcome of a completed query run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Final answer text.
    pub answer: String,
    /// Sources used across all tool rounds, deduplicated in first-seen order.
    pub sources: Vec<SourceRef>,
    /// Number of model rounds used.
    pub rounds: usize,
}

impl QueryRunner {
    /// Create a runner with the given round cap.
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolContext,
        system_prompt: String,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            model,
            tools,
            system_prompt,
            max_tool_rounds,
        }
    }

    /// Answer a question given prior session history.
    pub async fn run(&self, question: &str, history: &[Exchange]) -> Result<RunOutcome> {
        let mut messages: Vec<ChatMessage> = Vec::new();
        for exchange in history {
            messages.push(ChatMessage::User(exchange.user.clone()));
            messages.push(ChatMessage::Assistant(exchange.assistant.clone()));
        }
        messages.push(ChatMessage::User(question.to_string()));

        let mut sources: Vec<SourceRef> = Vec::new();
        let mut tool_rounds = 0;
        let mut rounds = 0;

        loop {
            let tools_enabled = tool_rounds < self.max_tool_rounds;
            let request = ModelRequest {
                system: self.system_prompt.clone(),
                messages: messages.clone(),
                tools_enabled,
            };

            let reply = self.model.generate(&request).await?;
            rounds += 1;
            debug!(round = rounds, "Model round completed");

            match reply {
                ModelReply::Answer(answer) => {
                    return Ok(RunOutcome {
                        answer,
                        sources,
                        rounds,
                    });
                }
                ModelReply::ToolCalls(invocations) => {
                    if !tools_enabled {
                        // Tools were withheld and the model still asked for
                        // them. Terminate with the fallback answer.
                        warn!(
                            "Model requested tools past the round cap ({}), degrading",
                            self.max_tool_rounds
                        );
                        return Ok(RunOutcome {
                            answer: FALLBACK_ANSWER.to_string(),
                            sources,
                            rounds,
                        });
                    }

                    tool_rounds += 1;
                    messages.push(ChatMessage::ToolUse(invocations.clone()));

                    for invocation in invocations {
                        let result = self.execute_invocation(&invocation, &mut sources).await;
                        messages.push(ChatMessage::ToolResult {
                            id: invocation.id,
                            content: result,
                        });
                    }
                }
            }
        }
    }

    /// Execute one invocation, folding errors into the tool result text so a
    /// bad call degrades the dialogue instead of aborting it.
    async fn execute_invocation(
        &self,
        invocation: &ToolInvocation,
        sources: &mut Vec<SourceRef>,
    ) -> String {
        info!(
            "Executing tool {} with args {}",
            invocation.name, invocation.arguments
        );

        match parse_tool_call(&invocation.name, &invocation.arguments) {
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => {
                    for source in output.sources {
                        if !sources.iter().any(|s| s.label == source.label) {
                            sources.push(source);
                        }
                    }
                    output.text
                }
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool call: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedModel;
    use crate::document::{Course, CourseChunk};
    use crate::embedding::testing::HashEmbedder;
    use crate::index::CourseIndex;
    use crate::vector_store::MemoryVectorStore;

    fn search_invocation(id: &str) -> ToolInvocation {
        ToolInvocation {
            id: id.to_string(),
            name: "search_course_content".to_string(),
            arguments: r#"{"query": "gradient descent"}"#.to_string(),
        }
    }

    async fn tool_context() -> ToolContext {
        let index = Arc::new(CourseIndex::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(HashEmbedder),
        ));
        let course = Course::new("Introduction to Machine Learning".to_string(), None, None);
        index.upsert_course_metadata(&course).await.unwrap();
        index
            .add_chunks(vec![CourseChunk {
                text: "Gradient descent minimizes the loss.".to_string(),
                course_title: course.title.clone(),
                lesson_number: Some(1),
                chunk_index: 0,
            }])
            .await
            .unwrap();
        ToolContext::new(index, 5)
    }

    fn runner(model: ScriptedModel, tools: ToolContext, max_rounds: usize) -> QueryRunner {
        QueryRunner::new(Arc::new(model), tools, "system".to_string(), max_rounds)
    }

    #[tokio::test]
    async fn test_direct_answer_no_tools() {
        let model = ScriptedModel::new(vec![ModelReply::Answer("hello".to_string())]);
        let runner = runner(model, tool_context().await, 2);

        let outcome = runner.run("hi", &[]).await.unwrap();
        assert_eq!(outcome.answer, "hello");
        assert!(outcome.sources.is_empty());
        assert_eq!(outcome.rounds, 1);
    }

    #[tokio::test]
    async fn test_tool_round_then_answer_with_sources() {
        let model = ScriptedModel::new(vec![
            ModelReply::ToolCalls(vec![search_invocation("call-1")]),
            ModelReply::Answer("it minimizes the loss".to_string()),
        ]);
        let runner = runner(model, tool_context().await, 2);

        let outcome = runner.run("what is gradient descent?", &[]).await.unwrap();
        assert_eq!(outcome.answer, "it minimizes the loss");
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(
            outcome.sources[0].label,
            "Introduction to Machine Learning - Lesson 1"
        );
    }

    #[tokio::test]
    async fn test_loop_terminates_at_round_cap() {
        // A model that always asks for tools must terminate with the
        // fallback answer, never loop.
        let model = ScriptedModel::new(vec![ModelReply::ToolCalls(vec![search_invocation(
            "call-x",
        )])]);
        let runner = runner(model, tool_context().await, 2);

        let outcome = runner.run("loop forever", &[]).await.unwrap();
        assert_eq!(outcome.answer, FALLBACK_ANSWER);
        // Two tool rounds plus the final tools-disabled round.
        assert_eq!(outcome.rounds, 3);
    }

    #[tokio::test]
    async fn test_duplicate_sources_deduplicated() {
        let model = ScriptedModel::new(vec![
            ModelReply::ToolCalls(vec![search_invocation("call-1")]),
            ModelReply::ToolCalls(vec![search_invocation("call-2")]),
            ModelReply::Answer("done".to_string()),
        ]);
        let runner = runner(model, tool_context().await, 2);

        let outcome = runner.run("q", &[]).await.unwrap();
        assert_eq!(outcome.answer, "done");
        assert_eq!(outcome.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_tool_call_degrades_to_tool_error_text() {
        let model = ScriptedModel::new(vec![
            ModelReply::ToolCalls(vec![ToolInvocation {
                id: "call-1".to_string(),
                name: "no_such_tool".to_string(),
                arguments: "{}".to_string(),
            }]),
            ModelReply::Answer("recovered".to_string()),
        ]);
        let runner = runner(model, tool_context().await, 2);

        let outcome = runner.run("q", &[]).await.unwrap();
        assert_eq!(outcome.answer, "recovered");
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = ScriptedModel::new(vec![]);
        let runner = runner(model, tool_context().await, 2);
        assert!(runner.run("q", &[]).await.is_err());
    }
}
