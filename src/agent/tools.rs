//! Tool definitions and implementations exposed to the language model.
//!
//! Two capabilities: semantic content search with fuzzy course and lesson
//! filtering, and course outline retrieval. Each execution returns its
//! display text together with the source references it drew on, so the
//! caller never has to poll tool state afterwards.

use crate::error::{KursError, Result};
use crate::index::CourseIndex;
use std::sync::Arc;
use tracing::warn;

/// Available tools for the query loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Search course content with optional filters.
    SearchCourseContent {
        query: String,
        course_name: Option<String>,
        lesson_number: Option<u32>,
    },

    /// Get a course outline: metadata plus the full lesson list.
    GetCourseOutline { course_name: String },
}

/// A source reference for answer attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRef {
    /// Display label, e.g. "Course Title - Lesson 2".
    pub label: String,
    /// Lesson or course link, when the catalog has one.
    pub link: Option<String>,
}

/// Result of one tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Text handed back to the model as the tool result.
    pub text: String,
    /// Sources used, deduplicated in first-seen order.
    pub sources: Vec<SourceRef>,
}

impl ToolOutput {
    fn text_only(text: String) -> Self {
        Self {
            text,
            sources: Vec::new(),
        }
    }
}

/// Tool execution context with access to the course index.
pub struct ToolContext {
    index: Arc<CourseIndex>,
    max_results: usize,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(index: Arc<CourseIndex>, max_results: usize) -> Self {
        Self { index, max_results }
    }

    /// Execute a tool call.
    pub async fn execute(&self, tool: &ToolCall) -> Result<ToolOutput> {
        match tool {
            ToolCall::SearchCourseContent {
                query,
                course_name,
                lesson_number,
            } => {
                self.execute_search(query, course_name.as_deref(), *lesson_number)
                    .await
            }
            ToolCall::GetCourseOutline { course_name } => {
                self.execute_outline(course_name).await
            }
        }
    }

    async fn execute_search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<ToolOutput> {
        let results = match self
            .index
            .search(query, course_name, lesson_number, self.max_results)
            .await
        {
            Ok(results) => results,
            // Unresolvable course filter is a normal tool outcome, not a
            // dialogue failure.
            Err(KursError::CourseNotFound(name)) => {
                return Ok(ToolOutput::text_only(format!(
                    "No course found matching '{}'.",
                    name
                )));
            }
            Err(e) => return Err(e),
        };

        if results.is_empty() {
            let mut message = "No relevant content found".to_string();
            if let Some(name) = course_name {
                message.push_str(&format!(" in course '{}'", name));
            }
            if let Some(number) = lesson_number {
                message.push_str(&format!(" in lesson {}", number));
            }
            message.push('.');
            return Ok(ToolOutput::text_only(message));
        }

        let mut lines = Vec::new();
        let mut sources: Vec<SourceRef> = Vec::new();

        for result in &results {
            let record = &result.record;

            let header = match record.lesson_number {
                Some(number) => format!("{} - Lesson {}", record.course_title, number),
                None => record.course_title.clone(),
            };
            lines.push(format!("[{}] {}", header, record.content));

            // Dedup by (course, lesson) label, first seen wins
            if !sources.iter().any(|s| s.label == header) {
                let link = match record.lesson_number {
                    Some(number) => self
                        .index
                        .lesson_link(&record.course_title, number)
                        .await
                        .unwrap_or_else(|e| {
                            warn!("Failed to look up lesson link: {}", e);
                            None
                        }),
                    None => None,
                };
                sources.push(SourceRef {
                    label: header,
                    link,
                });
            }
        }

        Ok(ToolOutput {
            text: lines.join("\n\n"),
            sources,
        })
    }

    async fn execute_outline(&self, course_name: &str) -> Result<ToolOutput> {
        let title = match self.index.resolve_course_name(course_name).await {
            Ok(title) => title,
            Err(KursError::CourseNotFound(name)) => {
                return Ok(ToolOutput::text_only(format!(
                    "No course found matching '{}'.",
                    name
                )));
            }
            Err(e) => return Err(e),
        };

        let course = match self.index.get_course_metadata(&title).await? {
            Some(course) => course,
            None => {
                return Ok(ToolOutput::text_only(format!(
                    "No metadata found for course '{}'.",
                    title
                )));
            }
        };

        let mut text = format!("Course Title: {}\n", course.title);
        if let Some(instructor) = &course.instructor {
            text.push_str(&format!("Instructor: {}\n", instructor));
        }
        if let Some(link) = &course.link {
            text.push_str(&format!("Course Link: {}\n", link));
        }
        text.push_str(&format!("\nLessons ({} total):\n", course.lessons.len()));
        for lesson in &course.lessons {
            text.push_str(&format!("Lesson {}: {}\n", lesson.number, lesson.title));
        }

        let sources = vec![SourceRef {
            label: course.title.clone(),
            link: course.link.clone(),
        }];

        Ok(ToolOutput {
            text: text.trim_end().to_string(),
            sources,
        })
    }
}

/// Get OpenAI function/tool definitions for the query loop.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "search_course_content".to_string(),
                description: Some(
                    "Search course materials with smart course name matching and lesson filtering."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "What to search for in the course content"
                        },
                        "course_name": {
                            "type": "string",
                            "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                        },
                        "lesson_number": {
                            "type": "integer",
                            "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                        }
                    },
                    "required": ["query"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "get_course_outline".to_string(),
                description: Some(
                    "Get a course outline including title, link, instructor and the complete \
                    lesson list with numbers and titles."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "course_name": {
                            "type": "string",
                            "description": "Course title (partial matches work)"
                        }
                    },
                    "required": ["course_name"]
                })),
                strict: None,
            },
        },
    ]
}

/// Parse a tool call from the model's function-call format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| KursError::Model(format!("Invalid tool arguments: {}", e)))?;

    match name {
        "search_course_content" => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| KursError::Model("Missing 'query' argument".to_string()))?
                .to_string();
            let course_name = args["course_name"].as_str().map(str::to_string);
            let lesson_number = args["lesson_number"].as_u64().map(|n| n as u32);
            Ok(ToolCall::SearchCourseContent {
                query,
                course_name,
                lesson_number,
            })
        }
        "get_course_outline" => {
            let course_name = args["course_name"]
                .as_str()
                .ok_or_else(|| KursError::Model("Missing 'course_name' argument".to_string()))?
                .to_string();
            Ok(ToolCall::GetCourseOutline { course_name })
        }
        _ => Err(KursError::Model(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Course, CourseChunk, Lesson};
    use crate::embedding::testing::HashEmbedder;
    use crate::vector_store::MemoryVectorStore;

    #[test]
    fn test_parse_search_tool() {
        let tool = parse_tool_call(
            "search_course_content",
            r#"{"query": "embeddings", "course_name": "MCP", "lesson_number": 2}"#,
        )
        .unwrap();
        assert_eq!(
            tool,
            ToolCall::SearchCourseContent {
                query: "embeddings".to_string(),
                course_name: Some("MCP".to_string()),
                lesson_number: Some(2),
            }
        );
    }

    #[test]
    fn test_parse_search_tool_defaults() {
        let tool = parse_tool_call("search_course_content", r#"{"query": "q"}"#).unwrap();
        assert_eq!(
            tool,
            ToolCall::SearchCourseContent {
                query: "q".to_string(),
                course_name: None,
                lesson_number: None,
            }
        );
    }

    #[test]
    fn test_parse_unknown_tool() {
        assert!(parse_tool_call("no_such_tool", "{}").is_err());
    }

    #[test]
    fn test_parse_missing_required_argument() {
        assert!(parse_tool_call("search_course_content", r#"{"limit": 3}"#).is_err());
        assert!(parse_tool_call("get_course_outline", "{}").is_err());
    }

    async fn context_with_course() -> ToolContext {
        let index = Arc::new(CourseIndex::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(HashEmbedder),
        ));

        let mut course = Course::new(
            "Introduction to Machine Learning".to_string(),
            Some("https://example.com/ml".to_string()),
            Some("Ada Lovelace".to_string()),
        );
        course.lessons.push(Lesson {
            number: 1,
            title: "Linear Models".to_string(),
            link: Some("https://example.com/ml/1".to_string()),
        });
        index.upsert_course_metadata(&course).await.unwrap();
        index
            .add_chunks(vec![CourseChunk {
                text: "Gradient descent minimizes the loss function.".to_string(),
                course_title: course.title.clone(),
                lesson_number: Some(1),
                chunk_index: 0,
            }])
            .await
            .unwrap();

        ToolContext::new(index, 5)
    }

    #[tokio::test]
    async fn test_search_formats_results_and_sources() {
        let context = context_with_course().await;

        let output = context
            .execute(&ToolCall::SearchCourseContent {
                query: "gradient descent".to_string(),
                course_name: None,
                lesson_number: None,
            })
            .await
            .unwrap();

        assert!(output
            .text
            .starts_with("[Introduction to Machine Learning - Lesson 1]"));
        assert_eq!(output.sources.len(), 1);
        assert_eq!(
            output.sources[0].label,
            "Introduction to Machine Learning - Lesson 1"
        );
        assert_eq!(
            output.sources[0].link.as_deref(),
            Some("https://example.com/ml/1")
        );
    }

    #[tokio::test]
    async fn test_search_unknown_course_is_message_not_error() {
        let index = Arc::new(CourseIndex::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(HashEmbedder),
        ));
        let context = ToolContext::new(index, 5);

        let output = context
            .execute(&ToolCall::SearchCourseContent {
                query: "anything".to_string(),
                course_name: Some("ghost".to_string()),
                lesson_number: None,
            })
            .await
            .unwrap();

        assert!(output.text.contains("No course found matching 'ghost'"));
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_results_message_names_filters() {
        let context = context_with_course().await;

        let output = context
            .execute(&ToolCall::SearchCourseContent {
                query: "anything".to_string(),
                course_name: Some("machine learning".to_string()),
                lesson_number: Some(9),
            })
            .await
            .unwrap();

        assert!(output.text.contains("No relevant content found"));
        assert!(output.text.contains("in course 'machine learning'"));
        assert!(output.text.contains("in lesson 9"));
    }

    #[tokio::test]
    async fn test_outline() {
        let context = context_with_course().await;

        let output = context
            .execute(&ToolCall::GetCourseOutline {
                course_name: "intro to ml".to_string(),
            })
            .await
            .unwrap();

        assert!(output
            .text
            .contains("Course Title: Introduction to Machine Learning"));
        assert!(output.text.contains("Instructor: Ada Lovelace"));
        assert!(output.text.contains("Lessons (1 total):"));
        assert!(output.text.contains("Lesson 1: Linear Models"));
        assert_eq!(output.sources.len(), 1);
    }
}
