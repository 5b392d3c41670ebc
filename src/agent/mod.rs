//! Language model seam and tool-calling machinery.
//!
//! The model is an opaque collaborator: given a prompt and the available
//! tools it returns either a final answer or a request to invoke a tool.
//! Keeping it behind [`ChatModel`] lets the loop be driven by a scripted
//! model in tests.

mod runner;
mod tools;

pub use runner::{QueryRunner, RunOutcome};
pub use tools::{parse_tool_call, tool_definitions, SourceRef, ToolCall, ToolContext, ToolOutput};

use crate::error::{KursError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
};
use async_trait::async_trait;

/// One message in a model conversation.
#[derive(Debug, Clone)]
pub enum ChatMessage {
    /// User text.
    User(String),
    /// Assistant text.
    Assistant(String),
    /// Assistant request to invoke tools.
    ToolUse(Vec<ToolInvocation>),
    /// Result of an executed tool invocation.
    ToolResult { id: String, content: String },
}

/// A model-requested tool invocation.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Provider-assigned call id, echoed back with the result.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: String,
}

/// What the model produced for one round.
#[derive(Debug, Clone)]
pub enum ModelReply {
    /// Final answer text.
    Answer(String),
    /// The model wants these tools executed first.
    ToolCalls(Vec<ToolInvocation>),
}

/// A single model call.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System instruction.
    pub system: String,
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Whether the search tools are offered this round.
    pub tools_enabled: bool,
}

/// Trait for tool-calling chat model implementations.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one model round.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply>;
}

/// OpenAI chat completions implementation.
pub struct OpenAiChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiChatModel {
    /// Create a model client for the given model name.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }

    fn build_messages(request: &ModelRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| KursError::Model(e.to_string()))?
                .into(),
        ];

        for message in &request.messages {
            match message {
                ChatMessage::User(text) => messages.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(text.clone())
                        .build()
                        .map_err(|e| KursError::Model(e.to_string()))?
                        .into(),
                ),
                ChatMessage::Assistant(text) => messages.push(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(text.clone())
                        .build()
                        .map_err(|e| KursError::Model(e.to_string()))?
                        .into(),
                ),
                ChatMessage::ToolUse(invocations) => {
                    let tool_calls: Vec<ChatCompletionMessageToolCall> = invocations
                        .iter()
                        .map(|inv| ChatCompletionMessageToolCall {
                            id: inv.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: inv.name.clone(),
                                arguments: inv.arguments.clone(),
                            },
                        })
                        .collect();
                    messages.push(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .tool_calls(tool_calls)
                            .build()
                            .map_err(|e| KursError::Model(e.to_string()))?
                            .into(),
                    );
                }
                ChatMessage::ToolResult { id, content } => messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(id.clone())
                        .content(content.clone())
                        .build()
                        .map_err(|e| KursError::Model(e.to_string()))?
                        .into(),
                ),
            }
        }

        Ok(messages)
    }
}


#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply> {
        let messages = Self::build_messages(request)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(messages);
        if request.tools_enabled {
            builder.tools(tool_definitions());
        }
        let api_request = builder
            .build()
            .map_err(|e| KursError::Model(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| KursError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KursError::Model("No response from model".to_string()))?;

        if let Some(tool_calls) = choice.message.tool_calls {
            if !tool_calls.is_empty() {
                let invocations = tool_calls
                    .into_iter()
                    .map(|call| ToolInvocation {
                        id: call.id,
                        name: call.function.name,
                        arguments: call.function.arguments,
                    })
                    .collect();
                return Ok(ModelReply::ToolCalls(invocations));
            }
        }

        Ok(ModelReply::Answer(choice.message.content.unwrap_or_default()))
    }
}
