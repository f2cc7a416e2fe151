//! Chat model access

mod openai;

pub use openai::OpenAiChat;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A single system + user exchange
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    /// Ask the model for a JSON object instead of free text
    pub json_response: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// Stream of answer fragments
pub type DeltaStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion>;

    async fn stream(&self, request: &ChatRequest) -> Result<DeltaStream>;

    fn name(&self) -> &str;
}
