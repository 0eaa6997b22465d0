use crate::utils::error::{EntropyError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Remote source of true-random values used to order a deck.
#[async_trait]
pub trait EntropySource: Send + Sync {
    /// Returns exactly `n` values or an error; callers treat any error as recoverable.
    async fn fetch_entropy(&self, n: usize) -> std::result::Result<Vec<u32>, EntropyError>;
}

#[async_trait]
impl<T: EntropySource + ?Sized> EntropySource for Arc<T> {
    async fn fetch_entropy(&self, n: usize) -> std::result::Result<Vec<u32>, EntropyError> {
        (**self).fetch_entropy(n).await
    }
}

/// Body accepted by the interpretation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Chat-completion shaped response; unknown fields are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<ChatChoice>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ChatCompletion {
    /// Markdown content of the first choice.
    pub fn content(&self) -> Option<&str> {
        self.choices.first().map(|choice| choice.message.content.as_str())
    }
}

#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, request: &InterpretationRequest) -> Result<ChatCompletion>;
}

#[async_trait]
impl<T: Interpreter + ?Sized> Interpreter for Arc<T> {
    async fn interpret(&self, request: &InterpretationRequest) -> Result<ChatCompletion> {
        (**self).interpret(request).await
    }
}
