use crate::config::toml_config::InterpretationConfig;
use crate::domain::ports::{ChatCompletion, ChatMessage, InterpretationRequest, Interpreter};
use crate::utils::error::{Result, TarotError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    system_prompt: String,
}

impl ChatCompletionClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        system_prompt: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            system_prompt: system_prompt.into(),
        })
    }

    pub fn from_config(config: &InterpretationConfig) -> Result<Self> {
        let api_key = config.api_key().map(str::to_string);
        if api_key.is_none() {
            tracing::warn!(
                "No interpretation API key configured, requests will be unauthenticated"
            );
        }
        Self::new(
            config.endpoint.clone(),
            config.model.clone(),
            api_key,
            config.system_prompt.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn failure(message: impl Into<String>) -> TarotError {
        TarotError::Interpretation {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Interpreter for ChatCompletionClient {
    async fn interpret(&self, request: &InterpretationRequest) -> Result<ChatCompletion> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            stream: false,
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!("Calling chat completion endpoint: {}", self.endpoint);
        let response = builder
            .send()
            .await
            .map_err(|e| Self::failure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::failure(format!(
                "API Error: {} - {}",
                status.as_u16(),
                error_body
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| Self::failure(format!("invalid response body: {}", e)))?;

        if completion.choices.is_empty() {
            return Err(Self::failure("response contained no choices"));
        }

        Ok(completion)
    }
}
