use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

use super::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::{config::AssistantConfig, error::AppError, metrics};

/// Anything able to answer a conversation with one assistant turn
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AppError>;
}

/// Client for an OpenAI-compatible Chat Completions API
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(client: Client, config: &AssistantConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, AppError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Assistant {
                status: None,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Assistant {
                status: Some(status),
                message: error_text,
            });
        }

        response.json().await.map_err(|e| AppError::Assistant {
            status: None,
            message: format!("Invalid chat completion response: {}", e),
        })
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AppError> {
        let start = Instant::now();
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            max_tokens: None,
            stream: Some(false),
        };

        let result = self.send(&request).await.and_then(|body| {
            if let Some(usage) = &body.usage {
                metrics::record_assistant_tokens(&self.model, "input", usage.prompt_tokens);
                metrics::record_assistant_tokens(&self.model, "output", usage.completion_tokens);
            }

            tracing::info!(
                model = %self.model,
                duration_ms = start.elapsed().as_millis(),
                prompt_tokens = body.usage.as_ref().map(|u| u.prompt_tokens),
                completion_tokens = body.usage.as_ref().map(|u| u.completion_tokens),
                "Completed chat completion request"
            );

            body.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .filter(|content| !content.trim().is_empty())
                .ok_or_else(|| AppError::Assistant {
                    status: None,
                    message: "Chat completion returned no content".to_string(),
                })
        });

        match &result {
            Ok(_) => metrics::record_assistant_request(&self.model, "ok", start.elapsed()),
            Err(e) => {
                tracing::warn!(model = %self.model, error = %e, "Chat completion failed");
                metrics::record_assistant_request(&self.model, "error", start.elapsed());
                metrics::record_error("assistant", "assistant_error");
            }
        }

        result
    }
}
