// src/provider/openai_compat.rs — OpenAI-compatible chat-completion client
//
// The Together API speaks this dialect; any endpoint exposing
// `/chat/completions` under the configured base url works.

use async_trait::async_trait;

use super::{ChatProvider, ChatRequest, ChatResponse, TokenUsage};
use crate::infra::errors::AerologError;

pub struct OpenAiCompatProvider {
    name_str: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(name: impl Into<String>, api_key: String, base_url: String) -> Self {
        Self {
            name_str: name.into(),
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn provider_err(&self, message: impl Into<String>) -> AerologError {
        AerologError::Provider {
            message: format!("{}: {}", self.name_str, message.into()),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name_str
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AerologError> {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_api_str(),
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.provider_err(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(self.provider_err(format!("HTTP {status}: {error_body}")));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.provider_err(format!("unreadable response: {e}")))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| self.provider_err("response carries no completion content"))?
            .to_string();

        let usage = TokenUsage {
            input_tokens: payload["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: payload["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        Ok(ChatResponse { content, usage })
    }
}
