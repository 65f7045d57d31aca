use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::prompt::{InstructionSequence, Message};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

pub trait CompletionService {
    fn model(&self) -> &str;

    fn complete(&self, instructions: &InstructionSequence) -> Result<String>;
}

impl<T: CompletionService + ?Sized> CompletionService for &T {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn complete(&self, instructions: &InstructionSequence) -> Result<String> {
        (**self).complete(instructions)
    }
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::ServiceError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl CompletionService for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    fn complete(&self, instructions: &InstructionSequence) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ServiceError("No API key configured".to_string()))?;

        let body = ChatRequest {
            model: &self.model,
            messages: instructions.messages(),
        };

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| AppError::ServiceError(format!("Request to {} failed: {}", self.endpoint, e)))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().unwrap_or_default();
            return Err(AppError::ServiceError(format!(
                "Completion request rejected with status {}: {}",
                status,
                detail.trim()
            )));
        }

        let json: serde_json::Value = res
            .json()
            .map_err(|e| AppError::ServiceError(format!("Response was not JSON: {}", e)))?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AppError::ServiceError("Invalid response format from completion service".to_string()))?
            .to_string();

        debug!(chars = reply.len(), "completion received");
        Ok(reply)
    }
}

pub fn invoke<C: CompletionService + ?Sized>(
    service: &C,
    instructions: &InstructionSequence,
) -> Result<String> {
    service.complete(instructions)
}
