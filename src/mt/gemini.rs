//! Gemini streaming provider
//!
//! This module talks to the Gemini `streamGenerateContent` endpoint with
//! `alt=sse`, so the answer arrives as server-sent events. The response body
//! is framed by `eventsource-stream` and each event is parsed into text as it
//! comes in.
//!
//! # Authentication
//!
//! The key is read from `GEMINI_API_KEY` (or `API_KEY`) by
//! [`GeminiConfig::from_env`]. A provider can be built without one; every
//! translation then fails with a configuration error before any request is sent.
//!
//! # Example
//!
//! ```ignore
//! use tsuyaku::mt::{GeminiProvider, StreamingTranslator, TranslationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GeminiProvider::from_env()?;
//!     let request = TranslationRequest::new("Good morning", "Japanese", "");
//!     let result = provider.translate(&request, &mut |_| {}).await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

use crate::config::GeminiConfig;
use crate::mt::error::{MtError, MtResult};
use crate::mt::prompt::{SYSTEM_INSTRUCTION, TranslationRequest};
use crate::mt::sse::text_chunks;
use crate::mt::translator::{StreamingTranslator, TextStream};
use async_trait::async_trait;
use serde_json::{Value, json};

const MISSING_KEY: &str = "API Key is missing. Please check your environment configuration.";

/// Gemini generative-language API provider
#[derive(Clone)]
pub struct GeminiProvider {
    config: GeminiConfig,
    /// HTTP client for async requests
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider from an explicit configuration
    ///
    /// # Errors
    ///
    /// `MtError::NetworkError` if the HTTP client cannot be built. A missing
    /// API key is not an error here.
    pub fn new(config: GeminiConfig) -> MtResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create a provider configured from the environment
    pub fn from_env() -> MtResult<Self> {
        Self::new(GeminiConfig::from_env())
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Request body: system persona, one user turn, sampling temperature
    fn request_body(&self, request: &TranslationRequest) -> Value {
        json!({
            "systemInstruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt() }]
            }],
            "generationConfig": {
                "temperature": self.config.temperature
            }
        })
    }
}

/// Extract the text of one streamed `GenerateContentResponse`.
///
/// Returns `Ok(None)` for events that carry no text (e.g. the final usage
/// metadata event) and an `ApiError` for in-stream error objects.
pub(crate) fn parse_stream_event(payload: &str) -> MtResult<Option<String>> {
    if payload.trim() == "[DONE]" {
        return Ok(None);
    }

    let event: Value = serde_json::from_str(payload)
        .map_err(|e| MtError::StreamError(format!("Malformed stream event: {}", e)))?;

    if let Some(error) = event.get("error") {
        let message = error["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string();
        return Err(MtError::ApiError(message));
    }

    let Some(parts) = event
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    else {
        return Ok(None);
    };

    let text: String = parts
        .iter()
        .filter(|part| !part["thought"].as_bool().unwrap_or(false))
        .filter_map(|part| part["text"].as_str())
        .collect();

    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Turn a non-success HTTP answer into an error, preferring the API's own message.
fn status_error(status: reqwest::StatusCode, body: &str) -> MtError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    match status.as_u16() {
        401 | 403 => MtError::ConfigError(format!("API rejected the key ({}): {}", status, message)),
        _ => MtError::ApiError(format!("{}: {}", status, message)),
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl StreamingTranslator for GeminiProvider {
    fn check_ready(&self) -> MtResult<()> {
        match self.config.api_key() {
            Some(_) => Ok(()),
            None => Err(MtError::ConfigError(MISSING_KEY.to_string())),
        }
    }

    async fn open_stream(&self, request: &TranslationRequest) -> MtResult<TextStream> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| MtError::ConfigError(MISSING_KEY.to_string()))?;

        tracing::debug!(
            model = %self.config.model,
            target = %request.target_language,
            has_rules = !request.custom_rules.trim().is_empty(),
            "opening translation stream"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &body));
        }

        Ok(Box::pin(text_chunks(response.bytes_stream(), parse_stream_event)))
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}
