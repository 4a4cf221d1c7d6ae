//! Gemini `generateContent` extraction client.
//!
//! One POST per image: the payload goes inline as base64 next to the
//! instruction text, and `generationConfig` pins the response to JSON
//! matching [`response_schema`](super::schema::response_schema).

use super::schema::{INSTRUCTION, parse_fields, response_schema};
use super::{ExtractionClient, ExtractionError, ExtractionResult};
use crate::imaging::EnhancedImage;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the HTTP client with one that gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ExtractionError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Request body for one extraction.
pub fn build_request(image: &EnhancedImage) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "inlineData": { "mimeType": image.mime_type, "data": STANDARD.encode(&image.bytes) } },
                { "text": INSTRUCTION }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Pull the generated text out of a `generateContent` response body and
/// parse it as a field mapping.
pub fn parse_response(body: &str) -> Result<ExtractionResult, ExtractionError> {
    if body.trim().is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::Malformed(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    parse_fields(&text)
}

#[async_trait]
impl ExtractionClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn extract(&self, image: &EnhancedImage) -> Result<ExtractionResult, ExtractionError> {
        if image.is_empty() {
            return Err(ExtractionError::EmptyPayload);
        }
        let start = Instant::now();
        let body = build_request(image);

        debug!(
            model = %self.model,
            bytes = image.bytes.len(),
            width = image.width,
            height = image.height,
            "sending extraction request"
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let result = parse_response(&text)?;
        info!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "extraction complete"
        );
        Ok(result)
    }
}
