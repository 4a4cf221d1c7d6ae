//! Structured extraction of contact fields from an enhanced image.
//!
//! An [`ExtractionClient`] sends one [`EnhancedImage`] together with the field
//! schema and instruction text from [`schema`], and returns the partial field
//! mapping the service produced. There is exactly one attempt per call: a
//! transport failure, an empty body, or a body that is not a valid field
//! mapping fails the whole call. Nothing is salvaged from a bad response.
//!
//! [`GeminiClient`] talks to the Gemini `generateContent` endpoint.

pub mod gemini;
pub mod schema;

use crate::imaging::EnhancedImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::GeminiClient;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Extraction service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Extraction service returned an empty response")]
    EmptyResponse,
    #[error("Malformed extraction response: {0}")]
    Malformed(String),
    #[error("No image payload to send")]
    EmptyPayload,
}

/// Fields the service managed to read. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionResult {
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub nature_of_business: Option<String>,
    pub business_type: Option<String>,
    pub notes: Option<String>,
}

/// A structured-extraction service.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, image: &EnhancedImage) -> Result<ExtractionResult, ExtractionError>;
}
