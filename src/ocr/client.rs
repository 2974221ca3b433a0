//! Recognition service client.
//!
//! Sends one multipart POST per image carrying the binary payload, the
//! source-language code and, when translation is enabled, the target-language
//! code. The call is dispatched exactly once: no retries, and no client-side
//! timeout on top of what the transport itself enforces, so a hung service
//! stalls the run.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::types::Recognition;
use crate::config::RecognitionConfig;

/// Error payload the service returns with a non-success status.
#[derive(Deserialize)]
struct ErrorPayload {
    error: String,
}

/// Client for the OCR/translation endpoint.
pub struct RecognitionClient {
    http: Client,
    config: RecognitionConfig,
}

impl RecognitionClient {
    pub fn new(config: RecognitionConfig) -> Result<Self, String> {
        let http = Client::builder()
            .build()
            .map_err(|e| format!("failed to create HTTP client: {}", e))?;

        Ok(Self { http, config })
    }

    /// Recognize text in one image.
    ///
    /// Returns the structured `{text, translation}` payload on success. Any
    /// failure (transport error, non-success status, undecodable body) is
    /// an `Err`; the caller decides how to degrade.
    pub async fn recognize(&self, image: &[u8], file_name: &str) -> Result<Recognition, String> {
        let part = Part::bytes(image.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| format!("invalid image part: {}", e))?;

        let mut form = Form::new()
            .part("image", part)
            .text("language", self.config.source_language.clone());
        if let Some(target) = &self.config.target_language {
            form = form.text("target_language", target.clone());
        }

        tracing::debug!("recognizing {} via {}", file_name, self.config.endpoint);

        let response = self
            .http
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("recognition request failed: {}", e))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<Recognition>()
                .await
                .map_err(|e| format!("failed to parse recognition response: {}", e))
        } else {
            let detail = response
                .json::<ErrorPayload>()
                .await
                .map(|p| p.error)
                .unwrap_or_default();
            Err(format!("recognition service error ({}): {}", status, detail))
        }
    }
}
