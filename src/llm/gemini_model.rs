use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::AiConfig;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Gemini API key is missing. Set GEMINI_API_KEY or run `taskpilot set gemini_api_key <KEY>`.")]
    MissingCredential,
    /// Unreachable service or an unparseable reply. The cause is logged only.
    #[error("AI connection error.")]
    Connection,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    base_url: String,
    model_name: String,
    api_key: Option<String>,
}

impl GeminiModel {
    pub fn new(config: AiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url,
            model_name: config.model,
            api_key: config.api_key,
        })
    }

    /// Sends one prompt and returns the first candidate's first text part,
    /// or `None` when the reply has no such field.
    pub async fn generate(&self, prompt: &str) -> Result<Option<String>, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AiError::MissingCredential)?;

        let url = format!(
            "{}/v1/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_name
        );
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        log::debug!("sending {} byte prompt to {}", prompt.len(), self.model_name);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request failed: {}", e);
                AiError::Connection
            })?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| {
            log::error!("Failed to parse Gemini response ({}): {}", status, e);
            AiError::Connection
        })?;

        if !status.is_success() {
            log::warn!("Gemini returned {}: {}", status, body);
        }

        Ok(extract_text(&body))
    }
}

fn extract_text(body: &serde_json::Value) -> Option<String> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(|text| text.as_str())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
