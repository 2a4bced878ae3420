//! Gemini REST client (`models/{model}:generateContent`) in JSON response mode.

use std::time::Duration;

use log::{debug, error};
use serde::Deserialize;
use serde_json::{json, Value};

use boracrm_core::contacts::Contact;
use boracrm_core::deals::Deal;

use crate::error::{AiError, Result};
use crate::prompts::{analysis_prompt, email_prompt};
use crate::types::{DealAnalysis, EmailDraft};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_LOG_BODY_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Fails with [`AiError::ConfigurationMissing`] when `api_key` is absent or blank.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(AiError::ConfigurationMissing)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn draft_email(
        &self,
        contact: &Contact,
        deal: Option<&Deal>,
        intent: &str,
    ) -> Result<EmailDraft> {
        let text = self
            .generate_json(email_prompt(contact, deal, intent), EmailDraft::schema())
            .await?;
        EmailDraft::parse(&text)
    }

    pub async fn analyze_deal(
        &self,
        deal: &Deal,
        contact: &Contact,
        notes: &str,
    ) -> Result<DealAnalysis> {
        let text = self
            .generate_json(analysis_prompt(deal, contact, notes), DealAnalysis::schema())
            .await?;
        DealAnalysis::parse(&text)
    }

    /// Runs one prompt and returns the model's raw JSON text.
    async fn generate_json(&self, prompt: String, schema: Value) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });
        debug!("Requesting {} completion", self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let preview: String = text.chars().take(MAX_LOG_BODY_CHARS).collect();
            debug!("Gemini error ({}): {}", status, preview);
            let message = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(err) => match err.error.status {
                    Some(code) => format!("{}: {}", code, err.error.message),
                    None => err.error.message,
                },
                Err(_) => format!("Request failed: {}", preview),
            };
            return Err(AiError::api(status.as_u16(), message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            error!("Unexpected Gemini response envelope: {}", e);
            AiError::malformed(format!("unexpected response envelope: {}", e))
        })?;
        parsed
            .text()
            .ok_or_else(|| AiError::malformed("no response from AI"))
    }
}
