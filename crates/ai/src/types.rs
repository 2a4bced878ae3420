//! Assistant outputs and their response schemas.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AiError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealAnalysis {
    pub sentiment: Sentiment,
    /// 0 (safe) to 100 (likely lost).
    pub risk_score: u8,
    pub summary: String,
    pub next_steps: Vec<String>,
}

/// Wire shape before range checks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDealAnalysis {
    sentiment: Sentiment,
    risk_score: i64,
    summary: String,
    next_steps: Vec<String>,
}

impl EmailDraft {
    pub(crate) fn schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "subject": { "type": "STRING" },
                "body": { "type": "STRING" }
            },
            "required": ["subject", "body"]
        })
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| AiError::malformed(format!("email draft is not valid JSON: {}", e)))
    }
}

impl DealAnalysis {
    pub(crate) fn schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "sentiment": { "type": "STRING", "enum": ["Positive", "Neutral", "Negative"] },
                "riskScore": { "type": "INTEGER" },
                "summary": { "type": "STRING" },
                "nextSteps": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["sentiment", "riskScore", "summary", "nextSteps"]
        })
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        let raw: RawDealAnalysis = serde_json::from_str(text)
            .map_err(|e| AiError::malformed(format!("deal analysis is not valid JSON: {}", e)))?;
        let risk_score = u8::try_from(raw.risk_score)
            .ok()
            .filter(|score| *score <= 100)
            .ok_or_else(|| {
                AiError::malformed(format!("riskScore {} is outside 0-100", raw.risk_score))
            })?;
        Ok(Self {
            sentiment: raw.sentiment,
            risk_score,
            summary: raw.summary,
            next_steps: raw.next_steps,
        })
    }
}
