//! Sales assistant for Bora CRM: email drafts and deal health analysis backed
//! by Gemini, with a simulated mode when no credential is configured.

pub mod client;
pub mod error;
pub mod prompts;
pub mod service;
pub mod types;

pub use client::GeminiClient;
pub use error::{AiError, Result};
pub use service::{AssistantMode, AssistantService};
pub use types::{DealAnalysis, EmailDraft, Sentiment};
