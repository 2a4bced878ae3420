//! Deal domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{Entity, EntityKind};
use crate::errors::{Result, ValidationError};
use crate::seed;

/// Probability assigned to new deals when the caller gives none.
pub const DEFAULT_DEAL_PROBABILITY: u8 = 10;

/// Company recorded on new deals when the caller gives none.
pub const DEFAULT_DEAL_COMPANY: &str = "Base Show";

/// Tag attached to freshly created deals.
pub const NEW_DEAL_TAG: &str = "Novo";

/// Pipeline stage. Transitions between stages are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealStage {
    #[serde(rename = "Lead")]
    Lead,
    #[serde(rename = "Qualified")]
    Qualified,
    #[serde(rename = "Proposal")]
    Proposal,
    #[serde(rename = "Negotiation")]
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl DealStage {
    pub const ALL: [DealStage; 6] = [
        DealStage::Lead,
        DealStage::Qualified,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::ClosedWon,
        DealStage::ClosedLost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DealStage::Lead => "Lead",
            DealStage::Qualified => "Qualified",
            DealStage::Proposal => "Proposal",
            DealStage::Negotiation => "Negotiation",
            DealStage::ClosedWon => "Closed Won",
            DealStage::ClosedLost => "Closed Lost",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStage {
    type Err = ValidationError;

    /// Accepts the wire form ("Closed Won") as well as "closed-won" / "closed_won".
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().to_lowercase() == normalized)
            .ok_or_else(|| ValidationError::InvalidInput(format!("Unknown deal stage '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DealRecord")]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub value: Decimal,
    pub stage: DealStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub probability: u8,
    pub expected_close_date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Wire shape of a deal before its invariants are checked.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DealRecord {
    id: String,
    title: String,
    value: Decimal,
    stage: DealStage,
    #[serde(default)]
    contact_id: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
    probability: u8,
    expected_close_date: NaiveDate,
    #[serde(default)]
    tags: Vec<String>,
}

impl TryFrom<DealRecord> for Deal {
    type Error = ValidationError;

    fn try_from(record: DealRecord) -> std::result::Result<Self, Self::Error> {
        let deal = Deal {
            id: record.id,
            title: record.title,
            value: record.value,
            stage: record.stage,
            contact_id: record.contact_id,
            company_name: record.company_name,
            probability: record.probability,
            expected_close_date: record.expected_close_date,
            tags: record.tags,
        };
        deal.check()?;
        Ok(deal)
    }
}

/// Input model for creating a new deal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    pub title: String,
    pub value: Decimal,
    #[serde(default)]
    pub stage: Option<DealStage>,
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub probability: Option<u8>,
    #[serde(default)]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl NewDeal {
    pub fn validate(&self) -> Result<()> {
        check_title(&self.title)?;
        check_value(self.value)?;
        if let Some(probability) = self.probability {
            check_probability(probability)?;
        }
        Ok(())
    }
}

/// Partial change to an existing deal; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealEdit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub stage: Option<DealStage>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub probability: Option<u8>,
}

impl DealEdit {
    pub fn is_empty(&self) -> bool {
        self == &DealEdit::default()
    }
}

fn check_title(title: &str) -> std::result::Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::MissingField("title"));
    }
    Ok(())
}

fn check_value(value: Decimal) -> std::result::Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::InvalidInput(format!(
            "Deal value must be non-negative, got {}",
            value
        )));
    }
    Ok(())
}

fn check_probability(probability: u8) -> std::result::Result<(), ValidationError> {
    if probability > 100 {
        return Err(ValidationError::InvalidInput(format!(
            "Probability must be between 0 and 100, got {}",
            probability
        )));
    }
    Ok(())
}

impl Deal {
    /// Builds a deal with a timestamp-derived id (`d<millis>`).
    pub fn create(input: NewDeal) -> Result<Self> {
        let id = format!("d{}", Utc::now().timestamp_millis());
        Self::create_with_id(id, input, Utc::now().date_naive())
    }

    /// Builds a deal with a caller-provided id; `today` backs the default close date.
    pub fn create_with_id(id: impl Into<String>, input: NewDeal, today: NaiveDate) -> Result<Self> {
        input.validate()?;
        Ok(Self {
            id: id.into(),
            title: input.title.trim().to_string(),
            value: input.value,
            stage: input.stage.unwrap_or(DealStage::Lead),
            contact_id: input.contact_id.filter(|id| !id.trim().is_empty()),
            company_name: Some(
                input
                    .company_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_DEAL_COMPANY.to_string()),
            ),
            probability: input.probability.unwrap_or(DEFAULT_DEAL_PROBABILITY),
            expected_close_date: input.expected_close_date.unwrap_or(today),
            tags: input
                .tags
                .unwrap_or_else(|| vec![NEW_DEAL_TAG.to_string()]),
        })
    }

    /// Copy of this deal with `edit` applied. Blank titles and company names
    /// are ignored.
    pub fn edited(&self, edit: &DealEdit) -> Self {
        let mut deal = self.clone();
        if let Some(title) = edit.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            deal.title = title.to_string();
        }
        if let Some(value) = edit.value {
            deal.value = value;
        }
        if let Some(stage) = edit.stage {
            deal.stage = stage;
        }
        if let Some(company) = edit
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            deal.company_name = Some(company.to_string());
        }
        if let Some(probability) = edit.probability {
            deal.probability = probability;
        }
        deal
    }

    fn check(&self) -> std::result::Result<(), ValidationError> {
        check_title(&self.title)?;
        check_value(self.value)?;
        check_probability(self.probability)
    }

    /// Copy of this deal placed in `stage`.
    pub fn with_stage(&self, stage: DealStage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }
}

impl Entity for Deal {
    const KIND: EntityKind = EntityKind::Deals;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        Ok(self.check()?)
    }

    fn seed() -> Vec<Self> {
        seed::seed_deals()
    }
}
