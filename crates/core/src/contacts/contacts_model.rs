//! Contact domain models.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Entity, EntityKind};
use crate::errors::{Result, ValidationError};
use crate::seed;

const AVATAR_BASE_URL: &str = "https://ui-avatars.com/api/";

/// Display name used when a deal points at a contact that no longer exists.
pub const UNKNOWN_CONTACT_NAME: &str = "Unknown contact";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub role: String,
    pub avatar_url: String,
    pub last_contacted: NaiveDate,
    pub notes: String,
}

/// Input model for creating a new contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewContact {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        Ok(())
    }
}

impl Contact {
    /// Builds a contact with a timestamp-derived id (`c<millis>`).
    pub fn create(input: NewContact) -> Result<Self> {
        let id = format!("c{}", Utc::now().timestamp_millis());
        Self::create_with_id(id, input, Utc::now().date_naive())
    }

    /// Builds a contact with a caller-provided id and contact date.
    pub fn create_with_id(
        id: impl Into<String>,
        input: NewContact,
        last_contacted: NaiveDate,
    ) -> Result<Self> {
        input.validate()?;
        let name = input.name.trim().to_string();
        Ok(Self {
            id: id.into(),
            avatar_url: avatar_url_for(&name),
            name,
            email: input.email.trim().to_string(),
            phone: input.phone.unwrap_or_default(),
            company: input.company.unwrap_or_default(),
            role: input.role.unwrap_or_default(),
            last_contacted,
            notes: input.notes.unwrap_or_default(),
        })
    }

    /// Stand-in rendered for dangling contact references.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: UNKNOWN_CONTACT_NAME.to_string(),
            email: String::new(),
            phone: String::new(),
            company: String::new(),
            role: String::new(),
            avatar_url: avatar_url_for(UNKNOWN_CONTACT_NAME),
            last_contacted: NaiveDate::default(),
            notes: String::new(),
        }
    }

    /// Case-insensitive match on name or company.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.company.to_lowercase().contains(&needle)
    }
}

impl Entity for Contact {
    const KIND: EntityKind = EntityKind::Contacts;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        Ok(())
    }

    fn seed() -> Vec<Self> {
        seed::seed_contacts()
    }
}

/// Deterministic avatar for a display name.
pub fn avatar_url_for(name: &str) -> String {
    format!(
        "{}?name={}&background=random",
        AVATAR_BASE_URL,
        urlencoding::encode(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: &str) -> NewContact {
        NewContact {
            name: name.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_requires_name_and_email() {
        assert!(Contact::create(input("", "a@b.com")).is_err());
        assert!(Contact::create(input("Ana", "  ")).is_err());
        assert!(Contact::create(input("Ana", "a@b.com")).is_ok());
    }

    #[test]
    fn generated_id_uses_timestamp_prefix() {
        let contact = Contact::create(input("Ana", "a@b.com")).unwrap();
        assert!(contact.id.starts_with('c'));
        assert!(contact.id[1..].parse::<i64>().is_ok());
    }

    #[test]
    fn avatar_is_derived_from_name() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let contact = Contact::create_with_id("c1", input("Ana Lima", "a@b.com"), date).unwrap();
        assert_eq!(
            contact.avatar_url,
            "https://ui-avatars.com/api/?name=Ana%20Lima&background=random"
        );
        assert_eq!(contact.avatar_url, avatar_url_for("Ana Lima"));
        assert_eq!(contact.phone, "");
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let contact = Contact::create_with_id("c1", input("Ana", "a@b.com"), date).unwrap();
        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value["avatarUrl"], avatar_url_for("Ana"));
        assert_eq!(value["lastContacted"], "2024-05-01");
    }

    #[test]
    fn matches_name_or_company_ignoring_case() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut contact = Contact::create_with_id("c1", input("Alice", "a@b.com"), date).unwrap();
        contact.company = "TechCorp".to_string();
        assert!(contact.matches("ALI"));
        assert!(contact.matches("techc"));
        assert!(contact.matches(""));
        assert!(!contact.matches("logistics"));
    }
}
