//! Demo records returned when the local store holds nothing for a kind, so a
//! first run never shows an empty screen.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::contacts::Contact;
use crate::deals::{Deal, DealStage};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn seed_contact(
    id: &str,
    name: &str,
    email: &str,
    phone: &str,
    company: &str,
    role: &str,
    avatar: u32,
    last_contacted: NaiveDate,
    notes: &str,
) -> Contact {
    Contact {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        company: company.to_string(),
        role: role.to_string(),
        avatar_url: format!("https://picsum.photos/200/200?random={}", avatar),
        last_contacted,
        notes: notes.to_string(),
    }
}

pub fn seed_contacts() -> Vec<Contact> {
    vec![
        seed_contact(
            "c1",
            "Alice Freeman",
            "alice@techcorp.com",
            "+1 (555) 123-4567",
            "TechCorp Solutions",
            "CTO",
            1,
            date(2023, 10, 25),
            "Interested in AI integration. Budget cycle opens in Nov.",
        ),
        seed_contact(
            "c2",
            "Bob Smith",
            "bob.smith@logistics.io",
            "+1 (555) 987-6543",
            "Logistics IO",
            "VP of Operations",
            2,
            date(2023, 10, 20),
            "Skeptical about pricing. Needs ROI analysis.",
        ),
        seed_contact(
            "c3",
            "Catherine Wu",
            "c.wu@financeflow.net",
            "+1 (555) 456-7890",
            "FinanceFlow",
            "Director of IT",
            3,
            date(2023, 10, 28),
            "Very enthusiastic. Ready to sign pending legal review.",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn seed_deal(
    id: &str,
    title: &str,
    value: i64,
    stage: DealStage,
    contact_id: &str,
    probability: u8,
    expected_close_date: NaiveDate,
    tags: &[&str],
) -> Deal {
    Deal {
        id: id.to_string(),
        title: title.to_string(),
        value: Decimal::from(value),
        stage,
        contact_id: Some(contact_id.to_string()),
        company_name: None,
        probability,
        expected_close_date,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn seed_deals() -> Vec<Deal> {
    vec![
        seed_deal(
            "d1",
            "Enterprise License Q4",
            125_000,
            DealStage::Negotiation,
            "c1",
            75,
            date(2023, 11, 15),
            &["SaaS", "Enterprise"],
        ),
        seed_deal(
            "d2",
            "Fleet Management System",
            55_000,
            DealStage::Proposal,
            "c2",
            40,
            date(2023, 12, 1),
            &["IoT"],
        ),
        seed_deal(
            "d3",
            "Security Audit",
            15_000,
            DealStage::ClosedWon,
            "c3",
            100,
            date(2023, 10, 15),
            &["Consulting"],
        ),
        seed_deal(
            "d4",
            "Annual Maintenance",
            8_000,
            DealStage::Lead,
            "c2",
            10,
            date(2024, 1, 15),
            &["Renewal"],
        ),
    ]
}
