use log::info;
use serde::{Deserialize, Serialize};

use boracrm_core::contacts::Contact;
use boracrm_core::deals::{Deal, DealStage};

use crate::client::GeminiClient;
use crate::error::Result;
use crate::prompts::COMPANY_NAME;
use crate::types::{DealAnalysis, EmailDraft, Sentiment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    Live,
    /// No credential: answers are simulated from the inputs.
    Demo,
}

/// Entry point for the sales assistant, live when a credential is configured.
#[derive(Debug, Clone)]
pub struct AssistantService {
    client: Option<GeminiClient>,
}

impl AssistantService {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        match GeminiClient::new(api_key) {
            Ok(client) => Ok(Self::live(client)),
            Err(crate::AiError::ConfigurationMissing) => {
                info!("No AI credential configured, assistant running in demo mode");
                Ok(Self::demo())
            }
            Err(err) => Err(err),
        }
    }

    pub fn live(client: GeminiClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn demo() -> Self {
        Self { client: None }
    }

    pub fn mode(&self) -> AssistantMode {
        if self.client.is_some() {
            AssistantMode::Live
        } else {
            AssistantMode::Demo
        }
    }

    pub async fn draft_email(
        &self,
        contact: &Contact,
        deal: Option<&Deal>,
        intent: &str,
    ) -> Result<EmailDraft> {
        match &self.client {
            Some(client) => client.draft_email(contact, deal, intent).await,
            None => Ok(simulated_email(contact, deal, intent)),
        }
    }

    pub async fn analyze_deal(
        &self,
        deal: &Deal,
        contact: &Contact,
        notes: &str,
    ) -> Result<DealAnalysis> {
        match &self.client {
            Some(client) => client.analyze_deal(deal, contact, notes).await,
            None => Ok(simulated_analysis(deal, contact, notes)),
        }
    }
}

fn first_name(contact: &Contact) -> &str {
    contact.name.split_whitespace().next().unwrap_or(&contact.name)
}

fn simulated_email(contact: &Contact, deal: Option<&Deal>, intent: &str) -> EmailDraft {
    let subject = match deal {
        Some(deal) => format!("{} | {}", deal.title, COMPANY_NAME),
        None => format!("Contato | {}", COMPANY_NAME),
    };
    let context = match deal {
        Some(deal) => format!(
            "Gostaria de dar continuidade à nossa conversa sobre \"{}\" (etapa atual: {}).",
            deal.title, deal.stage
        ),
        None => "Gostaria de manter contato e entender melhor as necessidades da sua equipe."
            .to_string(),
    };
    let intent = intent.trim();
    let body = format!(
        "Olá {},\n\n{}\n\n{}\n\nFico à disposição.\n\nAtenciosamente,\nEquipe {}\n\n[Rascunho simulado: configure API_KEY para gerar textos com IA.]",
        first_name(contact),
        context,
        if intent.is_empty() { "Podemos agendar uma conversa rápida esta semana?" } else { intent },
        COMPANY_NAME
    );
    EmailDraft { subject, body }
}

fn simulated_analysis(deal: &Deal, contact: &Contact, notes: &str) -> DealAnalysis {
    let risk_score = match deal.stage {
        DealStage::ClosedWon => 0,
        DealStage::ClosedLost => 100,
        _ => 100u8.saturating_sub(deal.probability.min(100)),
    };
    let sentiment = match risk_score {
        0..=39 => Sentiment::Positive,
        40..=69 => Sentiment::Neutral,
        _ => Sentiment::Negative,
    };
    let notes_hint = if notes.trim().is_empty() {
        "sem anotações recentes".to_string()
    } else {
        format!("{} caracteres de anotações analisados", notes.trim().chars().count())
    };
    DealAnalysis {
        sentiment,
        risk_score,
        summary: format!(
            "Análise simulada: \"{}\" com {} está em {} ({}).",
            deal.title, contact.name, deal.stage, notes_hint
        ),
        next_steps: vec![
            format!("Agendar uma reunião de alinhamento com {}", first_name(contact)),
            format!("Revisar a proposta de R${} com base no feedback recebido", deal.value),
            "Definir uma data de decisão e os responsáveis pela aprovação".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boracrm_core::Entity;

    #[test]
    fn missing_key_selects_demo_mode() {
        let service = AssistantService::new(None).unwrap();
        assert_eq!(service.mode(), AssistantMode::Demo);
        let service = AssistantService::new(Some("key".to_string())).unwrap();
        assert_eq!(service.mode(), AssistantMode::Live);
    }

    #[test]
    fn simulated_email_is_deterministic_and_personal() {
        let contacts = Contact::seed();
        let contact = &contacts[1];
        let deals = Deal::seed();
        let deal = &deals[1];
        let first = simulated_email(contact, Some(deal), "Enviar análise de ROI");
        let second = simulated_email(contact, Some(deal), "Enviar análise de ROI");
        assert_eq!(first, second);
        assert!(first.subject.contains("Fleet Management System"));
        assert!(first.body.starts_with("Olá Bob,"));
        assert!(first.body.contains("Enviar análise de ROI"));
    }

    #[test]
    fn simulated_risk_tracks_probability() {
        let contacts = Contact::seed();
        let contact = &contacts[0];
        let deals = Deal::seed();

        let negotiation = simulated_analysis(&deals[0], contact, "");
        assert_eq!(negotiation.risk_score, 25);
        assert_eq!(negotiation.sentiment, Sentiment::Positive);

        let lead = simulated_analysis(&deals[3], contact, "cold");
        assert_eq!(lead.risk_score, 90);
        assert_eq!(lead.sentiment, Sentiment::Negative);
        assert_eq!(lead.next_steps.len(), 3);

        let won = simulated_analysis(&deals[2], contact, "");
        assert_eq!(won.risk_score, 0);
    }
}
