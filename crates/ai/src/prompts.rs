use boracrm_core::contacts::Contact;
use boracrm_core::deals::Deal;

pub const COMPANY_NAME: &str = "Bora Soluções Esportivas";

pub fn email_prompt(contact: &Contact, deal: Option<&Deal>, intent: &str) -> String {
    let context = match deal {
        Some(deal) => format!(
            "Regarding deal \"{}\" valued at R${}. Stage: {}.",
            deal.title, deal.value, deal.stage
        ),
        None => "General networking.".to_string(),
    };
    format!(
        "You are an expert sales assistant at \"{company}\". Write a professional, concise email in Portuguese (Brazil).\n\n\
         To: {name} ({role} at {contact_company})\n\
         Context: {context}\n\
         User Intent: {intent}\n\n\
         Return the response in JSON format with \"subject\" and \"body\" fields.\n\
         The body should be plain text, ready to send.",
        company = COMPANY_NAME,
        name = contact.name,
        role = contact.role,
        contact_company = contact.company,
        context = context,
        intent = intent,
    )
}

pub fn analysis_prompt(deal: &Deal, contact: &Contact, notes: &str) -> String {
    format!(
        "Analyze the following sales deal for {company} and provide strategic insights.\n\
         Output language: Portuguese (Brazil).\n\n\
         Deal: {title} (R${value})\n\
         Stage: {stage}\n\
         Contact: {name} from {contact_company}\n\
         Recent Notes/Interaction History: \"{notes}\"\n\n\
         Provide:\n\
         1. Sentiment (Positive, Neutral, Negative)\n\
         2. Risk Score (0-100, where 100 is high risk of losing)\n\
         3. A brief 1-sentence summary of the status.\n\
         4. Three concrete next steps to move the deal forward.",
        company = COMPANY_NAME,
        title = deal.title,
        value = deal.value,
        stage = deal.stage,
        name = contact.name,
        contact_company = contact.company,
        notes = notes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use boracrm_core::Entity;

    #[test]
    fn email_prompt_mentions_deal_context() {
        let contacts = Contact::seed();
        let contact = &contacts[0];
        let deals = Deal::seed();
        let deal = &deals[0];
        let prompt = email_prompt(contact, Some(deal), "Follow up on the proposal");
        assert!(prompt.contains("Enterprise License Q4"));
        assert!(prompt.contains("Stage: Negotiation"));
        assert!(prompt.contains("CTO at TechCorp Solutions"));

        let prompt = email_prompt(contact, None, "Say hello");
        assert!(prompt.contains("General networking."));
    }
}
