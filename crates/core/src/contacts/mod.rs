//! Contacts: model, creation defaults and lookup helpers.

mod contacts_model;

pub use contacts_model::*;

/// Contacts whose name or company contains `term`, in collection order.
pub fn search_contacts<'a>(contacts: &'a [Contact], term: &str) -> Vec<&'a Contact> {
    contacts.iter().filter(|c| c.matches(term)).collect()
}

/// Resolves a deal's contact reference, tolerating dangling or absent ids.
pub fn resolve_contact(contacts: &[Contact], contact_id: Option<&str>) -> Contact {
    match contact_id {
        Some(id) => contacts
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap_or_else(|| Contact::placeholder(id)),
        None => Contact::placeholder(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Entity;

    #[test]
    fn search_filters_seed_contacts() {
        let contacts = Contact::seed();
        let hits = search_contacts(&contacts, "flow");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "c3");
    }

    #[test]
    fn dangling_reference_resolves_to_placeholder() {
        let contacts = Contact::seed();
        assert_eq!(resolve_contact(&contacts, Some("c2")).name, "Bob Smith");

        let missing = resolve_contact(&contacts, Some("c404"));
        assert_eq!(missing.id, "c404");
        assert_eq!(missing.name, UNKNOWN_CONTACT_NAME);

        assert_eq!(resolve_contact(&contacts, None).name, UNKNOWN_CONTACT_NAME);
    }
}
