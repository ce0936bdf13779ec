//! Party contact rules used by opportunities.
//!
//! A party is the contact (person or organisation) an opportunity is
//! tracked against. Opportunities borrow the party's name and contact
//! details as defaults, and may only point at one of the party's own
//! addresses.

use crate::error::CoreError;
use crate::types::DbId;

/// The contact details of a party that feed opportunity defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartyContact<'a> {
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
}

/// Build the comment lines offered for a party: `Tel: ...` then `Mail: ...`.
///
/// Blank phone or email values are skipped. Returns an empty string when
/// the party has neither.
pub fn contact_comment(contact: &PartyContact<'_>) -> String {
    let mut lines = Vec::with_capacity(2);
    if let Some(phone) = contact.phone.filter(|p| !p.trim().is_empty()) {
        lines.push(format!("Tel: {phone}"));
    }
    if let Some(email) = contact.email.filter(|e| !e.trim().is_empty()) {
        lines.push(format!("Mail: {email}"));
    }
    lines.join("\n")
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Fill an empty description and comment from the party.
///
/// Non-empty values are never overwritten. A party with neither phone nor
/// email leaves the comment as it was.
pub fn apply_party_defaults(
    description: &mut Option<String>,
    comment: &mut Option<String>,
    contact: &PartyContact<'_>,
) {
    if is_blank(description) {
        *description = Some(contact.name.to_string());
    }
    if is_blank(comment) {
        let lines = contact_comment(contact);
        if !lines.is_empty() {
            *comment = Some(lines);
        }
    }
}

/// Reject an address that belongs to a different party than the opportunity.
pub fn validate_address_owner(
    address_id: DbId,
    address_party_id: DbId,
    party_id: DbId,
) -> Result<(), CoreError> {
    if address_party_id == party_id {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Address {address_id} belongs to party {address_party_id}, not party {party_id}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact<'a>(phone: Option<&'a str>, email: Option<&'a str>) -> PartyContact<'a> {
        PartyContact {
            name: "Acme Training",
            phone,
            email,
        }
    }

    #[test]
    fn comment_with_phone_only() {
        assert_eq!(contact_comment(&contact(Some("555-1234"), None)), "Tel: 555-1234");
    }

    #[test]
    fn comment_with_phone_and_email() {
        assert_eq!(
            contact_comment(&contact(Some("555-1234"), Some("info@acme.test"))),
            "Tel: 555-1234\nMail: info@acme.test"
        );
    }

    #[test]
    fn comment_skips_blank_values() {
        assert_eq!(contact_comment(&contact(Some(" "), None)), "");
        assert_eq!(
            contact_comment(&contact(None, Some("info@acme.test"))),
            "Mail: info@acme.test"
        );
    }

    #[test]
    fn defaults_fill_empty_fields() {
        let mut description = None;
        let mut comment = Some(String::new());
        apply_party_defaults(&mut description, &mut comment, &contact(Some("555-1234"), None));
        assert_eq!(description.as_deref(), Some("Acme Training"));
        assert_eq!(comment.as_deref(), Some("Tel: 555-1234"));
    }

    #[test]
    fn defaults_keep_existing_values() {
        let mut description = Some("Spring workshop".to_string());
        let mut comment = Some("Call after 5pm".to_string());
        apply_party_defaults(&mut description, &mut comment, &contact(Some("555-1234"), None));
        assert_eq!(description.as_deref(), Some("Spring workshop"));
        assert_eq!(comment.as_deref(), Some("Call after 5pm"));
    }

    #[test]
    fn party_without_contact_details_leaves_comment_unset() {
        let mut description = None;
        let mut comment = None;
        apply_party_defaults(&mut description, &mut comment, &contact(None, None));
        assert_eq!(description.as_deref(), Some("Acme Training"));
        assert_eq!(comment, None);
    }

    #[test]
    fn address_of_other_party_is_rejected() {
        assert!(validate_address_owner(10, 1, 1).is_ok());
        let err = validate_address_owner(10, 2, 1).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
