//! Common validation utilities.
//!
//! Participant e-mails are the only key a tracker row has, so every
//! comparison goes through [`normalize_email`].

use std::collections::HashSet;

use validator::{ValidateEmail, ValidationError};

/// Maximum number of e-mails accepted in one membership change.
pub const MAX_EMAILS_PER_CHANGE: usize = 1000;

/// Canonical form of an e-mail address: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns true if both addresses normalise to the same value.
pub fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Validates a single e-mail address.
pub fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    if email.trim().validate_email() {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_invalid");
        err.message = Some(format!("Invalid e-mail address: {}", email).into());
        Err(err)
    }
}

/// Validates a list of e-mail addresses.
pub fn validate_email_list(emails: &[String]) -> Result<(), ValidationError> {
    if emails.len() > MAX_EMAILS_PER_CHANGE {
        let mut err = ValidationError::new("email_list_too_long");
        err.message =
            Some(format!("At most {} e-mails per request", MAX_EMAILS_PER_CHANGE).into());
        return Err(err);
    }
    emails.iter().try_for_each(|e| validate_email_address(e))
}

/// Normalises and de-duplicates e-mails, keeping first-seen order.
pub fn dedupe_emails<'a, I>(emails: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    emails
        .into_iter()
        .map(|e| normalize_email(e))
        .filter(|e| !e.is_empty() && seen.insert(e.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
        assert_eq!(normalize_email("b@x.com"), "b@x.com");
    }

    #[test]
    fn test_same_email_ignores_case_and_whitespace() {
        assert!(same_email("A@x.com", " a@X.COM"));
        assert!(!same_email("a@x.com", "b@x.com"));
    }

    #[test]
    fn test_validate_email_address() {
        assert!(validate_email_address("a@x.com").is_ok());
        assert!(validate_email_address(" a@x.com ").is_ok());
        assert!(validate_email_address("not-an-email").is_err());
        assert!(validate_email_address("").is_err());
    }

    #[test]
    fn test_validate_email_address_accepts_generated() {
        for _ in 0..20 {
            let email: String = SafeEmail().fake();
            assert!(validate_email_address(&email).is_ok(), "{}", email);
        }
    }

    #[test]
    fn test_validate_email_list_reports_bad_entry() {
        let list = vec!["a@x.com".to_string(), "oops".to_string()];
        let err = validate_email_list(&list).unwrap_err();
        assert_eq!(err.code, "email_invalid");
    }

    #[test]
    fn test_validate_email_list_too_long() {
        let list = vec!["a@x.com".to_string(); MAX_EMAILS_PER_CHANGE + 1];
        let err = validate_email_list(&list).unwrap_err();
        assert_eq!(err.code, "email_list_too_long");
    }

    #[test]
    fn test_dedupe_emails_keeps_first_order() {
        let input = vec![
            "B@x.com".to_string(),
            "a@x.com".to_string(),
            "b@X.com".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(dedupe_emails(&input), vec!["b@x.com", "a@x.com"]);
    }
}
