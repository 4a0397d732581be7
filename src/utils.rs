use crate::consts::UNKNOWN_CALLER;
use crate::db_types::ContactRow;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

/// Strips everything but ASCII digits and keeps at most the trailing `n`.
/// `"+1 (555) 867-5309"` canonicalizes to `"5558675309"` with `n = 10`.
pub fn last_digits(phone: &str, n: usize) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > n {
        // All ASCII, so byte indexing is safe.
        digits[digits.len() - n..].to_string()
    } else {
        digits
    }
}

/// Display name for an inbound caller: contact full name when matched,
/// else the raw participant string, else "Unknown".
pub fn display_name(contact: Option<&ContactRow>, participant: Option<&str>) -> String {
    if let Some(name) = contact.and_then(ContactRow::full_name) {
        return name;
    }
    match participant {
        Some(p) if !p.trim().is_empty() => p.trim().to_string(),
        _ => UNKNOWN_CALLER.to_string(),
    }
}

/// Best-effort parse of the provider's RFC3339 timestamps.  An unparseable
/// value is logged and dropped, never failing ingestion.
pub fn parse_provider_timestamp(ts: Option<&str>) -> Option<OffsetDateTime> {
    let ts = ts?;
    match OffsetDateTime::parse(ts, &Rfc3339) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(error = %e, ts, "unparseable provider timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn last_digits_strips_formatting() {
        assert_eq!(last_digits("+1 (555) 867-5309", 10), "5558675309");
        assert_eq!(last_digits("555-1234", 10), "5551234");
        assert_eq!(last_digits("ext. 42", 10), "42");
        assert_eq!(last_digits("no digits here", 10), "");
    }

    #[test]
    fn last_digits_keeps_only_the_suffix() {
        assert_eq!(last_digits("0015558675309", 10), "5558675309");
    }

    #[test]
    fn display_name_prefers_contact_name() {
        let contact = ContactRow {
            id: Uuid::new_v4(),
            account_id: None,
            first_name: Some("Dana".to_string()),
            last_name: Some("Reyes".to_string()),
            phone: Some("5558675309".to_string()),
        };
        assert_eq!(display_name(Some(&contact), Some("+15558675309")), "Dana Reyes");
    }

    #[test]
    fn display_name_falls_back_to_participant_then_unknown() {
        assert_eq!(display_name(None, Some("+15558675309")), "+15558675309");
        assert_eq!(display_name(None, Some("   ")), "Unknown");
        assert_eq!(display_name(None, None), "Unknown");
    }

    #[test]
    fn provider_timestamps_parse_best_effort() {
        assert!(parse_provider_timestamp(Some("2025-08-01T12:00:05Z")).is_some());
        assert!(parse_provider_timestamp(Some("yesterday-ish")).is_none());
        assert!(parse_provider_timestamp(None).is_none());
    }
}
