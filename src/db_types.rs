use crate::quo_types::CallDirection;

use sqlx::types::time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Ringing,
    Completed,
    Recorded,
    Unknown,
}

impl CallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ringing => "ringing",
            Self::Completed => "completed",
            Self::Recorded => "recorded",
            Self::Unknown => "unknown",
        }
    }
}

/// Call-log contents derived from one webhook delivery.  Every `None` is
/// persisted as NULL; a redelivery for the same provider call id replaces
/// the previous row contents rather than patching them.
#[derive(Debug, Clone)]
pub struct NewCallLog {
    pub quo_call_id: String,
    pub direction: Option<CallDirection>,
    pub status: CallStatus,
    pub duration: Option<i64>,
    pub phone_number: Option<String>,
    pub participants: Vec<String>,
    pub contact_id: Option<Uuid>,
    pub opportunity_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub ringing_at: Option<OffsetDateTime>,
    pub answered_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub account_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl ContactRow {
    /// "First Last" from whichever name parts exist.
    pub fn full_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub opportunity_id: Uuid,
    pub activity_type: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub profile_id: Uuid,
    pub title: String,
    pub body: String,
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: Option<&str>, last: Option<&str>) -> ContactRow {
        ContactRow {
            id: Uuid::new_v4(),
            account_id: None,
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            phone: None,
        }
    }

    #[test]
    fn full_name_joins_present_parts() {
        assert_eq!(
            contact(Some("Dana"), Some("Reyes")).full_name().as_deref(),
            Some("Dana Reyes")
        );
        assert_eq!(contact(Some("Dana"), None).full_name().as_deref(), Some("Dana"));
        assert_eq!(contact(None, Some("Reyes")).full_name().as_deref(), Some("Reyes"));
    }

    #[test]
    fn full_name_ignores_blank_parts() {
        assert_eq!(contact(Some("  "), Some("")).full_name(), None);
        assert_eq!(contact(None, None).full_name(), None);
    }
}
