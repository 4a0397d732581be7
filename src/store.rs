use crate::db_types::{ContactRow, NewActivity, NewCallLog, NewNotification};
use crate::error::AppError;
use crate::quo_types::DialogueSegment;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Persistence seam over the CRM tables this service touches.
/// Implementations must be shareable across request handlers.
#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Insert-or-update keyed by the provider call id, so redelivery of the
    /// same event never creates a second row.
    async fn upsert_call_log(&self, call: &NewCallLog) -> Result<(), AppError>;

    /// Case-insensitive partial match of stored contact phones against both
    /// the raw participant string and its last-10-digit canonical form.
    /// Ties break to the most recently updated contact.
    async fn find_contact_by_phone(
        &self,
        raw: &str,
        digits: &str,
    ) -> Result<Option<ContactRow>, AppError>;

    /// Most recently updated opportunity attached to the contact, if any.
    async fn latest_opportunity_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>;

    async fn insert_activity(&self, activity: &NewActivity) -> Result<(), AppError>;

    /// Ids of every user profile, for notification fan-out.
    async fn profile_ids(&self) -> Result<Vec<Uuid>, AppError>;

    /// Single batch insert, one row per recipient.
    async fn insert_notifications(
        &self,
        notifications: &[NewNotification],
    ) -> Result<(), AppError>;

    /// Returns the number of rows updated; zero when the call id is unknown.
    async fn set_call_summary(
        &self,
        quo_call_id: &str,
        summary: &[String],
        next_steps: &[String],
    ) -> Result<u64, AppError>;

    /// Returns the number of rows updated; zero when the call id is unknown.
    async fn set_call_transcript(
        &self,
        quo_call_id: &str,
        dialogue: &[DialogueSegment],
    ) -> Result<u64, AppError>;
}

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrmStore for PgStore {
    async fn upsert_call_log(&self, call: &NewCallLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO call_logs
                (quo_call_id, direction, status, duration, phone_number, participants,
                 contact_id, opportunity_id, account_id, ringing_at, answered_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (quo_call_id) DO UPDATE SET
                direction = EXCLUDED.direction,
                status = EXCLUDED.status,
                duration = EXCLUDED.duration,
                phone_number = EXCLUDED.phone_number,
                participants = EXCLUDED.participants,
                contact_id = EXCLUDED.contact_id,
                opportunity_id = EXCLUDED.opportunity_id,
                account_id = EXCLUDED.account_id,
                ringing_at = EXCLUDED.ringing_at,
                answered_at = EXCLUDED.answered_at,
                completed_at = EXCLUDED.completed_at,
                updated_at = now()
            "#,
        )
        .bind(&call.quo_call_id)
        .bind(call.direction.map(|d| d.as_str()))
        .bind(call.status.as_str())
        .bind(call.duration)
        .bind(&call.phone_number)
        .bind(&call.participants)
        .bind(call.contact_id)
        .bind(call.opportunity_id)
        .bind(call.account_id)
        .bind(call.ringing_at)
        .bind(call.answered_at)
        .bind(call.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_contact_by_phone(
        &self,
        raw: &str,
        digits: &str,
    ) -> Result<Option<ContactRow>, AppError> {
        let contact = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT id, account_id, first_name, last_name, phone
            FROM contacts
            WHERE phone ILIKE '%' || $1 || '%' OR phone ILIKE '%' || $2 || '%'
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(raw)
        .bind(digits)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn latest_opportunity_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM opportunities
            WHERE contact_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(contact_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_activity(&self, activity: &NewActivity) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO activities (opportunity_id, activity_type, description) VALUES ($1, $2, $3)",
        )
        .bind(activity.opportunity_id)
        .bind(&activity.activity_type)
        .bind(&activity.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn profile_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM profiles")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn insert_notifications(
        &self,
        notifications: &[NewNotification],
    ) -> Result<(), AppError> {
        if notifications.is_empty() {
            return Ok(());
        }
        let mut profile_ids = Vec::with_capacity(notifications.len());
        let mut titles = Vec::with_capacity(notifications.len());
        let mut bodies = Vec::with_capacity(notifications.len());
        let mut links = Vec::with_capacity(notifications.len());
        for n in notifications {
            profile_ids.push(n.profile_id);
            titles.push(n.title.clone());
            bodies.push(n.body.clone());
            links.push(n.link.clone());
        }
        sqlx::query(
            r#"
            INSERT INTO notifications (profile_id, title, body, link)
            SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::text[])
            "#,
        )
        .bind(profile_ids)
        .bind(titles)
        .bind(bodies)
        .bind(links)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_call_summary(
        &self,
        quo_call_id: &str,
        summary: &[String],
        next_steps: &[String],
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE call_logs
            SET summary = $2, next_steps = $3, updated_at = now()
            WHERE quo_call_id = $1
            "#,
        )
        .bind(quo_call_id)
        .bind(summary.to_vec())
        .bind(next_steps.to_vec())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn set_call_transcript(
        &self,
        quo_call_id: &str,
        dialogue: &[DialogueSegment],
    ) -> Result<u64, AppError> {
        let transcript = serde_json::to_value(dialogue)?;
        let result = sqlx::query(
            r#"
            UPDATE call_logs
            SET transcript = $2, updated_at = now()
            WHERE quo_call_id = $1
            "#,
        )
        .bind(quo_call_id)
        .bind(transcript)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
