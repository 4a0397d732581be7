use crate::consts::{CONTACTS_FALLBACK_LINK, PHONE_SUFFIX_LEN};
use crate::db_types::{ContactRow, NewActivity, NewCallLog, NewNotification};
use crate::error::AppError;
use crate::quo_types::{CallDirection, CallObject, EventKind, WebhookPayload};
use crate::store::CrmStore;
use crate::utils::{display_name, last_digits, parse_provider_timestamp};

use tracing::{debug, error, info};
use uuid::Uuid;

/// CRM linkage resolved for a call by phone-number matching.  Everything
/// staying `None` is a normal outcome, not an error: the call log simply
/// keeps null foreign keys.
#[derive(Default)]
struct CrmLinkage {
    contact: Option<ContactRow>,
    opportunity_id: Option<Uuid>,
    account_id: Option<Uuid>,
}

/// Processes one webhook delivery end to end: classify the event, resolve
/// CRM linkage, upsert the call log, then run the side effects.  Store
/// failures along the way are logged and isolated; the caller still
/// acknowledges the delivery.
pub async fn process_event(
    store: &dyn CrmStore,
    payload: &WebhookPayload,
) -> Result<(), AppError> {
    let object = match payload.call_object() {
        Some(object) => object,
        None => {
            debug!(event_type = %payload.event_type, "delivery without call object, acknowledging");
            return Ok(());
        }
    };

    let kind = payload.kind();
    match kind {
        EventKind::SummaryCompleted => return apply_summary(store, object).await,
        EventKind::TranscriptCompleted => return apply_transcript(store, object).await,
        _ => {}
    }

    let quo_call_id = match object.id.as_deref() {
        Some(id) => id,
        None => {
            debug!(event_type = %payload.event_type, "call object without id, acknowledging");
            return Ok(());
        }
    };

    let linkage = resolve_linkage(store, object).await;

    let call = NewCallLog {
        quo_call_id: quo_call_id.to_string(),
        direction: object.direction,
        status: kind.status(),
        duration: object.duration,
        phone_number: object.participants.first().cloned(),
        participants: object.participants.clone(),
        contact_id: linkage.contact.as_ref().map(|c| c.id),
        opportunity_id: linkage.opportunity_id,
        account_id: linkage.account_id,
        ringing_at: parse_provider_timestamp(object.ringing_at.as_deref()),
        answered_at: parse_provider_timestamp(object.answered_at.as_deref()),
        completed_at: parse_provider_timestamp(object.completed_at.as_deref()),
    };
    if let Err(e) = store.upsert_call_log(&call).await {
        // Logged but not escalated; the provider gets its 200 regardless.
        error!(error = %e, quo_call_id, "failed to upsert call log");
    } else {
        info!(quo_call_id, status = call.status.as_str(), "stored call log");
    }

    match kind {
        EventKind::Completed => {
            if let Some(opportunity_id) = linkage.opportunity_id {
                record_call_activity(store, opportunity_id, &call).await;
            }
        }
        EventKind::Ringing => {
            if object.direction == Some(CallDirection::Incoming) {
                notify_inbound_ringing(store, &linkage, object).await;
            }
        }
        _ => {}
    }

    Ok(())
}

/// First participant -> canonical digit suffix -> contact -> account and
/// latest opportunity.  Lookup failures degrade to no-match.
async fn resolve_linkage(store: &dyn CrmStore, object: &CallObject) -> CrmLinkage {
    let raw = match object.participants.first() {
        Some(p) if !p.trim().is_empty() => p.trim(),
        _ => return CrmLinkage::default(),
    };
    let digits = last_digits(raw, PHONE_SUFFIX_LEN);
    // An all-punctuation participant would leave an empty pattern that
    // ILIKEs every contact; fall back to the raw string instead.
    let digits = if digits.is_empty() { raw.to_string() } else { digits };

    let contact = match store.find_contact_by_phone(raw, &digits).await {
        Ok(contact) => contact,
        Err(e) => {
            error!(error = %e, phone = raw, "contact lookup failed, treating as no match");
            None
        }
    };

    let mut linkage = CrmLinkage::default();
    if let Some(contact) = contact {
        linkage.account_id = contact.account_id;
        match store.latest_opportunity_for_contact(contact.id).await {
            Ok(opportunity_id) => linkage.opportunity_id = opportunity_id,
            Err(e) => {
                error!(error = %e, contact_id = %contact.id, "opportunity lookup failed")
            }
        }
        linkage.contact = Some(contact);
    }
    linkage
}

async fn apply_summary(store: &dyn CrmStore, object: &CallObject) -> Result<(), AppError> {
    let call_id = match object.call_id.as_deref() {
        Some(id) => id,
        None => {
            debug!("summary event without callId, acknowledging");
            return Ok(());
        }
    };
    let summary = object.summary.clone().unwrap_or_default();
    let next_steps = object.next_steps.clone().unwrap_or_default();
    match store.set_call_summary(call_id, &summary, &next_steps).await {
        Ok(0) => debug!(call_id, "summary for unknown call id, nothing updated"),
        Ok(_) => info!(call_id, "stored call summary"),
        Err(e) => error!(error = %e, call_id, "failed to store call summary"),
    }
    Ok(())
}

async fn apply_transcript(store: &dyn CrmStore, object: &CallObject) -> Result<(), AppError> {
    let call_id = match object.call_id.as_deref() {
        Some(id) => id,
        None => {
            debug!("transcript event without callId, acknowledging");
            return Ok(());
        }
    };
    let dialogue = object.dialogue.clone().unwrap_or_default();
    match store.set_call_transcript(call_id, &dialogue).await {
        Ok(0) => debug!(call_id, "transcript for unknown call id, nothing updated"),
        Ok(_) => info!(call_id, "stored call transcript"),
        Err(e) => error!(error = %e, call_id, "failed to store call transcript"),
    }
    Ok(())
}

/// Completed call on a known opportunity: append one activity row with the
/// direction and the duration in minutes, rounded.
async fn record_call_activity(store: &dyn CrmStore, opportunity_id: Uuid, call: &NewCallLog) {
    let minutes = (call.duration.unwrap_or(0) as f64 / 60.0).round() as i64;
    let direction = call.direction.unwrap_or(CallDirection::Unknown);
    let activity = NewActivity {
        opportunity_id,
        activity_type: "call".to_string(),
        description: format!("{} call ({} min)", direction.label(), minutes),
    };
    if let Err(e) = store.insert_activity(&activity).await {
        error!(error = %e, %opportunity_id, "failed to record call activity");
    }
}

/// Inbound ringing: one notification per user profile, linking to the
/// matched opportunity when known, else the generic contacts view.
async fn notify_inbound_ringing(store: &dyn CrmStore, linkage: &CrmLinkage, object: &CallObject) {
    let caller = display_name(
        linkage.contact.as_ref(),
        object.participants.first().map(String::as_str),
    );
    let link = match linkage.opportunity_id {
        Some(id) => format!("/opportunities/{id}"),
        None => CONTACTS_FALLBACK_LINK.to_string(),
    };

    let profile_ids = match store.profile_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "failed to list profiles for notification fan-out");
            return;
        }
    };
    let notifications: Vec<NewNotification> = profile_ids
        .into_iter()
        .map(|profile_id| NewNotification {
            profile_id,
            title: "Incoming call".to_string(),
            body: format!("Incoming call from {caller}"),
            link: link.clone(),
        })
        .collect();
    if notifications.is_empty() {
        return;
    }
    let count = notifications.len();
    if let Err(e) = store.insert_notifications(&notifications).await {
        error!(error = %e, count, "failed to insert ringing notifications");
    } else {
        debug!(count, caller = %caller, "fanned out ringing notifications");
    }
}
