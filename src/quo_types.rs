mod event {
    use crate::db_types::CallStatus;

    use serde::{Deserialize, Serialize};

    /// Envelope for every Quo webhook delivery.  Heartbeat and test
    /// deliveries arrive with `data` or `data.object` absent.
    #[derive(Deserialize, Debug)]
    pub struct WebhookPayload {
        #[serde(rename = "type")]
        pub event_type: String,
        #[serde(default)]
        pub data: Option<EventData>,
    }

    impl WebhookPayload {
        pub fn kind(&self) -> EventKind {
            EventKind::from_type(&self.event_type)
        }

        pub fn call_object(&self) -> Option<&CallObject> {
            self.data.as_ref().and_then(|d| d.object.as_ref())
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct EventData {
        #[serde(default)]
        pub object: Option<CallObject>,
    }

    /// Superset of the per-event `data.object` shapes.  Call lifecycle
    /// events carry `id`, `direction` and `participants`; summary and
    /// transcript events reference an earlier call through `callId`.
    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CallObject {
        pub id: Option<String>,
        pub call_id: Option<String>,
        pub direction: Option<CallDirection>,
        /// Call duration in seconds.
        pub duration: Option<i64>,
        pub participants: Vec<String>,
        pub phone_number_id: Option<String>,
        pub ringing_at: Option<String>,
        pub answered_at: Option<String>,
        pub completed_at: Option<String>,
        pub summary: Option<Vec<String>>,
        pub next_steps: Option<Vec<String>>,
        pub dialogue: Option<Vec<DialogueSegment>>,
    }

    /// One utterance of a call transcript.
    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct DialogueSegment {
        pub content: String,
        #[serde(default)]
        pub identifier: Option<String>,
        #[serde(default)]
        pub user_id: Option<String>,
        #[serde(default)]
        pub start: Option<f64>,
        #[serde(default)]
        pub end: Option<f64>,
    }

    #[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum CallDirection {
        Incoming,
        Outgoing,
        #[serde(other)]
        Unknown,
    }

    impl CallDirection {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Incoming => "incoming",
                Self::Outgoing => "outgoing",
                Self::Unknown => "unknown",
            }
        }

        /// Human-facing label used in activity descriptions.
        pub fn label(self) -> &'static str {
            match self {
                Self::Incoming => "Incoming",
                Self::Outgoing => "Outgoing",
                Self::Unknown => "Unknown",
            }
        }
    }

    /// Canonical internal event kind.  The provider has renamed its event
    /// types over time, so both the current dotted names and the legacy
    /// camelCase ones are normalized here, at the boundary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EventKind {
        Ringing,
        Completed,
        RecordingCompleted,
        SummaryCompleted,
        TranscriptCompleted,
        Other,
    }

    impl EventKind {
        pub fn from_type(event_type: &str) -> Self {
            match event_type {
                "call.ringing" => Self::Ringing,
                "call.completed" => Self::Completed,
                "call.recording.completed" => Self::RecordingCompleted,
                "call.summary.completed" | "callSummary" => Self::SummaryCompleted,
                "call.transcript.completed" | "callTranscript" => Self::TranscriptCompleted,
                _ => Self::Other,
            }
        }

        pub fn status(self) -> CallStatus {
            match self {
                Self::Ringing => CallStatus::Ringing,
                Self::Completed => CallStatus::Completed,
                Self::RecordingCompleted => CallStatus::Recorded,
                _ => CallStatus::Unknown,
            }
        }
    }
}
pub use event::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_types::CallStatus;

    #[test]
    fn event_kind_normalizes_current_and_legacy_names() {
        assert_eq!(EventKind::from_type("call.ringing"), EventKind::Ringing);
        assert_eq!(EventKind::from_type("call.completed"), EventKind::Completed);
        assert_eq!(
            EventKind::from_type("call.recording.completed"),
            EventKind::RecordingCompleted
        );
        assert_eq!(
            EventKind::from_type("call.summary.completed"),
            EventKind::SummaryCompleted
        );
        assert_eq!(EventKind::from_type("callSummary"), EventKind::SummaryCompleted);
        assert_eq!(
            EventKind::from_type("call.transcript.completed"),
            EventKind::TranscriptCompleted
        );
        assert_eq!(
            EventKind::from_type("callTranscript"),
            EventKind::TranscriptCompleted
        );
        assert_eq!(EventKind::from_type("call.updated"), EventKind::Other);
    }

    #[test]
    fn status_mapping_falls_back_to_unknown() {
        assert_eq!(EventKind::Ringing.status(), CallStatus::Ringing);
        assert_eq!(EventKind::Completed.status(), CallStatus::Completed);
        assert_eq!(EventKind::RecordingCompleted.status(), CallStatus::Recorded);
        assert_eq!(EventKind::Other.status(), CallStatus::Unknown);
        assert_eq!(EventKind::SummaryCompleted.status(), CallStatus::Unknown);
    }

    #[test]
    fn deserializes_lifecycle_payload() {
        let json = r#"{
            "type": "call.completed",
            "data": {
                "object": {
                    "id": "AC123",
                    "direction": "incoming",
                    "duration": 125,
                    "participants": ["+15558675309"],
                    "phoneNumberId": "PN9",
                    "answeredAt": "2025-08-01T12:00:05Z",
                    "completedAt": "2025-08-01T12:02:10Z"
                }
            }
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.kind(), EventKind::Completed);
        let object = payload.call_object().unwrap();
        assert_eq!(object.id.as_deref(), Some("AC123"));
        assert_eq!(object.direction, Some(CallDirection::Incoming));
        assert_eq!(object.duration, Some(125));
        assert_eq!(object.participants, vec!["+15558675309".to_string()]);
    }

    #[test]
    fn deserializes_payload_without_object() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"type": "ping", "data": {}}"#).unwrap();
        assert!(payload.call_object().is_none());

        let payload: WebhookPayload = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(payload.call_object().is_none());
    }

    #[test]
    fn unrecognized_direction_becomes_unknown() {
        let json = r#"{
            "type": "call.ringing",
            "data": { "object": { "id": "c1", "direction": "conference" } }
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        let object = payload.call_object().unwrap();
        assert_eq!(object.direction, Some(CallDirection::Unknown));
    }

    #[test]
    fn deserializes_transcript_dialogue() {
        let json = r#"{
            "type": "callTranscript",
            "data": {
                "object": {
                    "callId": "AC123",
                    "dialogue": [
                        { "content": "Hello?", "identifier": "+15558675309", "start": 0.4 },
                        { "content": "Hi, this is Sam.", "userId": "US1", "start": 1.9 }
                    ]
                }
            }
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        let object = payload.call_object().unwrap();
        assert_eq!(object.call_id.as_deref(), Some("AC123"));
        let dialogue = object.dialogue.as_ref().unwrap();
        assert_eq!(dialogue.len(), 2);
        assert_eq!(dialogue[0].content, "Hello?");
        assert_eq!(dialogue[1].user_id.as_deref(), Some("US1"));
    }
}
