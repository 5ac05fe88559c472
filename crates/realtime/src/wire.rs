//! Wire message envelope and naming conventions.
//!
//! Every frame in either direction is `{event, payload, timestamp}`. The
//! payload schema is event-specific JSON; the timestamp is stamped at
//! construction in RFC3339.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub timestamp: String,
}

impl Envelope {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// A `connection_error` frame carrying an error kind and a human-readable
    /// message.
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            events::CONNECTION_ERROR,
            serde_json::json!({
                "error": kind.into(),
                "message": message.into(),
            }),
        )
    }
}

/// Event names used on the wire.
pub mod events {
    // Inbound (client-driven)
    pub const CONVERSATION_START: &str = "conversation_start";
    pub const CONVERSATION_SEND_MESSAGE: &str = "conversation_send_message";
    pub const CONVERSATION_GET_BY_ID: &str = "conversation_get_by_id";
    pub const CONVERSATION_TYPING: &str = "conversation_typing";
    pub const CONVERSATION_TYPING_STOP: &str = "conversation_typing_stop";
    pub const CONVERSATION_CLOSE: &str = "conversation_close";
    pub const SUBSCRIBE: &str = "subscribe";
    pub const UNSUBSCRIBE: &str = "unsubscribe";

    // Outbound (server-driven)
    pub const CONNECTION_ESTABLISHED: &str = "connection_established";
    pub const CONNECTION_ERROR: &str = "connection_error";
    pub const CONVERSATION_STARTED: &str = "conversation_started";
    pub const CONVERSATION_ASSIGNED: &str = "conversation_assigned";
    pub const CONVERSATION_CLOSED: &str = "conversation_closed";
    pub const MESSAGE_CREATED: &str = "message_created";
    pub const CONTACT_CREATED: &str = "contact_created";
    pub const CONTACT_UPDATED: &str = "contact_updated";
    pub const CONTACT_DELETED: &str = "contact_deleted";
    pub const INBOX_CREATED: &str = "inbox_created";
    pub const INBOX_UPDATED: &str = "inbox_updated";
    pub const INBOX_DELETED: &str = "inbox_deleted";
    pub const USER_LOGGED_IN: &str = "user_logged_in";
}

/// Topic naming helpers. The topic registry treats these as opaque strings;
/// these helpers exist so every caller spells them the same way.
pub mod topic {
    pub fn company(company_id: i64) -> String {
        format!("company:{company_id}")
    }

    pub fn conversation(conversation_id: i64) -> String {
        format!("conversation:{conversation_id}")
    }

    pub fn user(user_id: i64) -> String {
        format!("user:{user_id}")
    }

    pub fn contact(contact_id: i64) -> String {
        format!("contact:{contact_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_with_timestamp() {
        let envelope = Envelope::new(events::CONVERSATION_START, serde_json::json!({"inbox_id": 1}));
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: Envelope = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.event, "conversation_start");
        assert_eq!(parsed.payload["inbox_id"], 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&parsed.timestamp).is_ok());
    }

    #[test]
    fn envelope_payload_defaults_to_null() {
        let parsed: Envelope = serde_json::from_str(
            r#"{"event": "conversation_typing", "timestamp": "2024-05-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(parsed.payload.is_null());
    }

    #[test]
    fn topic_names_follow_convention() {
        assert_eq!(topic::company(7), "company:7");
        assert_eq!(topic::conversation(12), "conversation:12");
        assert_eq!(topic::user(3), "user:3");
        assert_eq!(topic::contact(9), "contact:9");
    }
}
