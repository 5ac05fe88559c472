//! Conversation entity definitions

use serde::{Deserialize, Serialize};

use super::contact::Contact;
use super::inbox::Inbox;
use super::message::ConversationMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub public_id: String,
    pub company_id: i64,
    pub inbox_id: i64,
    pub contact_id: i64,
    pub status: ConversationStatus,
    pub assigned_to_id: Option<i64>,
    pub last_message_content: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A conversation together with the rows it references, as returned by
/// `ConversationStore::get_with_relations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationWithRelations {
    pub conversation: Conversation,
    pub contact: Contact,
    pub inbox: Inbox,
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub company_id: i64,
    pub inbox_id: i64,
    pub contact_id: i64,
}

/// Change-set for `ConversationStore::update`. Fields left as `None` are
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConversation {
    pub status: Option<ConversationStatus>,
    pub assigned_to_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Pending,
    Active,
    Closed,
    Resolved,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Pending => "pending",
            ConversationStatus::Active => "active",
            ConversationStatus::Closed => "closed",
            ConversationStatus::Resolved => "resolved",
        }
    }

    /// Pending and active conversations still accept messages.
    pub fn accepts_messages(&self) -> bool {
        matches!(
            self,
            ConversationStatus::Pending | ConversationStatus::Active
        )
    }

    /// Only `active` conversations count toward an agent's concurrent load.
    pub fn counts_toward_load(&self) -> bool {
        matches!(self, ConversationStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversationStatus::Closed | ConversationStatus::Resolved
        )
    }
}

impl From<&str> for ConversationStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => ConversationStatus::Active,
            "closed" => ConversationStatus::Closed,
            "resolved" => ConversationStatus::Resolved,
            _ => ConversationStatus::Pending,
        }
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ConversationStatus::Pending,
            ConversationStatus::Active,
            ConversationStatus::Closed,
            ConversationStatus::Resolved,
        ] {
            assert_eq!(ConversationStatus::from(status.as_str()), status);
        }
    }

    #[test]
    fn only_active_counts_toward_load() {
        assert!(ConversationStatus::Active.counts_toward_load());
        assert!(!ConversationStatus::Pending.counts_toward_load());
        assert!(!ConversationStatus::Closed.counts_toward_load());
        assert!(!ConversationStatus::Resolved.counts_toward_load());
    }

    #[test]
    fn terminal_statuses_reject_messages() {
        assert!(ConversationStatus::Pending.accepts_messages());
        assert!(ConversationStatus::Active.accepts_messages());
        assert!(!ConversationStatus::Closed.accepts_messages());
        assert!(!ConversationStatus::Resolved.accepts_messages());
    }
}
