//! Conversation message entity definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: i64,
    pub public_id: String,
    pub conversation_id: i64,
    pub sender_type: SenderType,
    pub sender_id: Option<i64>,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub conversation_id: i64,
    pub sender_type: SenderType,
    pub sender_id: Option<i64>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Agent,
    Contact,
    System,
    Bot,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Agent => "agent",
            SenderType::Contact => "contact",
            SenderType::System => "system",
            SenderType::Bot => "bot",
        }
    }
}

impl From<&str> for SenderType {
    fn from(s: &str) -> Self {
        match s {
            "agent" => SenderType::Agent,
            "system" => SenderType::System,
            "bot" => SenderType::Bot,
            _ => SenderType::Contact,
        }
    }
}

impl std::fmt::Display for SenderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
