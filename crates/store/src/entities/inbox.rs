//! Inbox entity definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inbox {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub auto_assignment_enabled: bool,
    /// Maximum number of `active` conversations an agent may hold before
    /// auto-assignment skips them.
    pub max_auto_assignments: i64,
    pub auto_responder_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInboxRequest {
    pub company_id: i64,
    pub name: String,
    pub auto_assignment_enabled: bool,
    pub max_auto_assignments: i64,
    pub auto_responder_message: Option<String>,
}
