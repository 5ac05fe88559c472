//! # Frontdesk Conversations Crate
//!
//! The conversation state machine (pending → active → closed), automatic
//! agent assignment under per-inbox load limits, and the listeners that
//! translate domain events into topic publishes. Business code here never
//! talks to the topic registry directly; everything observable goes through
//! the event dispatcher.

pub mod listeners;
pub mod services;
pub mod types;

pub use listeners::{register_listeners, AutoAssignListener, BroadcastListener};
pub use services::{AssignmentService, ConversationService};
pub use types::errors::{ConversationError, ConversationResult};
pub use types::events::{EventKind, HelpdeskEvent, Participant};
