pub mod errors;
pub mod events;

pub use errors::{ConversationError, ConversationResult};
pub use events::{EventKind, HelpdeskEvent, Participant};
