//! # Frontdesk Realtime Crate
//!
//! The transport primitives behind the live-chat subsystem:
//!
//! - **Connection registry**: the set of currently connected clients,
//!   partitioned by role, guarded by a single lock discipline.
//! - **Topic pub/sub**: string-keyed fan-out with no knowledge of chat
//!   semantics; topic naming is entirely the caller's business.
//! - **Domain event dispatcher**: an in-process bus that runs each listener
//!   as its own task, so listeners never block each other or the caller.
//! - **Wire envelope**: the JSON frame format spoken over WebSocket.
//!
//! Everything here is constructed once at process start and passed around
//! explicitly; there are no global singletons.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod hub;
pub mod registry;
pub mod topics;
pub mod wire;

pub use client::{Client, ClientId, ClientRole, ConnectParams};
pub use dispatcher::{DomainEvent, EventDispatcher, EventListener};
pub use error::{RealtimeError, RealtimeResult};
pub use hub::RealtimeHub;
pub use registry::ConnectionRegistry;
pub use topics::{PublishOutcome, TopicRegistry};
pub use wire::Envelope;
