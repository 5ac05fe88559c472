//! Process wiring for the Frontdesk backend: tracing setup and the one
//! place every service gets constructed and connected. Both the server
//! binary and the end-to-end tests initialise through here.

use std::sync::Arc;

use anyhow::Result;
use frontdesk_config::AppConfig;
use frontdesk_conversations::{register_listeners, AssignmentService, ConversationService};
use frontdesk_gateway::GatewayState;
use frontdesk_realtime::{EventDispatcher, RealtimeHub};
use frontdesk_store::{
    ContactStore, ConversationStore, InboxStore, SqliteContactStore, SqliteConversationStore,
    SqliteInboxStore, SqliteUserStore, UserStore,
};
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub state: GatewayState,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = frontdesk_store::initialize_database(&config.database).await?;

        let conversation_store: Arc<dyn ConversationStore> =
            Arc::new(SqliteConversationStore::new(db_pool.clone()));
        let inboxes: Arc<dyn InboxStore> = Arc::new(SqliteInboxStore::new(db_pool.clone()));
        let contacts: Arc<dyn ContactStore> = Arc::new(SqliteContactStore::new(db_pool.clone()));
        let users: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(db_pool.clone()));

        let dispatcher = Arc::new(EventDispatcher::new());
        let hub = Arc::new(RealtimeHub::new());

        let conversations = Arc::new(ConversationService::new(
            conversation_store.clone(),
            inboxes.clone(),
            contacts.clone(),
            dispatcher.clone(),
        ));
        let assignment = Arc::new(AssignmentService::new(
            conversation_store,
            inboxes.clone(),
            dispatcher.clone(),
        ));

        register_listeners(&dispatcher, hub.clone(), assignment.clone()).await;

        let state = GatewayState::new(
            hub,
            dispatcher,
            conversations,
            assignment,
            contacts,
            inboxes,
            users,
            config.realtime.send_buffer,
        );

        info!("backend services initialised");
        Ok(Self { db_pool, state })
    }
}
