use anyhow::Context;
use clap::{Parser, Subcommand};
use frontdesk_config::load as load_config;
use frontdesk_gateway::create_router;
use frontdesk_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "frontdesk-backend")]
#[command(about = "Frontdesk helpdesk backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP/WebSocket server (default)
    Serve,
    /// Seed the database with a demo company
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedData => seed_data().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Frontdesk backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let app = create_router(services.state.clone());

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let pool = &services.db_pool;
    let now = chrono::Utc::now().to_rfc3339();

    let inbox_id = sqlx::query(
        "INSERT INTO inboxes (company_id, name, auto_assignment_enabled, max_auto_assignments, auto_responder_message, created_at, updated_at) \
         VALUES (1, 'Website', 1, 3, 'Thanks for reaching out! An agent will be with you shortly.', ?, ?)",
    )
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .context("failed to seed inbox")?
    .last_insert_rowid();

    for name in ["Ana Demo", "Ben Demo"] {
        let user_id = sqlx::query(
            "INSERT INTO users (public_id, company_id, display_name, email, created_at) VALUES (?, 1, ?, NULL, ?)",
        )
        .bind(cuid2::create_id())
        .bind(name)
        .bind(&now)
        .execute(pool)
        .await
        .context("failed to seed user")?
        .last_insert_rowid();

        sqlx::query("INSERT INTO inbox_members (inbox_id, user_id) VALUES (?, ?)")
            .bind(inbox_id)
            .bind(user_id)
            .execute(pool)
            .await
            .context("failed to seed inbox membership")?;

        info!(user_id, name, "seeded agent");
    }

    sqlx::query(
        "INSERT INTO contacts (public_id, company_id, name, email, created_at, updated_at) \
         VALUES (?, 1, 'Demo Visitor', NULL, ?, ?)",
    )
    .bind(cuid2::create_id())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .context("failed to seed contact")?;

    info!(inbox_id, "seed data inserted");
    Ok(())
}

fn shutdown_signal() -> impl std::future::Future<Output = ()> {
    async {
        if let Err(error) = signal::ctrl_c().await {
            error!(?error, "failed to listen for shutdown signal");
        }
        info!("shutdown signal received");
    }
}
