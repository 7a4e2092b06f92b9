//! memex HTTP API server.
//!
//! Wires the database, embedding backend, search components, and job
//! worker together behind an axum router. Configuration comes from the
//! environment (`.env` supported via dotenvy):
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DATABASE_URL` | (required) | Postgres connection string |
//! | `PORT` | `3000` | HTTP listen port |
//! | `MEMEX_EMBED_PROVIDER` | `ollama` | `ollama`, `openai`, or `mock` |
//! | `JOB_WORKER_ENABLED` | `true` | Run the background worker in-process |

mod error;
mod handlers;
mod owner;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use memex_db::Database;
use memex_inference::InferenceConfig;
use memex_jobs::{
    EmbedMessageHandler, EmbedNoteHandler, JobWorker, LinkNoteHandler, WorkerConfig,
};

use crate::state::AppState;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/related", post(handlers::related::find_related))
        .route("/api/notes", post(handlers::notes::create_note))
        .route(
            "/api/notes/:id",
            get(handlers::notes::get_note)
                .patch(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        .route("/api/notes/:id/links", post(handlers::notes::link_note))
        .route(
            "/api/notes/:id/backlinks",
            get(handlers::notes::direct_backlinks),
        )
        .route("/api/backlinks", get(handlers::notes::wiki_backlinks))
        .route("/api/edges", post(handlers::edges::create_edge))
        .route(
            "/api/edges/:id",
            axum::routing::delete(handlers::edges::delete_edge),
        )
        .route(
            "/api/conversations",
            post(handlers::conversations::create_conversation),
        )
        .route(
            "/api/conversations/:id/messages",
            post(handlers::conversations::append_message)
                .get(handlers::conversations::list_messages),
        )
        .route("/api/wikilinks/suggest", get(handlers::wikilinks::suggest))
        .route("/api/wikilinks/resolve", post(handlers::wikilinks::resolve))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(memex_core::defaults::SERVER_PORT);

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;
    info!(subsystem = "api", "Database connected and migrated");

    let inference = InferenceConfig::from_env()?;
    let embedder = inference.create_backend()?;
    info!(
        subsystem = "api",
        model = embedder.model_name(),
        "Embedding backend ready"
    );

    let state = AppState::new(db.clone(), embedder.clone());

    // Background worker: embedding refresh + auto-linking. Runs
    // in-process; disable with JOB_WORKER_ENABLED=false to run workers
    // in a separate deployment.
    let worker = JobWorker::new(db.clone(), WorkerConfig::from_env());
    worker
        .register_handler(EmbedNoteHandler::new(db.clone(), embedder.clone()))
        .await;
    worker
        .register_handler(EmbedMessageHandler::new(db.clone(), embedder.clone()))
        .await;
    worker
        .register_handler(LinkNoteHandler::new(db.clone(), Arc::clone(&state.engine)))
        .await;
    let worker_handle = worker.start();

    let app = router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(subsystem = "api", %addr, "memex API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!(subsystem = "api", "Shutdown signal received");
        })
        .await?;

    worker_handle.shutdown().await.ok();
    Ok(())
}
