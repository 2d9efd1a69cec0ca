//! Server entry point: wires configuration, state, sessions, and routes.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use passkey_gate::config::Config;
use passkey_gate::handlers::auth::*;
use passkey_gate::handlers::credentials::list_credentials;
use passkey_gate::handlers::health::health_check;
use passkey_gate::middleware::auth::require_auth;
use passkey_gate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passkey_gate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(rp_id = %config.rp_id, origin = %config.rp_origin, "configuration loaded");

    let app_state = AppState::new(&config).await?;

    // Unconsumed challenges expire on their own; this just keeps the table
    // from accumulating dead rows.
    let cleanup_pool = app_state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            if let Err(e) = passkey_gate::db::challenges::cleanup_expired(&cleanup_pool).await {
                tracing::error!("challenge cleanup failed: {:?}", e);
            }
        }
    });

    // Session data lives server-side in SQLite; the cookie only carries the id.
    let session_store = SqliteStore::new(app_state.db.clone());
    session_store.migrate().await?;
    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Privileged surface: everything here requires an authenticated session.
    let protected_routes = Router::new()
        .route("/api/credentials", get(list_credentials))
        .layer(axum_middleware::from_fn(require_auth))
        .with_state(app_state.clone());

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register/start", post(register_start))
        .route("/api/auth/register/finish", post(register_finish))
        .route("/api/auth/authenticate/start", post(authenticate_start))
        .route("/api/auth/authenticate/finish", post(authenticate_finish))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session_info))
        .merge(protected_routes)
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_addr = config.bind_address();
    tracing::info!("listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
