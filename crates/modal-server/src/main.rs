mod config;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use modal_api::{ApiError, AppStateInner, PdfRenderer, decode_token};
use modal_db::{Backend, Database, JsonStore, Store};
use modal_gateway::Dispatcher;

use crate::config::Config;

const DEFAULT_LOG_FILTER: &str =
    "modal_server=debug,modal_api=debug,modal_gateway=debug,modal_db=info,tower_http=debug";

#[derive(Clone)]
struct WsState {
    dispatcher: Dispatcher,
    store: Arc<dyn Store>,
    jwt_secret: Arc<str>,
}

#[derive(Deserialize)]
struct WsParams {
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_default_secret() {
        warn!("MODAL_JWT_SECRET is unset or the development placeholder; sessions are forgeable");
    }

    let store: Arc<dyn Store> = match config.backend {
        Backend::Sqlite => Arc::new(Database::open(&config.db_path)?),
        Backend::Json => {
            let store = JsonStore::new(&config.json_path);
            store.init()?;
            Arc::new(store)
        }
    };
    info!("Using {:?} store", config.backend);

    let app_state = Arc::new(AppStateInner::new(
        store.clone(),
        config.backend,
        config.json_path.clone(),
        config.jwt_secret.clone(),
        PdfRenderer::new(&config.chrome_path),
    ));

    let ws_route = Router::new().route("/ws", get(ws_upgrade)).with_state(WsState {
        dispatcher: Dispatcher::new(),
        store,
        jwt_secret: config.jwt_secret.as_str().into(),
    });

    let app = modal_api::router(app_state)
        .merge(ws_route)
        .route("/health", get(health))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Modal Realism Calculator Suite listening on {}", addr);
    info!("Serving static files from {}", config.static_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Sockets without a token connect as guests; a bad token is refused before
/// the upgrade.
async fn ws_upgrade(
    State(state): State<WsState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let session_user = match params.token.as_deref() {
        Some(token) => Some(decode_token(&state.jwt_secret, token)?.sub),
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| {
        modal_gateway::handle_connection(socket, state.dispatcher, state.store, session_user)
    }))
}

async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
