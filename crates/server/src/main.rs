//! Hello World playground web server.
//!
//! Provides a REST API and WebSocket interface for the live-preview editor,
//! and serves preview documents under a sandboxing CSP.

mod guard;
mod routes;
mod state;
mod views;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use clap::Parser;
use services::logging::{LogConfig, init_logging};
use services::{ExternalServices, ServicesConfig};
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tracing::info;

use routes::{
    export_document, get_content, get_defaults, get_me, get_preview, get_session, get_snapshot,
    list_content, list_snapshots, open_editor, run_document, save_snapshot, ws_handler,
};
use state::AppState;

/// Directory of the built frontend when the config names none.
const DEFAULT_STATIC_DIR: &str = "crates/frontend/dist";

/// Hello World playground server
#[derive(Parser, Debug)]
#[command(name = "hello-world-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Keep snapshots and accounts in memory only
    #[arg(long)]
    in_memory: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Build the application router.
fn app(state: AppState) -> Router {
    let static_dir = state
        .services
        .config()
        .server
        .static_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

    // Build API routes
    let api_routes = Router::new()
        .route("/defaults", get(get_defaults))
        .route("/editors", post(open_editor))
        .route("/editors/:editor/run", post(run_document))
        .route("/editors/:editor/session", get(get_session))
        .route("/editors/:editor/ws", get(ws_handler))
        .route("/export", post(export_document))
        .route("/snapshots", get(list_snapshots).post(save_snapshot))
        .route("/snapshots/:key", get(get_snapshot))
        .route("/content", get(list_content))
        .route("/content/:id", get(get_content))
        .route("/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::guard_origin,
        ));

    let router = Router::new()
        .nest("/api", api_routes)
        .route("/preview/:editor/:session", get(get_preview))
        // Serve static files from frontend dist (when built)
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true));

    let router = match guard::cors_layer(&state.services.config().server.allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServicesConfig::load(args.config.as_deref()).context("loading config")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_logging(
        &LogConfig::from_verbosity(args.verbose)
            .with_format(config.logging.format)
            .with_log_file(config.logging.file.clone()),
    )
    .context("initializing logging")?;

    let services = if args.in_memory {
        ExternalServices::in_memory(config.clone())
    } else {
        ExternalServices::connect(config.clone())
    }
    .context("starting services")?;

    let state = AppState::new(services);
    let router = app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, boundary = ?config.sandbox.boundary, "server listening");

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_router_builds() {
        let state = state::test_state();

        let _router = app(state);
    }

    #[tokio::test]
    async fn test_router_skips_wildcard_origins() {
        let mut config = ServicesConfig::default();
        config.server.allowed_origins = vec![
            "*".to_string(),
            "null".to_string(),
            "https://class.example.org".to_string(),
        ];

        let _router = app(state::test_state_with(config));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["hello-world-server", "-p", "8080", "-vv", "--in-memory"]);

        assert_eq!(args.port, Some(8080));
        assert_eq!(args.verbose, 2);
        assert!(args.in_memory);
        assert!(args.config.is_none());
    }
}
