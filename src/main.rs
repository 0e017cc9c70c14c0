use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use multiplayer_otel::{
    capture_request, capture_response,
    observability::{
        init_logging, init_tracing, log_config_info, shutdown_tracing, trace_http_requests,
    },
    Config, RatioDependentIdGenerator, APP_NAME, VERSION,
};
use serde::Deserialize;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "multiplayer-otel")]
#[command(about = "Demo HTTP server instrumented with Multiplayer payload capture")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Address the demo server listens on
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:8080")]
    bind_address: SocketAddr,
}

#[derive(Clone)]
struct AppState {
    generator: RatioDependentIdGenerator,
}

#[derive(Debug, Deserialize)]
struct DebugSessionRequest {
    session_id: String,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if it exists; must happen before any config is read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_logging(&config)?;
    log_config_info(&config);

    // The exporter's blocking client must be built outside the runtime.
    let generator = RatioDependentIdGenerator::new(config.doc_traces_ratio);
    let provider = init_tracing(&config, generator.clone())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(serve(cli.bind_address, &config, generator));
    drop(runtime);

    info!("Flushing OpenTelemetry traces before shutdown");
    shutdown_tracing(provider);
    result
}

async fn serve(
    bind_address: SocketAddr,
    config: &Config,
    generator: RatioDependentIdGenerator,
) -> anyhow::Result<()> {
    let app = router(config, generator);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    info!(app_name = APP_NAME, version = VERSION, address = %bind_address, "Demo server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Demo server stopped");
    Ok(())
}

fn router(config: &Config, generator: RatioDependentIdGenerator) -> Router {
    let options =
        Arc::new(config.middleware_options().with_debug_session_source(generator.clone()));

    Router::new()
        .route("/echo", post(echo))
        .route("/health", get(health))
        .route("/debug-session", post(start_debug_session).delete(stop_debug_session))
        .with_state(AppState { generator })
        .layer(middleware::from_fn_with_state(options.clone(), capture_response))
        .layer(middleware::from_fn_with_state(options, capture_request))
        .layer(middleware::from_fn(trace_http_requests))
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    ([(CONTENT_TYPE, content_type)], body)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": VERSION }))
}

async fn start_debug_session(
    State(state): State<AppState>,
    Json(request): Json<DebugSessionRequest>,
) -> StatusCode {
    if request.session_id.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    info!(session_id = %request.session_id, "Debug session started");
    state.generator.set_debug_session(request.session_id);
    StatusCode::NO_CONTENT
}

async fn stop_debug_session(State(state): State<AppState>) -> StatusCode {
    if let Some(session_id) = state.generator.debug_session() {
        info!(session_id = %session_id, "Debug session ended");
    }
    state.generator.clear_debug_session();
    StatusCode::NO_CONTENT
}
