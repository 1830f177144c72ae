// ./api/src/main.rs
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use application::{ApplicationError, CreationPolicy, ErrorKind, InvocationRequest, Ledger, LedgerConfig};
use infrastructure::InMemoryKeyValueStore;

#[derive(Clone)]
struct AppState {
    ledger: Arc<Ledger>,
}

/// Body of `POST /init`.
#[derive(Deserialize, Debug)]
struct InitRequest {
    #[serde(default)]
    args: Vec<String>,
}

const DEFAULT_PORT: u16 = 3000;

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let port = port_from_env();
    let config = LedgerConfig {
        creation_policy: creation_policy_from_env(),
    };

    // --- Dependency Injection ---
    let store = Arc::new(InMemoryKeyValueStore::new());
    info!("In-memory key-value store initialized.");
    let ledger = Arc::new(Ledger::new(store, config));
    info!(policy = ?config.creation_policy, "Ledger initialized.");

    let app = router(AppState { ledger });
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/init", post(init_handler))
        .route("/invoke", post(invoke_handler))
        .route("/query", post(query_handler))
        .with_state(state)
}

// --- Configuration ---

fn port_from_env() -> u16 {
    match env::var("PORT") {
        Ok(port_str) => match u16::from_str(&port_str) {
            Ok(port_num) => {
                info!("Using port {} from environment variable PORT.", port_num);
                port_num
            }
            Err(_) => {
                warn!(
                    "Invalid PORT value '{}' in environment variable. Using default port {}.",
                    port_str, DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        },
        Err(_) => {
            info!(
                "PORT environment variable not set. Using default port {}.",
                DEFAULT_PORT
            );
            DEFAULT_PORT
        }
    }
}

fn creation_policy_from_env() -> CreationPolicy {
    match env::var("LEDGER_CREATION_POLICY") {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!(
                "Invalid LEDGER_CREATION_POLICY ({}). Using default {:?}.",
                e,
                CreationPolicy::default()
            );
            CreationPolicy::default()
        }),
        Err(_) => CreationPolicy::default(),
    }
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

/// Handler for deployment-time initialisation (POST /init).
async fn init_handler(State(state): State<AppState>, Json(payload): Json<InitRequest>) -> Response {
    info!(argc = payload.args.len(), "Received init request");
    match state.ledger.init(&payload.args).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for mutating operations (POST /invoke).
async fn invoke_handler(
    State(state): State<AppState>,
    Json(request): Json<InvocationRequest>,
) -> Response {
    info!(function = %request.function, argc = request.args.len(), "Received invoke request");
    match state.ledger.invoke(&request.function, &request.args).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for read-only operations (POST /query); the body is the raw stored value.
async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<InvocationRequest>,
) -> Response {
    info!(function = %request.function, argc = request.args.len(), "Received query request");
    match state.ledger.query(&request.function, &request.args).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Maps ApplicationError to an HTTP status code with the error text as body.
fn map_application_error_to_response(err: ApplicationError) -> Response {
    let status = match err.kind() {
        ErrorKind::InvalidArgument => {
            warn!("Rejected request: {}", err);
            StatusCode::BAD_REQUEST
        }
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StoreError => {
            error!("Underlying store error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string()).into_response()
}
