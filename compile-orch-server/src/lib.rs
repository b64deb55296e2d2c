use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use compile_orch::CompileService;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};
use tracing::info;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("missing 'code' field in request body")]
    MissingCode,
    #[error("server error: {0}")]
    Server(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::MissingCode => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Server(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// Envelope for `/api/compile`: exactly one of `assembly` and `error` is
/// present, matching the success flag. Compile failures are still HTTP
/// 200; only a malformed request is a client-error status.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub compiler_exists: bool,
    pub compiler_path: String,
}

#[derive(Clone)]
pub struct AppState {
    service: Arc<CompileService>,
}

pub fn create_app(service: CompileService, assets_dir: PathBuf) -> Router {
    let state = AppState {
        service: Arc::new(service),
    };

    let cors = CorsLayer::permissive();

    Router::new()
        .route_service("/", ServeFile::new(assets_dir.join("index.html")))
        .route("/api/compile", post(compile))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    info!("listening on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(_) => {
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    info!("shutdown signal received, closing server");
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        compiler_exists: state.service.compiler_exists(),
        compiler_path: state.service.compiler_path().display().to_string(),
    })
}

async fn compile(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<CompileResponse>, ServerError> {
    let code = payload
        .get("code")
        .and_then(|value| value.as_str())
        .ok_or(ServerError::MissingCode)?;

    let response = match state.service.compile(code).await {
        Ok(assembly) => CompileResponse {
            success: true,
            assembly: Some(assembly),
            error: None,
        },
        Err(e) => CompileResponse {
            success: false,
            assembly: None,
            error: Some(e.to_string()),
        },
    };

    Ok(Json(response))
}
