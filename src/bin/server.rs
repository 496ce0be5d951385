use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use maze_race_server::config::ServerConfig;
use maze_race_server::constants::EVICTION_INTERVAL_MS;
use maze_race_server::engine::now_ms;
use maze_race_server::error::ServiceError;
use maze_race_server::leaderboard::JsonFileLeaderboard;
use maze_race_server::server_protocol::{
    parse_create_room, parse_join_room, parse_move, parse_start_session, parse_submit_race,
    ProtocolError,
};
use maze_race_server::server_utils::parse_leaderboard_limit;
use maze_race_server::service::GameService;
use maze_race_server::types::{
    LeaderboardResponse, MazeInfo, MoveResponse, PublicState, RaceStatus, StartedSession,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

type SharedState = Arc<GameService>;

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    limit: Option<String>,
}

struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl From<ProtocolError> for ApiError {
    fn from(error: ProtocolError) -> Self {
        Self(error.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::InvalidInput(_) | ServiceError::Room(_) => StatusCode::BAD_REQUEST,
            ServiceError::Leaderboard(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            tracing::debug!(error = %self.0, "request rejected");
        } else {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = config.load_catalog()?;
    tracing::info!(mazes = catalog.len(), "maze catalog loaded");

    let leaderboard = Arc::new(JsonFileLeaderboard::new(config.leaderboard_path.clone()));
    let service = Arc::new(GameService::with_memory_stores(
        catalog,
        leaderboard,
        config.session_ttl_ms(),
        config.service_options(),
    ));
    start_eviction_loop(service.clone());

    let app = router(service);
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(service: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/mazes", get(mazes_handler))
        .route("/api/sessions", post(start_session_handler))
        .route("/api/rooms", post(create_room_handler))
        .route("/api/rooms/join", post(join_room_handler))
        .route("/api/move", post(move_handler))
        .route("/api/state/{session_id}", get(state_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
        .route("/api/race/submit", post(submit_race_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn start_eviction_loop(service: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(EVICTION_INTERVAL_MS));
        loop {
            interval.tick().await;
            service.evict_idle(now_ms());
        }
    });
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn mazes_handler(State(service): State<SharedState>) -> Json<Vec<MazeInfo>> {
    Json(service.mazes())
}

async fn start_session_handler(
    State(service): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<StartedSession>, ApiError> {
    let request = parse_start_session(&body)?;
    Ok(Json(service.start_session(request).await?))
}

async fn create_room_handler(
    State(service): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let maze_index = parse_create_room(&body)?;
    let room = service.create_room(maze_index)?;
    Ok(Json(json!({ "room": room })))
}

async fn join_room_handler(
    State(service): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let request = parse_join_room(&body)?;
    let session_id = service.join_room(request).await?;
    Ok(Json(json!({ "session_id": session_id })))
}

async fn move_handler(
    State(service): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<MoveResponse>, ApiError> {
    let request = parse_move(&body)?;
    Ok(Json(
        service.apply_move(&request.session_id, request.dir).await?,
    ))
}

async fn state_handler(
    State(service): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<PublicState>, ApiError> {
    Ok(Json(service.state(&session_id).await?))
}

async fn leaderboard_handler(
    State(service): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let limit = parse_leaderboard_limit(query.limit.as_deref());
    Ok(Json(service.leaderboard(limit).await?))
}

async fn submit_race_handler(
    State(service): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<RaceStatus>, ApiError> {
    let request = parse_submit_race(&body)?;
    Ok(Json(
        service
            .submit_race(&request.room, &request.session_id)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use maze_race_server::room::RoomError;

    use super::*;

    #[test]
    fn errors_map_to_http_status() {
        let not_found = ApiError(ServiceError::NotFound {
            kind: "session",
            id: "x".to_string(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let mismatch = ApiError(ServiceError::Room(RoomError::MazeMismatch {
            room_maze: 0,
            session_maze: 1,
        }));
        assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);

        let unfinished = ApiError(ServiceError::Room(RoomError::NotFinished));
        assert_eq!(unfinished.status(), StatusCode::BAD_REQUEST);

        let bad_body: ApiError = ProtocolError("'room' is required".to_string()).into();
        assert_eq!(bad_body.status(), StatusCode::BAD_REQUEST);

        let internal = ApiError(ServiceError::Internal("boom".to_string()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
