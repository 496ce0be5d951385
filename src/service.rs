use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::constants::{
    DEFAULT_ENEMY_COUNT, LEADERBOARD_WRITE_TIMEOUT_MS, ROOM_ID_LEN, SESSION_ID_LEN,
};
use crate::engine::{now_ms, Session};
use crate::error::ServiceError;
use crate::leaderboard::{build_response, LeaderboardGateway};
use crate::maze::{Maze, MazeCatalog};
use crate::rng::Rng;
use crate::room::{Entrant, Room};
use crate::server_protocol::{JoinRoomRequest, StartSessionRequest};
use crate::server_utils::make_id;
use crate::store::{EntityStore, MemoryStore};
use crate::types::{
    Direction, GameMode, LeaderboardEntry, LeaderboardResponse, MazeInfo, MoveOutcome,
    MoveResponse, PublicState, RaceStatus, StartedSession,
};

#[derive(Clone, Debug)]
pub struct GameServiceOptions {
    pub enemy_count: usize,
    pub leaderboard_timeout: Duration,
    pub seed: Option<u32>,
}

impl Default for GameServiceOptions {
    fn default() -> Self {
        Self {
            enemy_count: DEFAULT_ENEMY_COUNT,
            leaderboard_timeout: Duration::from_millis(LEADERBOARD_WRITE_TIMEOUT_MS),
            seed: None,
        }
    }
}

/// Entry point for every request: resolves ids to entities and serializes
/// work per session and per room.
pub struct GameService {
    catalog: MazeCatalog,
    sessions: Box<dyn EntityStore<Session>>,
    rooms: Box<dyn EntityStore<Room>>,
    leaderboard: Arc<dyn LeaderboardGateway>,
    rng: Mutex<Rng>,
    options: GameServiceOptions,
}

impl GameService {
    pub fn new(
        catalog: MazeCatalog,
        sessions: Box<dyn EntityStore<Session>>,
        rooms: Box<dyn EntityStore<Room>>,
        leaderboard: Arc<dyn LeaderboardGateway>,
        options: GameServiceOptions,
    ) -> Self {
        let seed = options.seed.unwrap_or_else(rand::random);
        Self {
            catalog,
            sessions,
            rooms,
            leaderboard,
            rng: Mutex::new(Rng::new(seed)),
            options,
        }
    }

    pub fn with_memory_stores(
        catalog: MazeCatalog,
        leaderboard: Arc<dyn LeaderboardGateway>,
        ttl_ms: Option<u64>,
        options: GameServiceOptions,
    ) -> Self {
        Self::new(
            catalog,
            Box::new(MemoryStore::new(ttl_ms)),
            Box::new(MemoryStore::new(ttl_ms)),
            leaderboard,
            options,
        )
    }

    pub fn mazes(&self) -> Vec<MazeInfo> {
        self.catalog.infos()
    }

    pub async fn start_session(
        &self,
        request: StartSessionRequest,
    ) -> Result<StartedSession, ServiceError> {
        let session = self.new_session(request.maze_index, &request.player_name)?;
        let session_id = make_id(SESSION_ID_LEN);

        let room = match (request.mode, request.room) {
            (GameMode::Single, _) => None,
            (GameMode::Race, Some(room_id)) => {
                let room = self
                    .rooms
                    .get(&room_id)
                    .ok_or_else(|| ServiceError::room_not_found(&room_id))?;
                room.lock().await.join(&session_id, request.maze_index)?;
                Some(room_id)
            }
            (GameMode::Race, None) => {
                let room_id = make_id(ROOM_ID_LEN);
                let mut room = Room::new(room_id.clone(), request.maze_index);
                room.join(&session_id, request.maze_index)?;
                self.rooms.put(room_id.clone(), room);
                Some(room_id)
            }
        };

        tracing::info!(
            session = %session_id,
            room = room.as_deref().unwrap_or("-"),
            maze = %session.maze_name,
            player = %session.player_name,
            enemies = session.enemies().len(),
            "session started"
        );
        self.sessions.put(session_id.clone(), session);
        Ok(StartedSession { session_id, room })
    }

    pub fn create_room(&self, maze_index: usize) -> Result<String, ServiceError> {
        self.maze(maze_index)?;
        let room_id = make_id(ROOM_ID_LEN);
        self.rooms
            .put(room_id.clone(), Room::new(room_id.clone(), maze_index));
        tracing::info!(room = %room_id, maze_index, "room created");
        Ok(room_id)
    }

    /// Creates a session and adds it to the room. Nothing is stored when the
    /// room rejects it.
    pub async fn join_room(&self, request: JoinRoomRequest) -> Result<String, ServiceError> {
        let room = self
            .rooms
            .get(&request.room)
            .ok_or_else(|| ServiceError::room_not_found(&request.room))?;
        let session = self.new_session(request.maze_index, &request.player_name)?;
        let session_id = make_id(SESSION_ID_LEN);

        room.lock().await.join(&session_id, request.maze_index)?;
        tracing::info!(
            session = %session_id,
            room = %request.room,
            player = %session.player_name,
            "joined room"
        );
        self.sessions.put(session_id.clone(), session);
        Ok(session_id)
    }

    pub async fn apply_move(
        &self,
        session_id: &str,
        dir: Direction,
    ) -> Result<MoveResponse, ServiceError> {
        let handle = self
            .sessions
            .get(session_id)
            .ok_or_else(|| ServiceError::session_not_found(session_id))?;

        let mut finished: Option<LeaderboardEntry> = None;
        let response = {
            let mut session = handle.lock().await;
            let outcome = session.apply_move(dir, now_ms(), &mut finished);
            match outcome {
                MoveOutcome::Win { elapsed_secs } => tracing::info!(
                    session = %session_id,
                    maze = %session.maze_name,
                    score = session.score(),
                    elapsed_secs,
                    "session finished"
                ),
                MoveOutcome::Caught => tracing::debug!(
                    session = %session_id,
                    score = session.score(),
                    "player caught"
                ),
                MoveOutcome::None => {}
            }
            MoveResponse {
                ok: true,
                state: session.public_state(),
                status: outcome.status(),
                elapsed: outcome.elapsed_secs(),
            }
        };

        if let Some(entry) = finished {
            self.spawn_leaderboard_write(entry);
        }
        Ok(response)
    }

    pub async fn state(&self, session_id: &str) -> Result<PublicState, ServiceError> {
        let handle = self
            .sessions
            .get(session_id)
            .ok_or_else(|| ServiceError::session_not_found(session_id))?;
        let session = handle.lock().await;
        Ok(session.public_state())
    }

    pub async fn leaderboard(
        &self,
        requested_limit: Option<usize>,
    ) -> Result<LeaderboardResponse, ServiceError> {
        let gateway = Arc::clone(&self.leaderboard);
        let response = tokio::task::spawn_blocking(move || {
            build_response(gateway.as_ref(), requested_limit)
        })
        .await
        .map_err(|error| ServiceError::Internal(error.to_string()))??;
        Ok(response)
    }

    pub async fn submit_race(
        &self,
        room_id: &str,
        session_id: &str,
    ) -> Result<RaceStatus, ServiceError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| ServiceError::room_not_found(room_id))?;
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| ServiceError::session_not_found(session_id))?;

        let entrant = {
            let session = session.lock().await;
            Entrant {
                name: session.player_name.clone(),
                maze_index: session.maze_index,
                elapsed_secs: session.elapsed_secs(),
                score: session.score(),
            }
        };

        let status = room.lock().await.submit(session_id, &entrant)?;
        if let RaceStatus::Complete { results } = &status {
            tracing::info!(
                room = %room_id,
                winner = results.first().map(|r| r.player.as_str()).unwrap_or("-"),
                "race complete"
            );
        }
        Ok(status)
    }

    pub fn evict_idle(&self, now_ms: u64) -> usize {
        let sessions = self.sessions.evict_idle(now_ms);
        let rooms = self.rooms.evict_idle(now_ms);
        if sessions + rooms > 0 {
            tracing::info!(sessions, rooms, "evicted idle entities");
        }
        sessions + rooms
    }

    fn maze(&self, maze_index: usize) -> Result<&Maze, ServiceError> {
        self.catalog
            .get(maze_index)
            .ok_or_else(|| ServiceError::InvalidInput(format!("unknown maze index {maze_index}")))
    }

    fn new_session(&self, maze_index: usize, player_name: &str) -> Result<Session, ServiceError> {
        let maze = self.maze(maze_index)?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Session::new(
            maze,
            maze_index,
            player_name,
            self.options.enemy_count,
            &mut rng,
            now_ms(),
        ))
    }

    /// Fire-and-forget: the move has already been answered by the time this
    /// runs, and a slow or failing store only shows up in the logs.
    fn spawn_leaderboard_write(&self, entry: LeaderboardEntry) {
        let gateway = Arc::clone(&self.leaderboard);
        let timeout = self.options.leaderboard_timeout;
        tokio::spawn(async move {
            let player = entry.player.clone();
            let write = tokio::task::spawn_blocking(move || gateway.submit(entry));
            match tokio::time::timeout(timeout, write).await {
                Ok(Ok(Ok(()))) => tracing::debug!(%player, "leaderboard entry saved"),
                Ok(Ok(Err(error))) => {
                    tracing::warn!(%player, %error, "leaderboard write failed")
                }
                Ok(Err(error)) => {
                    tracing::warn!(%player, %error, "leaderboard write task panicked")
                }
                Err(_) => tracing::warn!(
                    %player,
                    timeout_ms = timeout.as_millis() as u64,
                    "leaderboard write timed out"
                ),
            }
        });
    }
}
