use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::constants::{DEFAULT_ENEMY_COUNT, LEADERBOARD_WRITE_TIMEOUT_MS, SESSION_TTL_MS};
use crate::maze::{MazeCatalog, MazeError};
use crate::service::GameServiceOptions;

/// Server settings. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Maze race game server")]
pub struct ServerConfig {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(long, env = "LEADERBOARD_PATH", default_value = ".data/leaderboard.json")]
    pub leaderboard_path: PathBuf,

    /// JSON maze catalog; the built-in mazes are used when unset.
    #[arg(long, env = "MAZES_PATH")]
    pub mazes: Option<PathBuf>,

    #[arg(long, env = "ENEMY_COUNT", default_value_t = DEFAULT_ENEMY_COUNT)]
    pub enemies: usize,

    /// Idle time before a session or room is dropped. 0 keeps them forever.
    #[arg(long, env = "SESSION_TTL_SECS", default_value_t = SESSION_TTL_MS / 1000)]
    pub session_ttl_secs: u64,

    #[arg(long, env = "LEADERBOARD_TIMEOUT_MS", default_value_t = LEADERBOARD_WRITE_TIMEOUT_MS)]
    pub leaderboard_timeout_ms: u64,

    #[arg(long, env = "GAME_SEED")]
    pub seed: Option<u32>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn session_ttl_ms(&self) -> Option<u64> {
        (self.session_ttl_secs > 0).then(|| self.session_ttl_secs * 1000)
    }

    pub fn service_options(&self) -> GameServiceOptions {
        GameServiceOptions {
            enemy_count: self.enemies,
            leaderboard_timeout: Duration::from_millis(self.leaderboard_timeout_ms),
            seed: self.seed,
        }
    }

    pub fn load_catalog(&self) -> Result<MazeCatalog, MazeError> {
        match &self.mazes {
            Some(path) => MazeCatalog::from_json_file(path),
            None => Ok(MazeCatalog::builtin()),
        }
    }
}
