pub const BONUS_SCORE: i32 = 25;
pub const EXIT_SCORE: i32 = 200;
pub const CAPTURE_PENALTY: i32 = 50;

pub const DEFAULT_ENEMY_COUNT: usize = 3;
pub const ROOM_CAPACITY: usize = 2;

pub const LEADERBOARD_MAX_ENTRIES: usize = 100;
pub const LEADERBOARD_WRITE_TIMEOUT_MS: u64 = 2_000;

pub const SESSION_TTL_MS: u64 = 60 * 60 * 1000;
pub const EVICTION_INTERVAL_MS: u64 = 60_000;

pub const MAX_NAME_LEN: usize = 16;
pub const SESSION_ID_LEN: usize = 24;
pub const ROOM_ID_LEN: usize = 8;
