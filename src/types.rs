use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Unknown directions turn into a standing move instead of an error.
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse_move(value.trim()).unwrap_or(Self::None)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Path,
    Wall,
    Bonus,
    Exit,
}

impl Tile {
    pub fn code(self) -> u8 {
        match self {
            Self::Path => 0,
            Self::Wall => 1,
            Self::Bonus => 2,
            Self::Exit => 3,
        }
    }

    pub fn is_passable(self) -> bool {
        self != Self::Wall
    }
}

/// Grid coordinate. Serialized as `[row, col]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "[i32; 2]")]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl From<Cell> for [i32; 2] {
    fn from(cell: Cell) -> Self {
        [cell.row, cell.col]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    None,
    Win,
    Caught,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveOutcome {
    None,
    Win { elapsed_secs: f64 },
    Caught,
}

impl MoveOutcome {
    pub fn status(&self) -> MoveStatus {
        match self {
            Self::None => MoveStatus::None,
            Self::Win { .. } => MoveStatus::Win,
            Self::Caught => MoveStatus::Caught,
        }
    }

    pub fn elapsed_secs(&self) -> Option<f64> {
        match self {
            Self::Win { elapsed_secs } => Some(*elapsed_secs),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PublicState {
    pub maze: Vec<Vec<u8>>,
    pub player: Cell,
    pub enemies: Vec<Cell>,
    pub player_name: String,
    pub score: i32,
    pub finished: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct MoveResponse {
    pub ok: bool,
    pub state: PublicState,
    pub status: MoveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: String,
    pub maze: String,
    pub time: f64,
    pub score: i32,
    #[serde(alias = "whenMs")]
    pub when_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardResponse {
    pub generated_at_iso: String,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RaceResult {
    pub player: String,
    pub time: f64,
    pub score: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RaceStatus {
    Waiting,
    Complete { results: Vec<RaceResult> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StartedSession {
    pub session_id: String,
    pub room: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MazeInfo {
    pub index: usize,
    pub name: String,
    pub rows: usize,
    pub cols: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    Single,
    Race,
}

impl GameMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" | "solo" => Some(Self::Single),
            "race" => Some(Self::Race),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_direction_becomes_standing_move() {
        assert_eq!(Direction::parse_lenient("up"), Direction::Up);
        assert_eq!(Direction::parse_lenient(" left "), Direction::Left);
        assert_eq!(Direction::parse_lenient("diagonal"), Direction::None);
        assert_eq!(Direction::parse_move("diagonal"), None);
    }

    #[test]
    fn cell_serializes_as_pair() {
        let value = serde_json::to_value(Cell::new(3, 7)).expect("serialize cell");
        assert_eq!(value, serde_json::json!([3, 7]));
    }

    #[test]
    fn race_status_is_tagged() {
        let waiting = serde_json::to_value(RaceStatus::Waiting).expect("serialize");
        assert_eq!(waiting, serde_json::json!({"status": "waiting"}));
        let complete = serde_json::to_value(RaceStatus::Complete {
            results: vec![RaceResult {
                player: "B".to_string(),
                time: 5.0,
                score: 200,
            }],
        })
        .expect("serialize");
        assert_eq!(complete["status"], "complete");
        assert_eq!(complete["results"][0]["player"], "B");
    }

    #[test]
    fn leaderboard_fields_are_snake_case() {
        let entry = LeaderboardEntry {
            player: "A".to_string(),
            maze: "Old Track".to_string(),
            time: 12.5,
            score: 200,
            when_ms: 42,
        };
        let response = serde_json::to_value(LeaderboardResponse {
            generated_at_iso: "2026-01-01T00:00:00.000Z".to_string(),
            entries: vec![entry.clone()],
        })
        .expect("serialize");
        assert!(response.get("generated_at_iso").is_some());
        assert_eq!(response["entries"][0]["when_ms"], 42);
        assert!(response["entries"][0].get("whenMs").is_none());

        let legacy: LeaderboardEntry = serde_json::from_value(serde_json::json!({
            "player": "A", "maze": "Old Track", "time": 12.5, "score": 200, "whenMs": 42
        }))
        .expect("legacy field name still loads");
        assert_eq!(legacy, entry);
    }

    #[test]
    fn tile_codes_are_stable() {
        assert_eq!(Tile::Path.code(), 0);
        assert_eq!(Tile::Wall.code(), 1);
        assert_eq!(Tile::Bonus.code(), 2);
        assert_eq!(Tile::Exit.code(), 3);
        assert!(!Tile::Wall.is_passable());
        assert!(Tile::Bonus.is_passable());
    }
}
