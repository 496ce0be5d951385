use serde_json::{Map, Value};
use thiserror::Error;

use crate::server_utils::{normalize_room_id, sanitize_name};
use crate::types::{Direction, GameMode};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid request: {0}")]
pub struct ProtocolError(pub String);

#[derive(Debug, PartialEq)]
pub struct StartSessionRequest {
    pub maze_index: usize,
    pub player_name: String,
    pub mode: GameMode,
    pub room: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct JoinRoomRequest {
    pub room: String,
    pub maze_index: usize,
    pub player_name: String,
}

#[derive(Debug, PartialEq)]
pub struct MoveRequest {
    pub session_id: String,
    pub dir: Direction,
}

#[derive(Debug, PartialEq)]
pub struct SubmitRaceRequest {
    pub room: String,
    pub session_id: String,
}

pub fn parse_start_session(body: &Value) -> Result<StartSessionRequest, ProtocolError> {
    let object = as_object(body)?;
    let mode = match optional_str(object, "mode")? {
        None => GameMode::Single,
        Some(raw) => GameMode::parse(raw)
            .ok_or_else(|| ProtocolError(format!("unknown mode '{raw}'")))?,
    };
    Ok(StartSessionRequest {
        maze_index: parse_maze_index(object.get("maze_index"))?,
        player_name: sanitize_name(optional_str(object, "player_name")?.unwrap_or_default()),
        mode,
        room: normalize_room_id(optional_str(object, "room")?),
    })
}

pub fn parse_create_room(body: &Value) -> Result<usize, ProtocolError> {
    parse_maze_index(as_object(body)?.get("maze_index"))
}

pub fn parse_join_room(body: &Value) -> Result<JoinRoomRequest, ProtocolError> {
    let object = as_object(body)?;
    Ok(JoinRoomRequest {
        room: required_id(object, "room")?,
        maze_index: parse_maze_index(object.get("maze_index"))?,
        player_name: sanitize_name(optional_str(object, "player_name")?.unwrap_or_default()),
    })
}

/// Unknown directions are accepted and treated as standing still.
pub fn parse_move(body: &Value) -> Result<MoveRequest, ProtocolError> {
    let object = as_object(body)?;
    let dir = optional_str(object, "dir")?
        .map(Direction::parse_lenient)
        .unwrap_or(Direction::None);
    Ok(MoveRequest {
        session_id: required_id(object, "session_id")?,
        dir,
    })
}

pub fn parse_submit_race(body: &Value) -> Result<SubmitRaceRequest, ProtocolError> {
    let object = as_object(body)?;
    Ok(SubmitRaceRequest {
        room: required_id(object, "room")?,
        session_id: required_id(object, "session_id")?,
    })
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ProtocolError> {
    body.as_object()
        .ok_or_else(|| ProtocolError("body must be a JSON object".to_string()))
}

fn optional_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, ProtocolError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(ProtocolError(format!("'{key}' must be a string"))),
    }
}

fn required_id(object: &Map<String, Value>, key: &str) -> Result<String, ProtocolError> {
    optional_str(object, key)?
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProtocolError(format!("'{key}' is required")))
}

/// Missing means the first maze. Accepts integers, integral floats and
/// numeric strings.
fn parse_maze_index(value: Option<&Value>) -> Result<usize, ProtocolError> {
    let invalid = || ProtocolError("'maze_index' must be a non-negative integer".to_string());
    let Some(value) = value else {
        return Ok(0);
    };
    if let Some(number) = value.as_u64() {
        return usize::try_from(number).map_err(|_| invalid());
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() && number >= 0.0 && number.fract() == 0.0 && number <= u32::MAX as f64
        {
            return Ok(number as usize);
        }
        return Err(invalid());
    }
    if let Some(text) = value.as_str() {
        return text.trim().parse::<usize>().map_err(|_| invalid());
    }
    if value.is_null() {
        return Ok(0);
    }
    Err(invalid())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn start_session_defaults() {
        let parsed = parse_start_session(&json!({})).expect("empty body is valid");
        assert_eq!(
            parsed,
            StartSessionRequest {
                maze_index: 0,
                player_name: "Player".to_string(),
                mode: GameMode::Single,
                room: None,
            }
        );
    }

    #[test]
    fn start_session_race_with_room() {
        let parsed = parse_start_session(
            &json!({"maze_index": "2", "player_name": "  Alice ", "mode": "race", "room": " ab12cd34 "}),
        )
        .expect("race body should parse");
        assert_eq!(parsed.maze_index, 2);
        assert_eq!(parsed.player_name, "Alice");
        assert_eq!(parsed.mode, GameMode::Race);
        assert_eq!(parsed.room.as_deref(), Some("ab12cd34"));
    }

    #[test]
    fn start_session_rejects_bad_shapes() {
        assert!(parse_start_session(&json!([])).is_err());
        assert!(parse_start_session(&json!({"mode": "coop"})).is_err());
        assert!(parse_start_session(&json!({"player_name": 5})).is_err());
        assert!(parse_start_session(&json!({"maze_index": -1})).is_err());
        assert!(parse_start_session(&json!({"maze_index": 1.5})).is_err());
        assert!(parse_start_session(&json!({"maze_index": "abc"})).is_err());
    }

    #[test]
    fn maze_index_accepts_integral_float() {
        assert_eq!(parse_create_room(&json!({"maze_index": 2.0})), Ok(2));
        assert_eq!(parse_create_room(&json!({"maze_index": null})), Ok(0));
    }

    #[test]
    fn move_treats_unknown_direction_as_standing() {
        let parsed = parse_move(&json!({"session_id": "s1", "dir": "sideways"}))
            .expect("move should parse");
        assert_eq!(parsed.dir, Direction::None);

        let parsed = parse_move(&json!({"session_id": "s1", "dir": "down"}))
            .expect("move should parse");
        assert_eq!(parsed.dir, Direction::Down);
    }

    #[test]
    fn move_requires_session_id() {
        assert!(parse_move(&json!({"dir": "up"})).is_err());
        assert!(parse_move(&json!({"session_id": "   ", "dir": "up"})).is_err());
    }

    #[test]
    fn join_and_submit_require_room() {
        assert!(parse_join_room(&json!({"maze_index": 0})).is_err());
        assert!(parse_submit_race(&json!({"session_id": "s"})).is_err());
        let parsed =
            parse_submit_race(&json!({"room": "r", "session_id": "s"})).expect("valid submit");
        assert_eq!(parsed.room, "r");
        assert_eq!(parsed.session_id, "s");
    }
}
