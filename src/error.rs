use thiserror::Error;

use crate::leaderboard::LeaderboardError;
use crate::room::RoomError;
use crate::server_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn session_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "session",
            id: id.to_string(),
        }
    }

    pub fn room_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "room",
            id: id.to_string(),
        }
    }

    /// Caller mistakes, as opposed to failures on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::InvalidInput(_) | Self::Room(_)
        )
    }
}

impl From<ProtocolError> for ServiceError {
    fn from(error: ProtocolError) -> Self {
        Self::InvalidInput(error.0)
    }
}
