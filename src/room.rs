use thiserror::Error;

use crate::constants::ROOM_CAPACITY;
use crate::types::{RaceResult, RaceStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("maze mismatch: room plays maze {room_maze}, session plays maze {session_maze}")]
    MazeMismatch {
        room_maze: usize,
        session_maze: usize,
    },

    #[error("room is full ({capacity} players)")]
    RoomFull { capacity: usize },

    #[error("session not finished")]
    NotFinished,
}

/// What a room needs to know about a session at submission time.
#[derive(Clone, Debug)]
pub struct Entrant {
    pub name: String,
    pub maze_index: usize,
    pub elapsed_secs: Option<f64>,
    pub score: i32,
}

/// Asynchronous race: participants play the same maze on their own and
/// compare finish times afterwards.
#[derive(Clone, Debug)]
pub struct Room {
    pub id: String,
    pub maze_index: usize,
    participants: Vec<String>,
    results: Vec<(String, RaceResult)>,
}

impl Room {
    pub fn new(id: String, maze_index: usize) -> Self {
        Self {
            id,
            maze_index,
            participants: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// Joining twice with the same session is a no-op.
    pub fn join(&mut self, session_id: &str, session_maze: usize) -> Result<(), RoomError> {
        if session_maze != self.maze_index {
            return Err(RoomError::MazeMismatch {
                room_maze: self.maze_index,
                session_maze,
            });
        }
        if self.participants.iter().any(|id| id == session_id) {
            return Ok(());
        }
        if self.participants.len() >= ROOM_CAPACITY {
            return Err(RoomError::RoomFull {
                capacity: ROOM_CAPACITY,
            });
        }
        self.participants.push(session_id.to_string());
        Ok(())
    }

    /// Records a finished run. A repeated submission replaces the earlier one.
    pub fn submit(&mut self, session_id: &str, entrant: &Entrant) -> Result<RaceStatus, RoomError> {
        if entrant.maze_index != self.maze_index {
            return Err(RoomError::MazeMismatch {
                room_maze: self.maze_index,
                session_maze: entrant.maze_index,
            });
        }
        let Some(elapsed) = entrant.elapsed_secs else {
            return Err(RoomError::NotFinished);
        };
        let result = RaceResult {
            player: entrant.name.clone(),
            time: elapsed,
            score: entrant.score,
        };
        match self.results.iter_mut().find(|(id, _)| id == session_id) {
            Some((_, existing)) => *existing = result,
            None => self.results.push((session_id.to_string(), result)),
        }
        Ok(self.status())
    }

    pub fn status(&self) -> RaceStatus {
        if self.participants.len() < 2 || self.results.len() < 2 {
            return RaceStatus::Waiting;
        }
        let mut results: Vec<RaceResult> =
            self.results.iter().map(|(_, result)| result.clone()).collect();
        results.sort_by(|a, b| a.time.total_cmp(&b.time));
        RaceStatus::Complete { results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(name: &str, elapsed: f64) -> Entrant {
        Entrant {
            name: name.to_string(),
            maze_index: 0,
            elapsed_secs: Some(elapsed),
            score: 200,
        }
    }

    fn names(status: &RaceStatus) -> Vec<String> {
        match status {
            RaceStatus::Complete { results } => results.iter().map(|r| r.player.clone()).collect(),
            RaceStatus::Waiting => panic!("expected a completed race"),
        }
    }

    #[test]
    fn faster_finisher_is_listed_first() {
        let mut room = Room::new("r1".to_string(), 0);
        room.join("a", 0).expect("join a");
        room.join("b", 0).expect("join b");

        let first = room.submit("a", &finished("A", 10.0)).expect("submit a");
        assert_eq!(first, RaceStatus::Waiting);
        let second = room.submit("b", &finished("B", 5.0)).expect("submit b");
        assert_eq!(names(&second), vec!["B", "A"]);
    }

    #[test]
    fn mismatched_maze_is_rejected_without_joining() {
        let mut room = Room::new("r1".to_string(), 1);
        assert_eq!(
            room.join("a", 2),
            Err(RoomError::MazeMismatch {
                room_maze: 1,
                session_maze: 2
            })
        );
        assert!(room.participants().is_empty());
    }

    #[test]
    fn third_participant_is_rejected() {
        let mut room = Room::new("r1".to_string(), 0);
        room.join("a", 0).expect("join a");
        room.join("b", 0).expect("join b");
        room.join("a", 0).expect("rejoin is idempotent");
        assert_eq!(room.join("c", 0), Err(RoomError::RoomFull { capacity: 2 }));
        assert_eq!(room.participants(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn unfinished_session_cannot_submit() {
        let mut room = Room::new("r1".to_string(), 0);
        room.join("a", 0).expect("join a");
        let unfinished = Entrant {
            elapsed_secs: None,
            ..finished("A", 0.0)
        };
        assert_eq!(room.submit("a", &unfinished), Err(RoomError::NotFinished));
        assert_eq!(room.status(), RaceStatus::Waiting);
    }

    #[test]
    fn resubmission_overwrites_previous_result() {
        let mut room = Room::new("r1".to_string(), 0);
        room.join("a", 0).expect("join a");
        room.join("b", 0).expect("join b");
        room.submit("a", &finished("A", 10.0)).expect("submit a");
        assert_eq!(
            room.submit("a", &finished("A", 3.0)).expect("resubmit a"),
            RaceStatus::Waiting
        );

        let status = room.submit("b", &finished("B", 5.0)).expect("submit b");
        match status {
            RaceStatus::Complete { results } => {
                assert_eq!(results.len(), 2);
                assert_eq!(results[0].player, "A");
                assert_eq!(results[0].time, 3.0);
            }
            RaceStatus::Waiting => panic!("expected a completed race"),
        }
    }

    #[test]
    fn run_on_another_maze_cannot_complete_the_race() {
        let mut room = Room::new("r1".to_string(), 0);
        room.join("a", 0).expect("join a");
        room.join("b", 0).expect("join b");
        room.submit("a", &finished("A", 4.0)).expect("submit a");

        let elsewhere = Entrant {
            maze_index: 1,
            ..finished("X", 1.0)
        };
        assert_eq!(
            room.submit("x", &elsewhere),
            Err(RoomError::MazeMismatch {
                room_maze: 0,
                session_maze: 1
            })
        );
        assert_eq!(room.status(), RaceStatus::Waiting);
    }

    #[test]
    fn single_participant_keeps_waiting() {
        let mut room = Room::new("r1".to_string(), 0);
        room.join("a", 0).expect("join a");
        room.submit("a", &finished("A", 4.0)).expect("submit a");
        room.submit("ghost", &finished("Ghost", 2.0)).expect("submit outsider");
        assert_eq!(room.status(), RaceStatus::Waiting);
    }
}
