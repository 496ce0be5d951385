use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::LEADERBOARD_MAX_ENTRIES;
use crate::types::{LeaderboardEntry, LeaderboardResponse};

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ranked append-only score storage.
pub trait LeaderboardGateway: Send + Sync {
    fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError>;

    /// Best entries first: score descending, then elapsed time ascending.
    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

pub fn build_response(
    gateway: &dyn LeaderboardGateway,
    requested_limit: Option<usize>,
) -> Result<LeaderboardResponse, LeaderboardError> {
    let limit = requested_limit
        .unwrap_or(LEADERBOARD_MAX_ENTRIES)
        .clamp(1, LEADERBOARD_MAX_ENTRIES);
    Ok(LeaderboardResponse {
        generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        entries: gateway.top(limit)?,
    })
}

fn rank(entries: &[LeaderboardEntry], limit: usize) -> Vec<LeaderboardEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal))
    });
    ranked.truncate(limit);
    ranked
}

#[derive(Default)]
pub struct MemoryLeaderboard {
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaderboardGateway for MemoryLeaderboard {
    fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }

    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rank(&entries, limit))
    }
}

#[derive(Serialize)]
struct LeaderboardFile<'a> {
    version: u8,
    entries: &'a [LeaderboardEntry],
}

#[derive(Deserialize)]
struct LeaderboardFileRaw {
    version: u8,
    entries: Vec<serde_json::Value>,
}

/// Leaderboard persisted as a single versioned JSON document, rewritten on
/// every submission.
pub struct JsonFileLeaderboard {
    file_path: PathBuf,
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl JsonFileLeaderboard {
    pub fn new(file_path: PathBuf) -> Self {
        let entries = load_entries(&file_path);
        Self {
            file_path,
            entries: Mutex::new(entries),
        }
    }

    fn save(&self, entries: &[LeaderboardEntry]) -> Result<(), LeaderboardError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|source| LeaderboardError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_json::to_string_pretty(&LeaderboardFile {
            version: 1,
            entries,
        })?;
        fs::write(&self.file_path, text).map_err(|source| LeaderboardError::Io {
            path: self.file_path.clone(),
            source,
        })
    }
}

impl LeaderboardGateway for JsonFileLeaderboard {
    fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = entries.clone();
        candidate.push(entry);
        // Memory only changes once the file agrees with it.
        self.save(&candidate)?;
        *entries = candidate;
        Ok(())
    }

    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rank(&entries, limit))
    }
}

fn load_entries(path: &Path) -> Vec<LeaderboardEntry> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %error, "failed to read leaderboard");
            }
            return Vec::new();
        }
    };
    let parsed = match serde_json::from_str::<LeaderboardFileRaw>(&text) {
        Ok(value) if value.version == 1 => value,
        Ok(value) => {
            tracing::warn!(
                path = %path.display(),
                version = value.version,
                "unsupported leaderboard version"
            );
            return Vec::new();
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to parse leaderboard");
            return Vec::new();
        }
    };

    parsed
        .entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| match serde_json::from_value(raw) {
            Ok(entry) => sanitize_entry(entry),
            Err(error) => {
                tracing::warn!(path = %path.display(), idx, %error, "skipping leaderboard entry");
                None
            }
        })
        .collect()
}

fn sanitize_entry(entry: LeaderboardEntry) -> Option<LeaderboardEntry> {
    let player = entry.player.trim().to_string();
    if player.is_empty() {
        return None;
    }
    if !entry.time.is_finite() || entry.time < 0.0 {
        return None;
    }
    Some(LeaderboardEntry {
        player,
        score: entry.score.max(0),
        ..entry
    })
}
