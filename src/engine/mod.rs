use crate::constants::{BONUS_SCORE, CAPTURE_PENALTY, EXIT_SCORE};
use crate::maze::{Grid, Maze};
use crate::rng::Rng;
use crate::types::{Cell, Direction, LeaderboardEntry, MoveOutcome, PublicState, Tile};

pub mod pathfinder;
mod utils;

pub use self::utils::{now_ms, offset};
use self::pathfinder::shortest_path;
use self::utils::elapsed_secs;

/// Receives the leaderboard record produced when a session reaches the exit.
///
/// Called while the caller still holds the session, so implementations should
/// only stash the entry; the actual write happens elsewhere.
pub trait FinishListener {
    fn on_finish(&mut self, entry: LeaderboardEntry);
}

impl FinishListener for Option<LeaderboardEntry> {
    fn on_finish(&mut self, entry: LeaderboardEntry) {
        *self = Some(entry);
    }
}

impl FinishListener for Vec<LeaderboardEntry> {
    fn on_finish(&mut self, entry: LeaderboardEntry) {
        self.push(entry);
    }
}

/// One player's game on a private copy of a maze.
#[derive(Clone, Debug)]
pub struct Session {
    pub maze_index: usize,
    pub maze_name: String,
    pub player_name: String,

    grid: Grid,
    spawn: Cell,
    player: Cell,
    enemies: Vec<Cell>,
    score: i32,
    started_at_ms: u64,
    finished_at_ms: Option<u64>,
}

impl Session {
    pub fn new(
        maze: &Maze,
        maze_index: usize,
        player_name: &str,
        enemy_count: usize,
        rng: &mut Rng,
        now_ms: u64,
    ) -> Self {
        let grid = maze.grid.clone();
        let spawn = grid.first_of(Tile::Path).unwrap_or(Cell::new(0, 0));

        let mut free: Vec<Cell> = grid
            .cells_of(Tile::Path)
            .into_iter()
            .filter(|cell| *cell != spawn)
            .collect();
        rng.shuffle(&mut free);
        free.truncate(enemy_count);

        Self {
            maze_index,
            maze_name: maze.name.clone(),
            player_name: player_name.to_string(),
            grid,
            spawn,
            player: spawn,
            enemies: free,
            score: 0,
            started_at_ms: now_ms,
            finished_at_ms: None,
        }
    }

    pub fn player(&self) -> Cell {
        self.player
    }

    pub fn enemies(&self) -> &[Cell] {
        &self.enemies
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn spawn(&self) -> Cell {
        self.spawn
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at_ms.is_some()
    }

    pub fn elapsed_secs(&self) -> Option<f64> {
        self.finished_at_ms
            .map(|finished| elapsed_secs(self.started_at_ms, finished))
    }

    pub fn public_state(&self) -> PublicState {
        PublicState {
            maze: self.grid.to_codes(),
            player: self.player,
            enemies: self.enemies.clone(),
            player_name: self.player_name.clone(),
            score: self.score,
            finished: self.is_finished(),
        }
    }

    /// Applies one player step, then one enemy step.
    ///
    /// Blocked, off-grid and standing moves leave the session untouched, as do
    /// moves on a finished session.
    pub fn apply_move<L: FinishListener>(
        &mut self,
        dir: Direction,
        now_ms: u64,
        listener: &mut L,
    ) -> MoveOutcome {
        if self.is_finished() || dir == Direction::None {
            return MoveOutcome::None;
        }

        let target = offset(self.player, dir);
        let Some(tile) = self.grid.tile(target) else {
            return MoveOutcome::None;
        };
        if !tile.is_passable() {
            return MoveOutcome::None;
        }

        self.player = target;
        match tile {
            Tile::Bonus => {
                self.grid.set(target, Tile::Path);
                self.score += BONUS_SCORE;
            }
            Tile::Exit => return self.finish(now_ms, listener),
            Tile::Path | Tile::Wall => {}
        }

        self.advance_enemies()
    }

    fn finish<L: FinishListener>(&mut self, now_ms: u64, listener: &mut L) -> MoveOutcome {
        self.finished_at_ms = Some(now_ms);
        self.score += EXIT_SCORE;
        let elapsed = elapsed_secs(self.started_at_ms, now_ms);
        listener.on_finish(LeaderboardEntry {
            player: self.player_name.clone(),
            maze: self.maze_name.clone(),
            time: elapsed,
            score: self.score,
            when_ms: now_ms,
        });
        MoveOutcome::Win {
            elapsed_secs: elapsed,
        }
    }

    fn advance_enemies(&mut self) -> MoveOutcome {
        for idx in 0..self.enemies.len() {
            let path = shortest_path(&self.grid, self.enemies[idx], self.player);
            if let Some(next) = path.get(1) {
                self.enemies[idx] = *next;
            }
            if self.enemies[idx] == self.player {
                self.capture();
                return MoveOutcome::Caught;
            }
        }
        MoveOutcome::None
    }

    fn capture(&mut self) {
        self.score = (self.score - CAPTURE_PENALTY).max(0);
        // Rescans the working grid, so a consumed bonus ahead of the cached
        // spawn becomes the new respawn point.
        self.player = self.grid.first_of(Tile::Path).unwrap_or(self.spawn);
    }
}
