use clap::Parser;
use maze_race_server::constants::{BONUS_SCORE, DEFAULT_ENEMY_COUNT};
use maze_race_server::engine::pathfinder::shortest_path;
use maze_race_server::engine::{offset, Session};
use maze_race_server::maze::{Grid, Maze, MazeCatalog};
use maze_race_server::rng::Rng;
use maze_race_server::types::{Cell, Direction, LeaderboardEntry, MoveOutcome, Tile};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Simulated time between two bot moves.
const TURN_MS: u64 = 250;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays a maze headlessly with a scripted bot")]
struct Cli {
    #[arg(long, default_value_t = 0)]
    maze: usize,
    #[arg(long)]
    mazes: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = DEFAULT_ENEMY_COUNT)]
    enemies: usize,
    #[arg(long, default_value_t = 5)]
    games: u32,
    #[arg(long, default_value_t = 500)]
    max_turns: u32,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum GameEnd {
    Win,
    TurnLimit,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    game: u32,
    seed: u32,
    maze: String,
    end: GameEnd,
    turns: u32,
    score: i32,
    captures: u32,
    bonuses: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed: Option<f64>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    maze: String,
    seed: u32,
    games: usize,
    wins: usize,
    win_rate: f64,
    average_turns: f64,
    average_score: f64,
    anomaly_count: usize,
    results: Vec<GameResultLine>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = match &cli.mazes {
        Some(path) => match MazeCatalog::from_json_file(path) {
            Ok(catalog) => catalog,
            Err(error) => {
                tracing::error!(path = %path.display(), %error, "failed to load mazes");
                return ExitCode::from(2);
            }
        },
        None => MazeCatalog::builtin(),
    };
    let Some(maze) = catalog.get(cli.maze) else {
        tracing::error!(maze = cli.maze, available = catalog.len(), "unknown maze index");
        return ExitCode::from(2);
    };

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut results = Vec::new();
    for game in 0..cli.games {
        let game_seed = seed.wrapping_add(game);
        let result = run_game(maze, cli.maze, game, game_seed, cli.enemies, cli.max_turns);
        for anomaly in &result.anomalies {
            tracing::warn!(game, seed = game_seed, %anomaly, "anomaly detected");
        }
        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(error) => tracing::error!(game, %error, "failed to serialize result"),
        }
        results.push(result);
    }

    let summary = build_run_summary(&maze.name, seed, results);
    tracing::info!(
        games = summary.games,
        wins = summary.wins,
        average_turns = summary.average_turns,
        average_score = summary.average_score,
        "run finished"
    );

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            tracing::error!(path = %path.display(), %error, "summary write failed");
            return ExitCode::from(2);
        }
    }

    if summary.anomaly_count > 0 {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_game(
    maze: &Maze,
    maze_index: usize,
    game: u32,
    seed: u32,
    enemy_count: usize,
    max_turns: u32,
) -> GameResultLine {
    let mut rng = Rng::new(seed);
    let mut now_ms = 0u64;
    let mut session = Session::new(
        maze,
        maze_index,
        &format!("Bot-{:02}", game + 1),
        enemy_count,
        &mut rng,
        now_ms,
    );
    let exit = session.grid().first_of(Tile::Exit);

    let mut finished: Vec<LeaderboardEntry> = Vec::new();
    let mut turns = 0;
    let mut captures = 0;
    let mut bonuses = 0;
    let mut elapsed = None;
    let mut anomalies = Vec::new();

    while turns < max_turns && !session.is_finished() {
        let Some(goal) = exit else {
            anomalies.push("maze has no exit".to_string());
            break;
        };
        let dir = choose_direction(session.grid(), session.player(), session.enemies(), goal);
        let before = session.score();
        now_ms += TURN_MS;
        turns += 1;

        match session.apply_move(dir, now_ms, &mut finished) {
            MoveOutcome::Win { elapsed_secs } => elapsed = Some(elapsed_secs),
            MoveOutcome::Caught => captures += 1,
            MoveOutcome::None => {
                if session.score() == before + BONUS_SCORE {
                    bonuses += 1;
                }
            }
        }
        anomalies.extend(check_invariants(&session, turns));
    }

    if session.is_finished() && finished.len() != 1 {
        anomalies.push(format!("expected one finish record, got {}", finished.len()));
    }

    GameResultLine {
        game,
        seed,
        maze: maze.name.clone(),
        end: if session.is_finished() {
            GameEnd::Win
        } else {
            GameEnd::TurnLimit
        },
        turns,
        score: session.score(),
        captures,
        bonuses,
        elapsed,
        anomalies,
    }
}

/// Follows the shortest route to the exit unless its next cell is next to an
/// enemy, in which case any safe neighbour closer to the exit wins.
fn choose_direction(grid: &Grid, player: Cell, enemies: &[Cell], exit: Cell) -> Direction {
    let route = shortest_path(grid, player, exit);
    let Some(&next) = route.get(1) else {
        return Direction::None;
    };
    if !threatened(next, enemies) {
        return step_direction(player, next);
    }

    let mut best: Option<(usize, Direction)> = None;
    for dir in [Direction::Down, Direction::Up, Direction::Right, Direction::Left] {
        let candidate = offset(player, dir);
        if !grid.is_walkable(candidate) || threatened(candidate, enemies) {
            continue;
        }
        let remaining = shortest_path(grid, candidate, exit).len();
        if remaining == 0 {
            continue;
        }
        if best.map_or(true, |(len, _)| remaining < len) {
            best = Some((remaining, dir));
        }
    }
    best.map_or_else(|| step_direction(player, next), |(_, dir)| dir)
}

fn threatened(cell: Cell, enemies: &[Cell]) -> bool {
    enemies
        .iter()
        .any(|enemy| (enemy.row - cell.row).abs() + (enemy.col - cell.col).abs() <= 1)
}

fn step_direction(from: Cell, to: Cell) -> Direction {
    match (to.row - from.row, to.col - from.col) {
        (-1, 0) => Direction::Up,
        (1, 0) => Direction::Down,
        (0, -1) => Direction::Left,
        (0, 1) => Direction::Right,
        _ => Direction::None,
    }
}

fn check_invariants(session: &Session, turn: u32) -> Vec<String> {
    let mut anomalies = Vec::new();
    if !session.grid().is_walkable(session.player()) {
        anomalies.push(format!("turn {turn}: player on impassable tile"));
    }
    if session.score() < 0 {
        anomalies.push(format!("turn {turn}: negative score {}", session.score()));
    }
    for enemy in session.enemies() {
        if !session.grid().is_walkable(*enemy) {
            anomalies.push(format!("turn {turn}: enemy on impassable tile"));
        }
    }
    anomalies
}

fn build_run_summary(maze: &str, seed: u32, results: Vec<GameResultLine>) -> RunSummary {
    let games = results.len();
    let wins = results.iter().filter(|r| r.end == GameEnd::Win).count();
    let average = |total: f64| if games == 0 { 0.0 } else { total / games as f64 };
    RunSummary {
        maze: maze.to_string(),
        seed,
        games,
        wins,
        win_rate: average(wins as f64),
        average_turns: average(results.iter().map(|r| f64::from(r.turns)).sum()),
        average_score: average(results.iter().map(|r| f64::from(r.score)).sum()),
        anomaly_count: results.iter().map(|r| r.anomalies.len()).sum(),
        results,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, text)
}
