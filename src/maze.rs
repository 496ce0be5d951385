use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::types::{Cell, MazeInfo, Tile};

const FOREST_SMALL: [&str; 15] = [
    "###############",
    "#.*.#...#...*.#",
    "#.#.#.#.#.#.#.#",
    "#...*.#...#.#.#",
    "###.#.#.#.#...#",
    "#...#...#.#.#.#",
    "#*#.#.#.*.#.#.#",
    "#.#.#.#.#.#.#E#",
    "#.....#.#...#.#",
    "#.#.#.#.#.#.#.#",
    "#.#.....#.#...#",
    "#.#.###.#.###.#",
    "#...#.*.....#.#",
    "#*#.#.#.###.#.#",
    "###############",
];

const DENSE_GROVE: [&str; 15] = [
    "###############",
    "#...#.#.#.*..*#",
    "#.#.#.#.#.#.#.#",
    "#.#...#...#...#",
    "#.#.#.#.#.#.#.#",
    "#...#...#...#.#",
    "#.#.#.#.*.#.#.#",
    "#.#.#.#.#.#.#E#",
    "#*....#.#...#.#",
    "#.#.#.#.#.#.#.#",
    "#.#.....#.#...#",
    "#.#.###.#.###.#",
    "#..*#.*.....#.#",
    "#*#.#.#.###.#.#",
    "###############",
];

const OLD_TRACK: [&str; 15] = [
    "###############",
    "#*..#...#...*.#",
    "#.#.###.#.#.#.#",
    "#.#...#...#.#.#",
    "#.#.#.#.#.#...#",
    "#.#.#...#.#.#.#",
    "#*#.#.#.*.#.#.#",
    "#.#.#.#.#.#.#E#",
    "#.....#.#...#.#",
    "#.#.#.#.#.#.#.#",
    "#.#.....#.#...#",
    "#.#.###.#.###.#",
    "#...#.*.....#.#",
    "#*#.#.#.###.#.#",
    "###############",
];

#[derive(Debug, Error)]
pub enum MazeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid maze file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("maze catalog is empty")]
    EmptyCatalog,

    #[error("maze '{name}' has no rows")]
    EmptyGrid { name: String },

    #[error("maze '{name}' row {row} has {found} columns, expected {expected}")]
    Ragged {
        name: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("maze '{name}' has unknown tile '{ch}' at ({row}, {col})")]
    UnknownTile {
        name: String,
        row: usize,
        col: usize,
        ch: char,
    },

    #[error("maze '{name}' has no open path tile to spawn on")]
    NoSpawn { name: String },
}

/// Rectangular tile grid addressed by `Cell { row, col }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Parses rows of `#` (wall), `.` (path), `*` (bonus) and `E` (exit).
    pub fn parse<S: AsRef<str>>(name: &str, rows: &[S]) -> Result<Self, MazeError> {
        let Some(first) = rows.first() else {
            return Err(MazeError::EmptyGrid {
                name: name.to_string(),
            });
        };
        let cols = first.as_ref().chars().count();
        if cols == 0 {
            return Err(MazeError::EmptyGrid {
                name: name.to_string(),
            });
        }

        let mut tiles = Vec::with_capacity(rows.len() * cols);
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != cols {
                return Err(MazeError::Ragged {
                    name: name.to_string(),
                    row,
                    expected: cols,
                    found,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let tile = tile_from_char(ch).ok_or_else(|| MazeError::UnknownTile {
                    name: name.to_string(),
                    row,
                    col,
                    ch,
                })?;
                tiles.push(tile);
            }
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            tiles,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && (cell.row as usize) < self.rows
            && (cell.col as usize) < self.cols
    }

    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        self.index_of(cell).map(|idx| self.tiles[idx])
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.tile(cell).is_some_and(Tile::is_passable)
    }

    /// Returns false when the cell is out of bounds.
    pub fn set(&mut self, cell: Cell, tile: Tile) -> bool {
        match self.index_of(cell) {
            Some(idx) => {
                self.tiles[idx] = tile;
                true
            }
            None => false,
        }
    }

    /// First cell of the given kind scanning row-major from the origin.
    pub fn first_of(&self, kind: Tile) -> Option<Cell> {
        self.tiles
            .iter()
            .position(|tile| *tile == kind)
            .map(|idx| self.cell_at(idx))
    }

    pub fn cells_of(&self, kind: Tile) -> Vec<Cell> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == kind)
            .map(|(idx, _)| self.cell_at(idx))
            .collect()
    }

    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        self.tiles
            .chunks(self.cols)
            .map(|row| row.iter().map(|tile| tile.code()).collect())
            .collect()
    }

    fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some(cell.row as usize * self.cols + cell.col as usize)
    }

    fn cell_at(&self, idx: usize) -> Cell {
        Cell::new((idx / self.cols) as i32, (idx % self.cols) as i32)
    }
}

/// Read-only maze template. Sessions clone `grid` into their own working copy.
#[derive(Clone, Debug)]
pub struct Maze {
    pub name: String,
    pub grid: Grid,
}

impl Maze {
    pub fn parse<S: AsRef<str>>(name: &str, rows: &[S]) -> Result<Self, MazeError> {
        let grid = Grid::parse(name, rows)?;
        if grid.first_of(Tile::Path).is_none() {
            return Err(MazeError::NoSpawn {
                name: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            grid,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MazeFileEntry {
    name: String,
    tiles: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct MazeCatalog {
    mazes: Vec<Maze>,
}

impl MazeCatalog {
    pub fn builtin() -> Self {
        let mazes = [
            ("Forest Small", &FOREST_SMALL),
            ("Dense Grove", &DENSE_GROVE),
            ("Old Track", &OLD_TRACK),
        ]
        .into_iter()
        .filter_map(|(name, rows)| Maze::parse(name, rows.as_slice()).ok())
        .collect();
        Self { mazes }
    }

    pub fn from_mazes(mazes: Vec<Maze>) -> Result<Self, MazeError> {
        if mazes.is_empty() {
            return Err(MazeError::EmptyCatalog);
        }
        Ok(Self { mazes })
    }

    /// Loads `[{"name": "...", "tiles": ["###", "#.E", ...]}, ...]`.
    pub fn from_json_str(text: &str) -> Result<Self, MazeError> {
        let entries: Vec<MazeFileEntry> = serde_json::from_str(text)?;
        let mazes = entries
            .iter()
            .map(|entry| Maze::parse(&entry.name, &entry.tiles))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_mazes(mazes)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, MazeError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn get(&self, index: usize) -> Option<&Maze> {
        self.mazes.get(index)
    }

    pub fn len(&self) -> usize {
        self.mazes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mazes.is_empty()
    }

    pub fn infos(&self) -> Vec<MazeInfo> {
        self.mazes
            .iter()
            .enumerate()
            .map(|(index, maze)| MazeInfo {
                index,
                name: maze.name.clone(),
                rows: maze.grid.rows(),
                cols: maze.grid.cols(),
            })
            .collect()
    }
}

fn tile_from_char(ch: char) -> Option<Tile> {
    match ch {
        '.' => Some(Tile::Path),
        '#' => Some(Tile::Wall),
        '*' => Some(Tile::Bonus),
        'E' => Some(Tile::Exit),
        _ => None,
    }
}
