use std::collections::{HashMap, VecDeque};

use crate::maze::Grid;
use crate::types::Cell;

/// Neighbor expansion order. Changing it changes which of several equally
/// short routes an enemy takes.
const STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Breadth-first shortest path from `start` to `goal`, both inclusive.
///
/// Walls are impassable and every other tile costs one step. Returns an empty
/// path when the goal is out of bounds, is a wall, or cannot be reached.
pub fn shortest_path(grid: &Grid, start: Cell, goal: Cell) -> Vec<Cell> {
    if !grid.in_bounds(start) || !grid.is_walkable(goal) {
        return Vec::new();
    }

    let mut prev: HashMap<Cell, Option<Cell>> = HashMap::new();
    let mut queue = VecDeque::new();
    prev.insert(start, None);
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            break;
        }
        for (dr, dc) in STEPS {
            let next = Cell::new(cell.row + dr, cell.col + dc);
            if !grid.is_walkable(next) || prev.contains_key(&next) {
                continue;
            }
            prev.insert(next, Some(cell));
            queue.push_back(next);
        }
    }

    if !prev.contains_key(&goal) {
        return Vec::new();
    }

    let mut path = Vec::new();
    let mut cursor = Some(goal);
    while let Some(cell) = cursor {
        path.push(cell);
        cursor = prev.get(&cell).copied().flatten();
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn grid(rows: &[&str]) -> Grid {
        Grid::parse("test", rows).expect("valid grid")
    }

    fn assert_adjacent_without_repeats(path: &[Cell]) {
        let unique: HashSet<_> = path.iter().collect();
        assert_eq!(unique.len(), path.len(), "path revisits a cell");
        for pair in path.windows(2) {
            let dist = (pair[0].row - pair[1].row).abs() + (pair[0].col - pair[1].col).abs();
            assert_eq!(dist, 1, "{:?} -> {:?} is not a single step", pair[0], pair[1]);
        }
    }

    #[test]
    fn open_grid_path_length_matches_manhattan_distance() {
        let open = grid(&["......", "......", "......", "......", "......"]);
        for (start, goal) in [
            (Cell::new(0, 0), Cell::new(4, 5)),
            (Cell::new(2, 3), Cell::new(0, 0)),
            (Cell::new(4, 0), Cell::new(4, 5)),
        ] {
            let path = shortest_path(&open, start, goal);
            let manhattan = (start.row - goal.row).abs() + (start.col - goal.col).abs();
            assert_eq!(path.len() as i32, manhattan + 1);
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&goal));
            assert_adjacent_without_repeats(&path);
        }
    }

    #[test]
    fn routes_around_walls() {
        let maze = grid(&[".#...", ".#.#.", "...#."]);
        let path = shortest_path(&maze, Cell::new(0, 0), Cell::new(0, 4));
        // down 2, right 2, up 2, right 2 is the only way through.
        assert_eq!(path.len(), 9);
        assert_adjacent_without_repeats(&path);
        assert!(path.iter().all(|cell| maze.is_walkable(*cell)));
    }

    #[test]
    fn unreachable_or_invalid_goals_yield_empty_path() {
        let maze = grid(&["..#..", "..#..", "..#.."]);
        assert!(shortest_path(&maze, Cell::new(0, 0), Cell::new(0, 4)).is_empty());
        assert!(shortest_path(&maze, Cell::new(0, 0), Cell::new(0, 2)).is_empty());
        assert!(shortest_path(&maze, Cell::new(0, 0), Cell::new(9, 9)).is_empty());
        assert!(shortest_path(&maze, Cell::new(-1, 0), Cell::new(0, 1)).is_empty());
    }

    #[test]
    fn start_equal_to_goal_is_single_cell() {
        let maze = grid(&["..", ".."]);
        assert_eq!(
            shortest_path(&maze, Cell::new(1, 1), Cell::new(1, 1)),
            vec![Cell::new(1, 1)]
        );
    }

    #[test]
    fn ties_prefer_moving_down_first() {
        let open = grid(&["..", ".."]);
        let path = shortest_path(&open, Cell::new(0, 0), Cell::new(1, 1));
        assert_eq!(path, vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(1, 1)]);

        let path = shortest_path(&open, Cell::new(1, 1), Cell::new(0, 0));
        assert_eq!(path, vec![Cell::new(1, 1), Cell::new(0, 1), Cell::new(0, 0)]);
    }

    #[test]
    fn bonus_and_exit_tiles_are_passable() {
        let maze = grid(&["*E*"]);
        let path = shortest_path(&maze, Cell::new(0, 0), Cell::new(0, 2));
        assert_eq!(path.len(), 3);
    }
}
