use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{Cell, Direction};

pub fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

pub fn offset(cell: Cell, dir: Direction) -> Cell {
    match dir {
        Direction::Up => Cell::new(cell.row - 1, cell.col),
        Direction::Down => Cell::new(cell.row + 1, cell.col),
        Direction::Left => Cell::new(cell.row, cell.col - 1),
        Direction::Right => Cell::new(cell.row, cell.col + 1),
        Direction::None => cell,
    }
}

pub(super) fn elapsed_secs(started_at_ms: u64, finished_at_ms: u64) -> f64 {
    finished_at_ms.saturating_sub(started_at_ms) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_moves_one_cell_per_direction() {
        let origin = Cell::new(4, 4);
        assert_eq!(offset(origin, Direction::Up), Cell::new(3, 4));
        assert_eq!(offset(origin, Direction::Down), Cell::new(5, 4));
        assert_eq!(offset(origin, Direction::Left), Cell::new(4, 3));
        assert_eq!(offset(origin, Direction::Right), Cell::new(4, 5));
        assert_eq!(offset(origin, Direction::None), origin);
    }

    #[test]
    fn now_ms_is_epoch_millis() {
        let before = now_ms();
        assert!(before > 1_600_000_000_000);
        assert!(now_ms() >= before);
    }

    #[test]
    fn elapsed_never_goes_negative() {
        assert_eq!(elapsed_secs(1_000, 11_000), 10.0);
        assert_eq!(elapsed_secs(5_000, 1_000), 0.0);
    }
}
