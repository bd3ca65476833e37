use core_sim::{HistoryRecord, Position, PositionBook};
use serde::Serialize;
use time::OffsetDateTime;

/// Consistent point-in-time view of a session, published after every cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub available_capital: f64,
    pub starting_capital: f64,
    pub open_position_count: usize,
    pub closed_position_count: u64,
    pub realized_pnl_total: f64,
    pub last_result: Option<HistoryRecord>,
    pub cycles_completed: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_cycle_at: Option<OffsetDateTime>,
    pub open_positions: Vec<Position>,
}

impl StatusSnapshot {
    pub fn capture(
        book: &PositionBook,
        last_result: Option<&HistoryRecord>,
        cycles_completed: u64,
        last_cycle_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            available_capital: book.available_capital(),
            starting_capital: book.starting_capital(),
            open_position_count: book.open_positions().len(),
            closed_position_count: book.closed_count(),
            realized_pnl_total: book.realized_pnl_total(),
            last_result: last_result.cloned(),
            cycles_completed,
            last_cycle_at,
            open_positions: book.open_positions().to_vec(),
        }
    }
}
