use core_sim::{HistoryRecord, Position};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientCapital,
    InvalidEntryPrice,
    MaxOpenPositions,
}

/// Events published by the session for live observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SessionEvent {
    Connected,
    PositionOpened {
        tick: u64,
        position: Position,
    },
    PositionClosed {
        tick: u64,
        record: HistoryRecord,
    },
    CandidateSkipped {
        tick: u64,
        symbol: String,
        reason: SkipReason,
    },
    FeedUnavailable {
        tick: u64,
        reason: String,
    },
    CycleCompleted {
        tick: u64,
        available_capital: f64,
        open_positions: usize,
        closed_this_cycle: usize,
    },
}
