use serde::{Deserialize, Serialize};
use strategy::ExitReason;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionExit {
    pub exit_price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub closed_at: OffsetDateTime,
    pub realized_pnl: f64,
    pub reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: String,
    pub name: String,
    pub entry_price: f64,
    pub invested_amount: f64,
    pub quantity: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub opened_at: OffsetDateTime,
    pub status: PositionStatus,
    pub exit: Option<PositionExit>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Flips the position to `Closed` and records its exit in one step.
    /// Returns `false` and leaves the position untouched if it was already closed.
    pub(crate) fn close(&mut self, exit: PositionExit) -> bool {
        if !self.is_open() {
            return false;
        }

        self.status = PositionStatus::Closed;
        self.exit = Some(exit);
        true
    }
}

/// Immutable record of one closed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub position_id: PositionId,
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub invested_amount: f64,
    pub realized_pnl: f64,
    pub capital_after: f64,
    pub exit_reason: ExitReason,
    #[serde(with = "time::serde::rfc3339")]
    pub opened_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub closed_at: OffsetDateTime,
}
