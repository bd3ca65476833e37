use strategy::{Candidate, ExitRules};
use time::OffsetDateTime;
use tracing::{error, info};

use crate::config::BookConfig;
use crate::ledger::{CapitalLedger, LedgerError};
use crate::position::{HistoryRecord, Position, PositionExit, PositionId, PositionStatus};
use crate::sampler::PriceSampler;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpenError {
    #[error("candidate {symbol} has no usable entry price (got {price})")]
    InvalidEntryPrice { symbol: String, price: f64 },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl OpenError {
    pub fn is_insufficient_capital(&self) -> bool {
        matches!(
            self,
            Self::Ledger(LedgerError::InsufficientCapital { .. })
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("position {0:?} is not open in this book")]
pub struct UnknownPosition(pub PositionId);

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Unchanged,
    Closed(HistoryRecord),
}

/// Owns the capital ledger and every open position. Positions leave the book
/// by value the cycle they close.
#[derive(Debug, Clone)]
pub struct PositionBook {
    ledger: CapitalLedger,
    rules: ExitRules,
    open: Vec<Position>,
    next_id: u64,
    starting_capital: f64,
    realized_pnl_total: f64,
    closed_count: u64,
}

impl PositionBook {
    pub fn new(config: BookConfig, rules: ExitRules) -> Self {
        Self {
            ledger: CapitalLedger::new(config.starting_capital),
            rules,
            open: Vec::new(),
            next_id: 0,
            starting_capital: config.starting_capital,
            realized_pnl_total: 0.0,
            closed_count: 0,
        }
    }

    pub fn available_capital(&self) -> f64 {
        self.ledger.available()
    }

    pub fn starting_capital(&self) -> f64 {
        self.starting_capital
    }

    pub fn realized_pnl_total(&self) -> f64 {
        self.realized_pnl_total
    }

    pub fn closed_count(&self) -> u64 {
        self.closed_count
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.open
    }

    /// Capital held in open positions plus what is still available.
    pub fn committed_capital(&self) -> f64 {
        self.ledger.available()
            + self
                .open
                .iter()
                .map(|position| position.invested_amount)
                .sum::<f64>()
    }

    pub fn open_position(
        &mut self,
        candidate: &Candidate,
        invest_per_trade: f64,
        now: OffsetDateTime,
    ) -> Result<Position, OpenError> {
        let entry_price = candidate.price;
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(OpenError::InvalidEntryPrice {
                symbol: candidate.symbol.clone(),
                price: entry_price,
            });
        }

        self.ledger.reserve(invest_per_trade)?;

        self.next_id += 1;
        let position = Position {
            id: PositionId(self.next_id),
            symbol: candidate.symbol.clone(),
            name: candidate.name.clone(),
            entry_price,
            invested_amount: invest_per_trade,
            quantity: invest_per_trade / entry_price,
            opened_at: now,
            status: PositionStatus::Open,
            exit: None,
        };

        info!(
            position_id = position.id.0,
            symbol = %position.symbol,
            entry_price,
            quantity = position.quantity,
            available_capital = self.ledger.available(),
            "position opened"
        );

        self.open.push(position.clone());
        Ok(position)
    }

    /// Evaluates one open position against a price sample. A position that
    /// closes is removed from the book.
    pub fn evaluate(
        &mut self,
        id: PositionId,
        now: OffsetDateTime,
        price_sample: f64,
    ) -> Result<Evaluation, UnknownPosition> {
        let index = self
            .open
            .iter()
            .position(|position| position.id == id)
            .ok_or(UnknownPosition(id))?;

        let outcome = evaluate_position(
            &mut self.ledger,
            &self.rules,
            &mut self.open[index],
            now,
            price_sample,
        );
        if let Evaluation::Closed(record) = &outcome {
            self.record_close(record);
            self.open.remove(index);
        }

        Ok(outcome)
    }

    /// Samples and evaluates every open position, returning the records of the
    /// ones that closed.
    pub fn evaluate_open(
        &mut self,
        now: OffsetDateTime,
        sampler: &mut dyn PriceSampler,
    ) -> Vec<HistoryRecord> {
        let mut closed = Vec::new();

        for position in &mut self.open {
            let sample = sampler.sample(position);
            if let Evaluation::Closed(record) =
                evaluate_position(&mut self.ledger, &self.rules, position, now, sample)
            {
                closed.push(record);
            }
        }

        self.open.retain(Position::is_open);
        for record in &closed {
            self.record_close(record);
        }
        closed
    }

    fn record_close(&mut self, record: &HistoryRecord) {
        self.realized_pnl_total += record.realized_pnl;
        self.closed_count += 1;
    }
}

/// Applies the exit rules to one position. Closed positions are left alone.
pub fn evaluate_position(
    ledger: &mut CapitalLedger,
    rules: &ExitRules,
    position: &mut Position,
    now: OffsetDateTime,
    price_sample: f64,
) -> Evaluation {
    if !position.is_open() {
        return Evaluation::Unchanged;
    }

    let held_for = now - position.opened_at;
    let Some(decision) = rules.decide(position.entry_price, price_sample, held_for) else {
        return Evaluation::Unchanged;
    };

    let realized_pnl = position.invested_amount * decision.pnl_rate;
    if let Err(underflow) = ledger.settle(position.invested_amount, realized_pnl) {
        error!(
            position_id = position.id.0,
            symbol = %position.symbol,
            shortfall = underflow.shortfall,
            "ledger underflow while settling position; balance clamped to zero"
        );
    }

    position.close(PositionExit {
        exit_price: price_sample,
        closed_at: now,
        realized_pnl,
        reason: decision.reason,
    });

    let capital_after = ledger.available();
    info!(
        position_id = position.id.0,
        symbol = %position.symbol,
        reason = decision.reason.as_str(),
        realized_pnl,
        capital_after,
        "position closed"
    );

    Evaluation::Closed(HistoryRecord {
        position_id: position.id,
        symbol: position.symbol.clone(),
        entry_price: position.entry_price,
        exit_price: price_sample,
        invested_amount: position.invested_amount,
        realized_pnl,
        capital_after,
        exit_reason: decision.reason,
        opened_at: position.opened_at,
        closed_at: now,
    })
}
