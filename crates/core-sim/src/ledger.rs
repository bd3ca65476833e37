#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient capital: requested {requested:.2}, available {available:.2}")]
    InsufficientCapital { requested: f64, available: f64 },
    #[error("amount must be finite and positive, got {0}")]
    InvalidAmount(f64),
}

/// Raised when a settlement would have driven the balance below zero. The
/// balance has already been clamped to zero when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("ledger underflow: settlement left a shortfall of {shortfall:.2}")]
pub struct LedgerUnderflow {
    pub shortfall: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapitalLedger {
    available: f64,
}

impl CapitalLedger {
    pub fn new(starting_capital: f64) -> Self {
        Self {
            available: starting_capital.max(0.0),
        }
    }

    pub fn available(&self) -> f64 {
        self.available
    }

    pub fn can_reserve(&self, amount: f64) -> bool {
        amount <= self.available
    }

    pub fn reserve(&mut self, amount: f64) -> Result<(), LedgerError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if !self.can_reserve(amount) {
            return Err(LedgerError::InsufficientCapital {
                requested: amount,
                available: self.available,
            });
        }

        self.available -= amount;
        Ok(())
    }

    pub fn settle(&mut self, amount: f64, pnl: f64) -> Result<(), LedgerUnderflow> {
        let next = self.available + amount + pnl;
        if next < 0.0 {
            self.available = 0.0;
            return Err(LedgerUnderflow { shortfall: -next });
        }

        self.available = next;
        Ok(())
    }
}
