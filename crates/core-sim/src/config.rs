const DEFAULT_STARTING_CAPITAL: f64 = 1_000.0;
const DEFAULT_INVESTMENT_PER_TRADE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BookConfigError {
    #[error("starting capital must be finite and positive, got {0}")]
    InvalidStartingCapital(f64),
    #[error("investment per trade must be finite and positive, got {0}")]
    InvalidInvestmentPerTrade(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookConfig {
    pub starting_capital: f64,
    pub investment_per_trade: f64,
}

impl BookConfig {
    pub fn new(starting_capital: f64, investment_per_trade: f64) -> Result<Self, BookConfigError> {
        if !starting_capital.is_finite() || starting_capital <= 0.0 {
            return Err(BookConfigError::InvalidStartingCapital(starting_capital));
        }
        if !investment_per_trade.is_finite() || investment_per_trade <= 0.0 {
            return Err(BookConfigError::InvalidInvestmentPerTrade(
                investment_per_trade,
            ));
        }

        Ok(Self {
            starting_capital,
            investment_per_trade,
        })
    }
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            starting_capital: DEFAULT_STARTING_CAPITAL,
            investment_per_trade: DEFAULT_INVESTMENT_PER_TRADE,
        }
    }
}
