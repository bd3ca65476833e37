pub mod book;
pub mod config;
pub mod ledger;
pub mod position;
pub mod sampler;

pub use book::{evaluate_position, Evaluation, OpenError, PositionBook, UnknownPosition};
pub use config::{BookConfig, BookConfigError};
pub use ledger::{CapitalLedger, LedgerError, LedgerUnderflow};
pub use position::{HistoryRecord, Position, PositionExit, PositionId, PositionStatus};
pub use sampler::{
    FeedQuoteSampler, PriceSampler, RandomWalkSampler, SamplerError, ScriptedSampler,
};

#[cfg(test)]
mod tests {
    use super::{BookConfig, BookConfigError};

    #[test]
    fn book_config_defaults_match_demo_bot() {
        let config = BookConfig::default();
        assert_eq!(config.starting_capital, 1_000.0);
        assert_eq!(config.investment_per_trade, 50.0);
    }

    #[test]
    fn book_config_rejects_non_positive_amounts() {
        assert_eq!(
            BookConfig::new(0.0, 50.0),
            Err(BookConfigError::InvalidStartingCapital(0.0))
        );
        assert_eq!(
            BookConfig::new(1_000.0, -5.0),
            Err(BookConfigError::InvalidInvestmentPerTrade(-5.0))
        );
    }
}
