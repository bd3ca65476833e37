#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("minimum liquidity must be finite and non-negative, got {0}")]
    InvalidMinLiquidity(f64),
    #[error("minimum 24h volume must be finite and non-negative, got {0}")]
    InvalidMinVolume(f64),
    #[error("maximum fully diluted valuation must be finite and non-negative, got {0}")]
    InvalidMaxFdv(f64),
    #[error("take-profit must be a finite positive fraction, got {0}")]
    InvalidTakeProfitPct(f64),
    #[error("stop-loss must be a finite fraction in [-1, 0), got {0}")]
    InvalidStopLossPct(f64),
    #[error("max hold duration must be positive")]
    InvalidMaxHold,
}
