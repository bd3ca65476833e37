use serde::{Deserialize, Serialize};
use time::Duration;

use crate::error::StrategyError;

const DEFAULT_TAKE_PROFIT_PCT: f64 = 0.03;
const DEFAULT_STOP_LOSS_PCT: f64 = -0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    TimeExpiry,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TakeProfit => "take_profit",
            Self::StopLoss => "stop_loss",
            Self::TimeExpiry => "time_expiry",
        }
    }
}

/// The outcome of an exit check. `pnl_rate` is applied to the invested amount, so
/// the reward is the threshold rate, not the observed move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitDecision {
    pub reason: ExitReason,
    pub pnl_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRules {
    take_profit_pct: f64,
    stop_loss_pct: f64,
    max_hold: Option<Duration>,
}

impl ExitRules {
    /// `stop_loss_pct` must lie in `[-1, 0)` so a stopped-out position never
    /// credits back a negative amount.
    pub fn new(
        take_profit_pct: f64,
        stop_loss_pct: f64,
        max_hold: Option<Duration>,
    ) -> Result<Self, StrategyError> {
        if !take_profit_pct.is_finite() || take_profit_pct <= 0.0 {
            return Err(StrategyError::InvalidTakeProfitPct(take_profit_pct));
        }
        if !stop_loss_pct.is_finite() || !(-1.0..0.0).contains(&stop_loss_pct) {
            return Err(StrategyError::InvalidStopLossPct(stop_loss_pct));
        }
        if let Some(max_hold) = max_hold {
            if !max_hold.is_positive() {
                return Err(StrategyError::InvalidMaxHold);
            }
        }

        Ok(Self {
            take_profit_pct,
            stop_loss_pct,
            max_hold,
        })
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.take_profit_pct
    }

    pub fn stop_loss_pct(&self) -> f64 {
        self.stop_loss_pct
    }

    pub fn max_hold(&self) -> Option<Duration> {
        self.max_hold
    }

    /// Checks take-profit, then stop-loss, then max hold. The first rule that
    /// fires wins; `None` means the position stays open.
    pub fn decide(
        &self,
        entry_price: f64,
        sample: f64,
        held_for: Duration,
    ) -> Option<ExitDecision> {
        let variation = (sample - entry_price) / entry_price;

        if variation >= self.take_profit_pct {
            return Some(ExitDecision {
                reason: ExitReason::TakeProfit,
                pnl_rate: self.take_profit_pct,
            });
        }
        if variation <= self.stop_loss_pct {
            return Some(ExitDecision {
                reason: ExitReason::StopLoss,
                pnl_rate: self.stop_loss_pct,
            });
        }

        match self.max_hold {
            Some(max_hold) if held_for >= max_hold => Some(ExitDecision {
                reason: ExitReason::TimeExpiry,
                pnl_rate: 0.0,
            }),
            _ => None,
        }
    }
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            take_profit_pct: DEFAULT_TAKE_PROFIT_PCT,
            stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
            max_hold: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::{ExitReason, ExitRules};
    use crate::StrategyError;

    fn rules_with_hold(max_hold: Duration) -> ExitRules {
        ExitRules::new(0.03, -0.02, Some(max_hold)).unwrap()
    }

    #[test]
    fn take_profit_pays_threshold_rate_not_observed_move() {
        let decision = ExitRules::default()
            .decide(1.0, 1.05, Duration::ZERO)
            .unwrap();

        assert_eq!(decision.reason, ExitReason::TakeProfit);
        assert_eq!(decision.pnl_rate, 0.03);
    }

    #[test]
    fn stop_loss_charges_threshold_rate() {
        let decision = ExitRules::default()
            .decide(1.0, 0.97, Duration::ZERO)
            .unwrap();

        assert_eq!(decision.reason, ExitReason::StopLoss);
        assert_eq!(decision.pnl_rate, -0.02);
    }

    #[test]
    fn price_inside_band_before_max_hold_stays_open() {
        let rules = rules_with_hold(Duration::minutes(10));

        assert!(rules.decide(1.0, 1.01, Duration::minutes(9)).is_none());
        assert!(rules.decide(1.0, 0.99, Duration::ZERO).is_none());
    }

    #[test]
    fn max_hold_closes_at_par() {
        let rules = rules_with_hold(Duration::minutes(10));

        let decision = rules.decide(1.0, 1.0, Duration::minutes(10)).unwrap();

        assert_eq!(decision.reason, ExitReason::TimeExpiry);
        assert_eq!(decision.pnl_rate, 0.0);
    }

    #[test]
    fn take_profit_outranks_max_hold() {
        let rules = rules_with_hold(Duration::seconds(1));

        let decision = rules.decide(2.0, 2.5, Duration::hours(1)).unwrap();

        assert_eq!(decision.reason, ExitReason::TakeProfit);
    }

    #[test]
    fn no_max_hold_never_expires() {
        assert!(ExitRules::default()
            .decide(1.0, 1.0, Duration::days(365))
            .is_none());
    }

    #[test]
    fn rejects_invalid_thresholds() {
        assert_eq!(
            ExitRules::new(0.0, -0.02, None),
            Err(StrategyError::InvalidTakeProfitPct(0.0))
        );
        assert_eq!(
            ExitRules::new(0.03, -1.5, None),
            Err(StrategyError::InvalidStopLossPct(-1.5))
        );
        assert_eq!(
            ExitRules::new(0.03, 0.0, None),
            Err(StrategyError::InvalidStopLossPct(0.0))
        );
        assert_eq!(
            ExitRules::new(0.03, -0.02, Some(Duration::ZERO)),
            Err(StrategyError::InvalidMaxHold)
        );
    }

    #[test]
    fn accepts_full_stop_loss_boundary() {
        let rules = ExitRules::new(0.03, -1.0, None).unwrap();
        assert_eq!(rules.stop_loss_pct(), -1.0);
    }
}
