pub mod candidate;
pub mod error;
pub mod exit;
pub mod filter;

pub use candidate::{Candidate, RawRecord};
pub use error::StrategyError;
pub use exit::{ExitDecision, ExitReason, ExitRules};
pub use filter::{filter_candidates, FilterThresholds};

#[cfg(test)]
mod tests {
    use crate::{filter_candidates, ExitReason, ExitRules, FilterThresholds, RawRecord};

    #[test]
    fn admitted_candidate_can_be_checked_against_exit_rules() {
        let records = vec![RawRecord {
            name: Some("Bonk".to_string()),
            symbol: Some("BONK".to_string()),
            price: Some(0.000_02),
            liquidity_usd: Some(250_000.0),
            volume_24h_usd: Some(90_000.0),
            fdv: Some(1_500_000_000.0),
        }];

        let candidates = filter_candidates(&records, &FilterThresholds::default());
        let entry = candidates[0].price;
        let decision = ExitRules::default()
            .decide(entry, entry * 1.04, time::Duration::ZERO)
            .unwrap();

        assert_eq!(decision.reason, ExitReason::TakeProfit);
    }
}
