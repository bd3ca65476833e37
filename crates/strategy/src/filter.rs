use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, RawRecord};
use crate::error::StrategyError;

const DEFAULT_MIN_LIQUIDITY_USD: f64 = 10_000.0;
const DEFAULT_MIN_VOLUME_24H_USD: f64 = 5_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterThresholds {
    min_liquidity_usd: f64,
    min_volume_24h_usd: f64,
    max_fdv_usd: Option<f64>,
}

impl FilterThresholds {
    pub fn new(
        min_liquidity_usd: f64,
        min_volume_24h_usd: f64,
        max_fdv_usd: Option<f64>,
    ) -> Result<Self, StrategyError> {
        if !min_liquidity_usd.is_finite() || min_liquidity_usd < 0.0 {
            return Err(StrategyError::InvalidMinLiquidity(min_liquidity_usd));
        }
        if !min_volume_24h_usd.is_finite() || min_volume_24h_usd < 0.0 {
            return Err(StrategyError::InvalidMinVolume(min_volume_24h_usd));
        }
        if let Some(max_fdv) = max_fdv_usd {
            if !max_fdv.is_finite() || max_fdv < 0.0 {
                return Err(StrategyError::InvalidMaxFdv(max_fdv));
            }
        }

        Ok(Self {
            min_liquidity_usd,
            min_volume_24h_usd,
            max_fdv_usd,
        })
    }

    pub fn min_liquidity_usd(&self) -> f64 {
        self.min_liquidity_usd
    }

    pub fn min_volume_24h_usd(&self) -> f64 {
        self.min_volume_24h_usd
    }

    pub fn max_fdv_usd(&self) -> Option<f64> {
        self.max_fdv_usd
    }

    /// Liquidity and volume must be present and positive whatever the floors
    /// are. With an FDV ceiling set, a record without a usable FDV is not
    /// admissible.
    pub fn admits(&self, record: &RawRecord) -> bool {
        if !meets_floor(record.liquidity_usd, self.min_liquidity_usd) {
            return false;
        }
        if !meets_floor(record.volume_24h_usd, self.min_volume_24h_usd) {
            return false;
        }

        match self.max_fdv_usd {
            None => true,
            Some(max_fdv) => record
                .fdv
                .filter(|fdv| fdv.is_finite())
                .is_some_and(|fdv| fdv <= max_fdv),
        }
    }
}

fn meets_floor(value: Option<f64>, floor: f64) -> bool {
    value.is_some_and(|value| value.is_finite() && value > 0.0 && value >= floor)
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_liquidity_usd: DEFAULT_MIN_LIQUIDITY_USD,
            min_volume_24h_usd: DEFAULT_MIN_VOLUME_24H_USD,
            max_fdv_usd: None,
        }
    }
}

/// Stable filter: admitted records keep their input order, duplicates included.
pub fn filter_candidates(records: &[RawRecord], thresholds: &FilterThresholds) -> Vec<Candidate> {
    records
        .iter()
        .filter(|record| thresholds.admits(record))
        .map(Candidate::from_record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_candidates, FilterThresholds};
    use crate::candidate::RawRecord;
    use crate::StrategyError;

    fn record(symbol: &str, liquidity: Option<f64>, volume: Option<f64>) -> RawRecord {
        RawRecord {
            name: Some(format!("{symbol} token")),
            symbol: Some(symbol.to_string()),
            price: Some(0.5),
            liquidity_usd: liquidity,
            volume_24h_usd: volume,
            fdv: None,
        }
    }

    #[test]
    fn keeps_records_at_or_above_both_floors() {
        let thresholds = FilterThresholds::default();
        let records = vec![
            record("AAA", Some(10_000.0), Some(5_000.0)),
            record("BBB", Some(9_999.0), Some(50_000.0)),
            record("CCC", Some(50_000.0), Some(4_999.0)),
        ];

        let candidates = filter_candidates(&records, &thresholds);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].symbol, "AAA");
    }

    #[test]
    fn excludes_records_missing_liquidity_or_volume() {
        let thresholds = FilterThresholds::new(0.0, 1.0, None).unwrap();
        let records = vec![
            record("AAA", None, Some(10.0)),
            record("BBB", Some(10.0), None),
        ];

        assert!(filter_candidates(&records, &thresholds).is_empty());
    }

    #[test]
    fn zero_floors_still_require_positive_liquidity_and_volume() {
        let thresholds = FilterThresholds::new(0.0, 0.0, None).unwrap();
        let records = vec![
            RawRecord {
                symbol: Some("NOLIQ".to_string()),
                price: Some(1.0),
                ..RawRecord::default()
            },
            record("ZERO", Some(0.0), Some(0.0)),
            record("NAN", Some(f64::NAN), Some(5.0)),
            record("OK", Some(0.5), Some(0.5)),
        ];

        let candidates = filter_candidates(&records, &thresholds);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].symbol, "OK");
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let thresholds = FilterThresholds::default();
        let records = vec![
            record("ZZZ", Some(20_000.0), Some(8_000.0)),
            record("AAA", Some(20_000.0), Some(8_000.0)),
            record("ZZZ", Some(20_000.0), Some(8_000.0)),
        ];

        let symbols: Vec<String> = filter_candidates(&records, &thresholds)
            .into_iter()
            .map(|candidate| candidate.symbol)
            .collect();

        assert_eq!(symbols, vec!["ZZZ", "AAA", "ZZZ"]);
    }

    #[test]
    fn fdv_ceiling_rejects_expensive_and_unknown_valuations() {
        let thresholds = FilterThresholds::new(0.0, 0.0, Some(1_000_000.0)).unwrap();
        let mut cheap = record("CHEAP", Some(1.0), Some(1.0));
        cheap.fdv = Some(900_000.0);
        let mut pricey = record("PRICEY", Some(1.0), Some(1.0));
        pricey.fdv = Some(2_000_000.0);
        let unknown = record("UNKNOWN", Some(1.0), Some(1.0));

        let candidates = filter_candidates(&[cheap, pricey, unknown], &thresholds);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].symbol, "CHEAP");
        assert_eq!(candidates[0].fdv, Some(900_000.0));
    }

    #[test]
    fn rejects_negative_or_non_finite_thresholds() {
        assert_eq!(
            FilterThresholds::new(-1.0, 0.0, None),
            Err(StrategyError::InvalidMinLiquidity(-1.0))
        );
        assert!(matches!(
            FilterThresholds::new(0.0, f64::NAN, None),
            Err(StrategyError::InvalidMinVolume(_))
        ));
        assert_eq!(
            FilterThresholds::new(0.0, 0.0, Some(-5.0)),
            Err(StrategyError::InvalidMaxFdv(-5.0))
        );
    }
}
