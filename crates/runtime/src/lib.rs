pub mod driver;
pub mod engine;
pub mod events;
pub mod feed;
pub mod history;
pub mod logging;
pub mod selection;
pub mod status;

pub use driver::run_driver;
pub use engine::{CycleReport, Session, SessionConfig, SkippedCandidate};
pub use events::{SessionEvent, SkipReason};
pub use feed::{FeedError, MarketFeed};
pub use history::{HistoryError, HistorySink};
pub use selection::SelectionPolicy;
pub use status::StatusSnapshot;

#[cfg(test)]
mod tests {
    use core_sim::RandomWalkSampler;
    use strategy::RawRecord;
    use time::macros::datetime;

    use crate::feed::{parse_dexscreener_pairs, ScriptedFeed};
    use crate::history::InMemoryHistorySink;
    use crate::{Session, SessionConfig};

    #[tokio::test(flavor = "current_thread")]
    async fn decoded_feed_drives_a_seeded_session() {
        let body = r#"{"pairs":[
            {"baseToken":{"name":"Bonk","symbol":"BONK"},"priceUsd":"0.00002","liquidity":{"usd":90000},"volume":{"h24":40000}},
            {"baseToken":{"name":"Dust","symbol":"DUST"},"priceUsd":"1.0","liquidity":{"usd":10},"volume":{"h24":10}}
        ]}"#;
        let records: Vec<RawRecord> = parse_dexscreener_pairs(body).unwrap();
        let mut feed = ScriptedFeed::new();
        for _ in 0..20 {
            feed = feed.with_batch(records.clone());
        }
        let sink = InMemoryHistorySink::new();
        let mut session = Session::new(
            SessionConfig {
                seed: 99,
                ..SessionConfig::default()
            },
            Box::new(feed),
            Box::new(RandomWalkSampler::new(99)),
            Box::new(sink.clone()),
        );

        let mut now = datetime!(2026-03-01 00:00 UTC);
        for _ in 0..20 {
            let report = session.run_cycle(now).await;
            assert_eq!(report.admitted, 1);
            now += time::Duration::seconds(30);
        }

        let book = session.book();
        let realized: f64 = sink.records().iter().map(|r| r.realized_pnl).sum();
        assert!(sink.records().iter().all(|r| r.symbol == "BONK"));
        assert!((book.committed_capital() - (book.starting_capital() + realized)).abs() < 1e-9);
        assert_eq!(session.snapshot().cycles_completed, 20);
    }
}
