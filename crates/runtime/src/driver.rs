use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::engine::Session;

/// Runs one cycle per `interval` until `shutdown` fires. Cancellation is only
/// observed between cycles, so an in-flight cycle always finishes. Returns the
/// session after a final history flush.
pub async fn run_driver(
    mut session: Session,
    interval: Duration,
    shutdown: CancellationToken,
) -> Session {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_ms = interval.as_millis() as u64, "session driver started");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let report = session.run_cycle(OffsetDateTime::now_utc()).await;
        if report.persist_error.is_some() {
            error!(tick = report.tick, "cycle finished without persisting its history");
        }
    }

    if let Err(err) = session.flush_history() {
        error!(error = %err, "final history flush failed");
    }
    info!(cycles = session.tick(), "session driver stopped");
    session
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use core_sim::ScriptedSampler;
    use strategy::RawRecord;
    use tokio_util::sync::CancellationToken;

    use super::run_driver;
    use crate::engine::{Session, SessionConfig};
    use crate::feed::{FeedError, MarketFeed, ScriptedFeed};
    use crate::history::InMemoryHistorySink;

    fn idle_session(feed: Box<dyn MarketFeed>) -> Session {
        Session::new(
            SessionConfig::default(),
            feed,
            Box::new(ScriptedSampler::new([])),
            Box::new(InMemoryHistorySink::new()),
        )
    }

    struct SlowFeed {
        delay: Duration,
    }

    #[async_trait]
    impl MarketFeed for SlowFeed {
        async fn fetch(&mut self) -> Result<Vec<RawRecord>, FeedError> {
            tokio::time::sleep(self.delay).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn driver_runs_one_cycle_per_interval() {
        let shutdown = CancellationToken::new();
        let session = idle_session(Box::new(ScriptedFeed::new()));
        let status = session.subscribe_status();
        let handle = tokio::spawn(run_driver(
            session,
            Duration::from_secs(30),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(95)).await;
        shutdown.cancel();
        let session = handle.await.unwrap();

        assert_eq!(session.tick(), 4);
        assert_eq!(status.borrow().cycles_completed, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_lets_in_flight_cycle_finish() {
        let shutdown = CancellationToken::new();
        let session = idle_session(Box::new(SlowFeed {
            delay: Duration::from_secs(10),
        }));
        let status = session.subscribe_status();
        let handle = tokio::spawn(run_driver(
            session,
            Duration::from_secs(60),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(status.borrow().cycles_completed, 0);
        shutdown.cancel();
        let session = handle.await.unwrap();

        assert_eq!(session.tick(), 1);
        assert_eq!(status.borrow().cycles_completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_runs_no_cycles() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let session = run_driver(
            idle_session(Box::new(ScriptedFeed::new())),
            Duration::from_secs(1),
            shutdown,
        )
        .await;

        assert_eq!(session.tick(), 0);
    }
}
