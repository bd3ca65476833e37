use core_sim::{BookConfig, HistoryRecord, OpenError, PositionBook, PositionId, PriceSampler};
use strategy::{filter_candidates, ExitRules, FilterThresholds};
use time::OffsetDateTime;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::events::{SessionEvent, SkipReason};
use crate::feed::{FeedError, MarketFeed};
use crate::history::{HistoryError, HistorySink};
use crate::selection::{CandidateSelector, SelectionPolicy};
use crate::status::StatusSnapshot;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub book: BookConfig,
    pub thresholds: FilterThresholds,
    pub rules: ExitRules,
    pub selection: SelectionPolicy,
    pub entries_per_cycle: usize,
    pub max_open_positions: Option<usize>,
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            book: BookConfig::default(),
            thresholds: FilterThresholds::default(),
            rules: ExitRules::default(),
            selection: SelectionPolicy::Random,
            entries_per_cycle: 1,
            max_open_positions: None,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCandidate {
    pub symbol: String,
    pub reason: SkipReason,
}

/// What one cycle did.
#[derive(Debug)]
pub struct CycleReport {
    pub tick: u64,
    pub fetched: usize,
    pub admitted: usize,
    pub opened: Vec<PositionId>,
    pub skipped: Vec<SkippedCandidate>,
    pub closed: Vec<HistoryRecord>,
    pub feed_error: Option<FeedError>,
    pub persist_error: Option<HistoryError>,
}

/// One simulated-trading session: the position book plus every collaborator a
/// cycle talks to. Nothing here is shared; observers get snapshots and events
/// through channels.
pub struct Session {
    config: SessionConfig,
    book: PositionBook,
    feed: Box<dyn MarketFeed>,
    sampler: Box<dyn PriceSampler>,
    sink: Box<dyn HistorySink>,
    selector: CandidateSelector,
    tick: u64,
    last_result: Option<HistoryRecord>,
    status_tx: watch::Sender<StatusSnapshot>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        feed: Box<dyn MarketFeed>,
        sampler: Box<dyn PriceSampler>,
        sink: Box<dyn HistorySink>,
    ) -> Self {
        let book = PositionBook::new(config.book, config.rules);
        let selector =
            CandidateSelector::new(config.selection, config.entries_per_cycle, config.seed);
        let (status_tx, _) = watch::channel(StatusSnapshot::capture(&book, None, 0, None));
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            config,
            book,
            feed,
            sampler,
            sink,
            selector,
            tick: 0,
            last_result: None,
            status_tx,
            events_tx,
        }
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_tx.subscribe()
    }

    pub fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.events_tx.clone()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.status_tx.borrow().clone()
    }

    /// Runs one fetch, filter, open, evaluate, persist iteration. Feed and
    /// capital problems are absorbed into the report; nothing here aborts.
    pub async fn run_cycle(&mut self, now: OffsetDateTime) -> CycleReport {
        self.tick += 1;
        let tick = self.tick;

        let (records, feed_error) = match self.feed.fetch().await {
            Ok(records) => (records, None),
            Err(err) => {
                warn!(tick, error = %err, "feed unavailable; cycle continues with zero candidates");
                self.publish(SessionEvent::FeedUnavailable {
                    tick,
                    reason: err.to_string(),
                });
                (Vec::new(), Some(err))
            }
        };

        self.sampler.observe(&records);
        let candidates = filter_candidates(&records, &self.config.thresholds);
        debug!(
            tick,
            fetched = records.len(),
            admitted = candidates.len(),
            "candidates filtered"
        );

        let mut opened = Vec::new();
        let mut skipped = Vec::new();
        for candidate in self.selector.select(&candidates) {
            let at_capacity = self
                .config
                .max_open_positions
                .is_some_and(|max| self.book.open_positions().len() >= max);
            let outcome = if at_capacity {
                Err(SkipReason::MaxOpenPositions)
            } else {
                self.book
                    .open_position(candidate, self.config.book.investment_per_trade, now)
                    .map_err(|err| skip_reason(&candidate.symbol, &err))
            };

            match outcome {
                Ok(position) => {
                    opened.push(position.id);
                    self.publish(SessionEvent::PositionOpened { tick, position });
                }
                Err(reason) => {
                    skipped.push(SkippedCandidate {
                        symbol: candidate.symbol.clone(),
                        reason,
                    });
                    self.publish(SessionEvent::CandidateSkipped {
                        tick,
                        symbol: candidate.symbol.clone(),
                        reason,
                    });
                }
            }
        }

        let closed = self.book.evaluate_open(now, self.sampler.as_mut());
        for record in &closed {
            self.publish(SessionEvent::PositionClosed {
                tick,
                record: record.clone(),
            });
        }
        if let Some(last) = closed.last() {
            self.last_result = Some(last.clone());
        }

        let persist_error = if closed.is_empty() {
            None
        } else {
            match self.sink.append(&closed) {
                Ok(()) => None,
                Err(err) => {
                    error!(
                        tick,
                        error = %err,
                        records = closed.len(),
                        "history persistence failed; skipping for this cycle"
                    );
                    Some(err)
                }
            }
        };

        info!(
            tick,
            available_capital = self.book.available_capital(),
            open_positions = self.book.open_positions().len(),
            opened = opened.len(),
            closed = closed.len(),
            "cycle completed"
        );
        self.publish(SessionEvent::CycleCompleted {
            tick,
            available_capital: self.book.available_capital(),
            open_positions: self.book.open_positions().len(),
            closed_this_cycle: closed.len(),
        });
        self.status_tx.send_replace(StatusSnapshot::capture(
            &self.book,
            self.last_result.as_ref(),
            tick,
            Some(now),
        ));

        CycleReport {
            tick,
            fetched: records.len(),
            admitted: candidates.len(),
            opened,
            skipped,
            closed,
            feed_error,
            persist_error,
        }
    }

    /// Writes out anything the history sink still holds.
    pub fn flush_history(&mut self) -> Result<(), HistoryError> {
        self.sink.flush()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }
}

fn skip_reason(symbol: &str, err: &OpenError) -> SkipReason {
    match err {
        OpenError::InvalidEntryPrice { .. } => {
            warn!(symbol, error = %err, "candidate skipped");
            SkipReason::InvalidEntryPrice
        }
        OpenError::Ledger(_) => {
            info!(symbol, error = %err, "candidate skipped");
            SkipReason::InsufficientCapital
        }
    }
}
