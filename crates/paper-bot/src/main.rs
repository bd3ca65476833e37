mod config;
mod http_feed;
mod wiring;

use std::error::Error;

use api::AppState;
use core_sim::{FeedQuoteSampler, PriceSampler, RandomWalkSampler};
use runtime::history::{CsvHistoryWriter, JsonHistoryFile};
use runtime::logging::{init_tracing, DEFAULT_LOG_FILTER};
use runtime::{run_driver, HistoryError, HistorySink, Session};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{Config, HistoryFormat, PriceMode};
use crate::http_feed::HttpFeed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing(DEFAULT_LOG_FILTER);

    let config = Config::from_env()?;
    info!(
        addr = %config.listen_addr,
        feed = %config.feed.url,
        price_mode = config.price_mode.as_str(),
        selection = config.session.selection.as_str(),
        history = %config.history_path.display(),
        history_format = config.history_format.as_str(),
        seed = config.session.seed,
        "starting paper trading session"
    );

    let feed = HttpFeed::new(&config.feed)?;
    let sampler = build_sampler(config.price_mode, config.session.seed);
    let sink = open_history_sink(&config)?;
    let session = Session::new(config.session, Box::new(feed), sampler, sink);
    let state = AppState::for_session(&session);
    let listener = TcpListener::bind(config.listen_addr).await?;

    let shutdown = CancellationToken::new();
    let driver = tokio::spawn(run_driver(
        session,
        config.cycle_interval,
        shutdown.clone(),
    ));
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    info!(addr = %config.listen_addr, "status api listening");
    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, wiring::build_app(state))
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await;
    // A failed server must not leave the driver running without a flush.
    shutdown.cancel();

    let session = driver.await?;
    info!(
        cycles = session.tick(),
        available_capital = session.book().available_capital(),
        realized_pnl = session.book().realized_pnl_total(),
        open_positions = session.book().open_positions().len(),
        "paper trading session finished"
    );
    served?;
    Ok(())
}

fn build_sampler(mode: PriceMode, seed: u64) -> Box<dyn PriceSampler> {
    match mode {
        PriceMode::Random => Box::new(RandomWalkSampler::new(seed)),
        PriceMode::Feed => Box::new(FeedQuoteSampler::new()),
    }
}

fn open_history_sink(config: &Config) -> Result<Box<dyn HistorySink>, HistoryError> {
    let sink: Box<dyn HistorySink> = match config.history_format {
        HistoryFormat::Json => Box::new(JsonHistoryFile::open(&config.history_path)?),
        HistoryFormat::Csv => Box::new(CsvHistoryWriter::open_append(&config.history_path)?),
    };
    Ok(sink)
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested, finishing current cycle"),
        Err(err) => error!(error = %err, "failed to listen for ctrl-c, shutting down"),
    }
    shutdown.cancel();
}
