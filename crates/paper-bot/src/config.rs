use std::{
    env,
    net::{AddrParseError, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use core_sim::{BookConfig, BookConfigError};
use runtime::{SelectionPolicy, SessionConfig};
use strategy::{ExitRules, FilterThresholds, StrategyError};
use time::OffsetDateTime;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_FEED_URL: &str = "https://api.dexscreener.com/latest/dex/pairs/solana";
const DEFAULT_FEED_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_STARTING_CAPITAL: f64 = 1_000.0;
const DEFAULT_INVESTMENT_PER_TRADE: f64 = 50.0;
const DEFAULT_MIN_LIQUIDITY_USD: f64 = 10_000.0;
const DEFAULT_MIN_VOLUME_24H_USD: f64 = 5_000.0;
const DEFAULT_TAKE_PROFIT_PCT: f64 = 0.03;
const DEFAULT_STOP_LOSS_PCT: f64 = -0.02;
const DEFAULT_CYCLE_INTERVAL_MS: u64 = 30_000;
const DEFAULT_SELECTION: SelectionPolicy = SelectionPolicy::Random;
const DEFAULT_ENTRIES_PER_CYCLE: usize = 1;
const DEFAULT_PRICE_MODE: PriceMode = PriceMode::Random;
const DEFAULT_HISTORY_PATH: &str = "historial_operaciones.json";
const DEFAULT_HISTORY_FORMAT: HistoryFormat = HistoryFormat::Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceMode {
    /// Random variation around the entry price.
    Random,
    /// Latest quote the feed reported for the symbol.
    Feed,
}

impl PriceMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "random" => Some(Self::Random),
            "feed" => Some(Self::Feed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Feed => "feed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    /// Whole history rewritten as one JSON array.
    Json,
    /// One appended row per closed position.
    Csv,
}

impl HistoryFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub url: String,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub feed: FeedConfig,
    pub session: SessionConfig,
    pub cycle_interval: Duration,
    pub price_mode: PriceMode,
    pub history_path: PathBuf,
    pub history_format: HistoryFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOT_SERVER_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),
    #[error("{key} must be {expected}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
    },
    #[error("BOT_FEED_HEADERS entry {0:?} is not of the form `Name: value`")]
    InvalidFeedHeader(String),
    #[error("{0} contains non-unicode data")]
    NonUnicode(&'static str),
    #[error(transparent)]
    Book(#[from] BookConfigError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_env("BOT_SERVER_ADDR")? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => DEFAULT_LISTEN_ADDR
                .parse()
                .map_err(ConfigError::InvalidListenAddr)?,
        };

        let url = match read_env("BOT_FEED_URL")? {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    key: "BOT_FEED_URL",
                    expected: "a non-empty URL",
                });
            }
            Some(value) => value,
            None => DEFAULT_FEED_URL.to_owned(),
        };
        let timeout = Duration::from_millis(parse_positive_u64(
            "BOT_FEED_TIMEOUT_MS",
            DEFAULT_FEED_TIMEOUT_MS,
        )?);
        let headers = match read_env("BOT_FEED_HEADERS")? {
            Some(value) => parse_headers(&value)?,
            None => Vec::new(),
        };

        let book = BookConfig::new(
            parse_f64("BOT_STARTING_CAPITAL", DEFAULT_STARTING_CAPITAL)?,
            parse_f64("BOT_INVESTMENT_PER_TRADE", DEFAULT_INVESTMENT_PER_TRADE)?,
        )?;
        let thresholds = FilterThresholds::new(
            parse_f64("BOT_MIN_LIQUIDITY_USD", DEFAULT_MIN_LIQUIDITY_USD)?,
            parse_f64("BOT_MIN_VOLUME_24H_USD", DEFAULT_MIN_VOLUME_24H_USD)?,
            parse_optional_f64("BOT_MAX_FDV_USD")?,
        )?;
        let max_hold = parse_optional_u64("BOT_MAX_HOLD_SECS")?
            .map(|secs| time::Duration::seconds(secs.min(i64::MAX as u64) as i64));
        let rules = ExitRules::new(
            parse_f64("BOT_TAKE_PROFIT_PCT", DEFAULT_TAKE_PROFIT_PCT)?,
            parse_f64("BOT_STOP_LOSS_PCT", DEFAULT_STOP_LOSS_PCT)?,
            max_hold,
        )?;

        let selection = match read_env("BOT_SELECTION")? {
            Some(value) => {
                SelectionPolicy::parse(value.as_str()).ok_or(ConfigError::InvalidValue {
                    key: "BOT_SELECTION",
                    expected: "one of: random, in-order",
                })?
            }
            None => DEFAULT_SELECTION,
        };
        let entries_per_cycle =
            parse_positive_u64("BOT_ENTRIES_PER_CYCLE", DEFAULT_ENTRIES_PER_CYCLE as u64)?
                as usize;
        let max_open_positions = parse_optional_u64("BOT_MAX_OPEN_POSITIONS")?
            .map(|value| value as usize);
        let seed = match read_env("BOT_SEED")? {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BOT_SEED",
                expected: "an unsigned 64-bit integer",
            })?,
            None => time_derived_seed(),
        };

        let cycle_interval = Duration::from_millis(parse_positive_u64(
            "BOT_CYCLE_INTERVAL_MS",
            DEFAULT_CYCLE_INTERVAL_MS,
        )?);

        let price_mode = match read_env("BOT_PRICE_MODE")? {
            Some(value) => PriceMode::parse(value.as_str()).ok_or(ConfigError::InvalidValue {
                key: "BOT_PRICE_MODE",
                expected: "one of: random, feed",
            })?,
            None => DEFAULT_PRICE_MODE,
        };

        let history_path = match read_env("BOT_HISTORY_PATH")? {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    key: "BOT_HISTORY_PATH",
                    expected: "a non-empty path",
                });
            }
            Some(value) => PathBuf::from(value),
            None => PathBuf::from(DEFAULT_HISTORY_PATH),
        };
        let history_format = match read_env("BOT_HISTORY_FORMAT")? {
            Some(value) => {
                HistoryFormat::parse(value.as_str()).ok_or(ConfigError::InvalidValue {
                    key: "BOT_HISTORY_FORMAT",
                    expected: "one of: json, csv",
                })?
            }
            None => DEFAULT_HISTORY_FORMAT,
        };

        Ok(Self {
            listen_addr,
            feed: FeedConfig {
                url,
                timeout,
                headers,
            },
            session: SessionConfig {
                book,
                thresholds,
                rules,
                selection,
                entries_per_cycle,
                max_open_positions,
                seed,
            },
            cycle_interval,
            price_mode,
            history_path,
            history_format,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

fn parse_f64(key: &'static str, default_value: f64) -> Result<f64, ConfigError> {
    Ok(parse_optional_f64(key)?.unwrap_or(default_value))
}

fn parse_optional_f64(key: &'static str) -> Result<Option<f64>, ConfigError> {
    let Some(value) = read_env(key)? else {
        return Ok(None);
    };
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
        _ => Err(ConfigError::InvalidValue {
            key,
            expected: "a finite number",
        }),
    }
}

fn parse_positive_u64(key: &'static str, default_value: u64) -> Result<u64, ConfigError> {
    Ok(parse_optional_u64(key)?.unwrap_or(default_value))
}

fn parse_optional_u64(key: &'static str) -> Result<Option<u64>, ConfigError> {
    let Some(value) = read_env(key)? else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
        _ => Err(ConfigError::InvalidValue {
            key,
            expected: "a positive integer",
        }),
    }
}

/// Parses `Name: value` pairs separated by `;`. Empty segments are ignored.
fn parse_headers(value: &str) -> Result<Vec<(String, String)>, ConfigError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, header_value) = entry
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidFeedHeader(entry.to_owned()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::InvalidFeedHeader(entry.to_owned()));
            }
            Ok((name.to_owned(), header_value.trim().to_owned()))
        })
        .collect()
}

fn time_derived_seed() -> u64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as u64
}
