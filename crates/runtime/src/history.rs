use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use core_sim::HistoryRecord;
use time::format_description::well_known::Rfc3339;

pub const HISTORY_CSV_HEADER: &str =
    "position_id,symbol,entry_price,exit_price,invested_amount,realized_pnl,capital_after,exit_reason,opened_at,closed_at\n";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history io error: {0}")]
    Io(#[from] io::Error),
    #[error("history json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history timestamp could not be formatted: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Destination for closed-position records. Records handed to `append` must
/// never be dropped by a later successful write.
pub trait HistorySink: Send {
    fn append(&mut self, records: &[HistoryRecord]) -> Result<(), HistoryError>;

    fn flush(&mut self) -> Result<(), HistoryError> {
        Ok(())
    }
}

/// Keeps the full history in memory and rewrites the whole JSON file on every
/// append, through a temporary file and a rename.
#[derive(Debug)]
pub struct JsonHistoryFile {
    path: PathBuf,
    records: Vec<HistoryRecord>,
    dirty: bool,
}

impl JsonHistoryFile {
    /// Opens `path`, loading any history a previous run left behind.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        create_parent_dir(&path)?;

        let records = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            records,
            dirty: false,
        })
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    fn write_all(&mut self) -> Result<(), HistoryError> {
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, &self.records)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        self.dirty = false;
        Ok(())
    }
}

impl HistorySink for JsonHistoryFile {
    fn append(&mut self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        self.records.extend_from_slice(records);
        self.dirty = true;
        self.write_all()
    }

    fn flush(&mut self) -> Result<(), HistoryError> {
        if self.dirty {
            self.write_all()?;
        }
        Ok(())
    }
}

/// Appends one CSV row per record. Rows from a failed write stay pending and
/// go out, ahead of newer rows, on the next append or flush.
pub struct CsvHistoryWriter<W: Write> {
    writer: W,
    pending: Vec<HistoryRecord>,
}

impl<W: Write> CsvHistoryWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pending: Vec::new(),
        }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(HISTORY_CSV_HEADER.as_bytes())
    }

    pub fn pending(&self) -> &[HistoryRecord] {
        &self.pending
    }

    pub fn append_rows(&mut self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        self.pending.extend_from_slice(records);
        self.write_pending()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Renders every pending row into one buffer so a batch is written with a
    /// single `write_all`.
    fn write_pending(&mut self) -> Result<(), HistoryError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut rows = String::new();
        for record in &self.pending {
            rows.push_str(&render_row(record)?);
        }
        self.writer.write_all(rows.as_bytes())?;
        self.writer.flush()?;
        self.pending.clear();
        Ok(())
    }
}

fn render_row(record: &HistoryRecord) -> Result<String, HistoryError> {
    let symbol = escape_csv_field(&record.symbol);
    let opened_at = record.opened_at.format(&Rfc3339)?;
    let closed_at = record.closed_at.format(&Rfc3339)?;
    Ok(format!(
        "{},{symbol},{},{},{},{},{},{},{opened_at},{closed_at}\n",
        record.position_id.0,
        record.entry_price,
        record.exit_price,
        record.invested_amount,
        record.realized_pnl,
        record.capital_after,
        record.exit_reason.as_str(),
    ))
}

impl CsvHistoryWriter<File> {
    /// Opens `path` for appending, writing the header only when the file is new
    /// or empty.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        create_parent_dir(path)?;

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        let mut writer = Self::new(file);
        if is_empty {
            writer.write_header()?;
        }
        Ok(writer)
    }
}

impl<W: Write + Send> HistorySink for CsvHistoryWriter<W> {
    fn append(&mut self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        self.append_rows(records)
    }

    fn flush(&mut self) -> Result<(), HistoryError> {
        self.write_pending()?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Shared in-memory sink; clones observe the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistorySink {
    records: Arc<Mutex<Vec<HistoryRecord>>>,
}

impl InMemoryHistorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HistorySink for InMemoryHistorySink {
    fn append(&mut self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(records);
        Ok(())
    }
}

fn create_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn escape_csv_field(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|ch| matches!(ch, ',' | '"' | '\n' | '\r'));
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}
