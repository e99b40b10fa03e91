//! rollcall-ledger — durable, deduplicated attendance log.
//!
//! Backed by a CSV file with the fixed header `Name,Date,Session,Time`,
//! one row per attendance event. A person appears at most once per
//! calendar day per session; repeat sightings are acknowledged without
//! a write. Each row is encoded up front and appended in a single write,
//! fsynced before the outcome is reported, so a row either fully exists
//! or was never written.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike};
use rollcall_core::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Canonical column order of the attendance store.
pub const LEDGER_HEADER: [&str; 4] = ["Name", "Date", "Session", "Time"];

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The store exists but does not carry the expected schema. Fatal at
    /// open: a corrupt attendance file should be repaired or moved aside,
    /// never silently rewritten.
    #[error("attendance store {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

/// One attendance event as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Session")]
    pub session: Session,
    #[serde(rename = "Time")]
    pub time: NaiveTime,
}

/// Outcome of a [`AttendanceLedger::record`] call. Both variants are
/// success; write failures surface as [`LedgerError`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First sighting for this (name, date, session): a row was appended.
    Inserted,
    /// Already recorded for this (name, date, session): no write.
    AlreadyPresent,
}

/// Byte destination for ledger rows: plain writes plus the durability
/// barrier run after each append.
pub trait LedgerSink: Write {
    /// Push everything written so far to stable storage.
    fn sync(&self) -> std::io::Result<()>;
}

impl LedgerSink for File {
    fn sync(&self) -> std::io::Result<()> {
        self.sync_data()
    }
}

/// Append-only attendance store with an in-memory dedup index.
///
/// Owned mutably by a single writer; the exclusive borrow is what makes
/// each record operation atomic with respect to the uniqueness rule.
pub struct AttendanceLedger<S: LedgerSink = File> {
    path: PathBuf,
    sink: S,
    records: Vec<AttendanceRecord>,
    seen: HashSet<(String, NaiveDate, Session)>,
}

impl AttendanceLedger<File> {
    /// Open the attendance store, creating it (and its parent directory)
    /// with a header-only file when absent. An existing non-empty store
    /// has its header validated and its rows loaded into the dedup index;
    /// any schema mismatch is a [`LedgerError::Format`].
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // A zero-length file cannot carry the schema; treat it as fresh.
        let existing_len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        let mut records = Vec::new();
        let mut seen = HashSet::new();

        if existing_len > 0 {
            let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
            let headers = reader.headers()?.clone();
            if headers.iter().ne(LEDGER_HEADER) {
                return Err(LedgerError::Format {
                    path: path.to_path_buf(),
                    reason: format!(
                        "header is [{}], expected [{}]",
                        headers.iter().collect::<Vec<_>>().join(", "),
                        LEDGER_HEADER.join(", ")
                    ),
                });
            }

            for row in reader.deserialize::<AttendanceRecord>() {
                let record = row.map_err(|err| {
                    if matches!(err.kind(), csv::ErrorKind::Io(_)) {
                        LedgerError::Csv(err)
                    } else {
                        LedgerError::Format {
                            path: path.to_path_buf(),
                            reason: format!("malformed row: {err}"),
                        }
                    }
                })?;
                seen.insert((record.name.clone(), record.date, record.session));
                records.push(record);
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        if existing_len == 0 {
            file.write_all(&encode_row(LEDGER_HEADER)?)?;
            file.sync_data()?;
            tracing::info!(path = %path.display(), "attendance store created");
        } else {
            // The reader accepts a final row without its newline; an
            // append would fuse onto that row, so terminate it now.
            if !ends_with_newline(path)? {
                file.write_all(b"\n")?;
                file.sync_data()?;
            }
            tracing::info!(
                path = %path.display(),
                records = records.len(),
                "attendance store opened"
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            sink: file,
            records,
            seen,
        })
    }
}

impl<S: LedgerSink> AttendanceLedger<S> {
    /// Record a sighting of `name` at `now`.
    ///
    /// The first sighting per (name, date, session) appends one row and
    /// returns `Inserted`; later sightings return `AlreadyPresent` and
    /// leave the stored row (including its time) untouched. The dedup
    /// index is updated only after the row is durably on disk, so a
    /// failed write is retried on the next sighting.
    pub fn record<Tz: TimeZone>(
        &mut self,
        name: &str,
        now: &DateTime<Tz>,
    ) -> Result<RecordOutcome, LedgerError> {
        let date = now.date_naive();
        let session = Session::classify(now);

        let key = (name.to_string(), date, session);
        if self.seen.contains(&key) {
            return Ok(RecordOutcome::AlreadyPresent);
        }

        // Whole-second resolution, matching the stored format.
        let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());
        let record = AttendanceRecord {
            name: name.to_string(),
            date,
            session,
            time,
        };

        // Single write per row; a failed append leaves nothing buffered.
        let row = encode_row(&record)?;
        self.sink.write_all(&row)?;
        self.sink.sync()?;

        self.seen.insert(key);
        self.records.push(record);
        Ok(RecordOutcome::Inserted)
    }

    /// All records: rows loaded at open plus rows appended since.
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ledger over an arbitrary sink, bypassing the filesystem.
    #[cfg(test)]
    fn with_sink(sink: S) -> Self {
        Self {
            path: PathBuf::new(),
            sink,
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

/// CSV-encode one row, including its terminating newline.
fn encode_row<R: Serialize>(row: R) -> Result<Vec<u8>, LedgerError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buf);
        writer.serialize(row)?;
        writer.flush()?;
    }
    Ok(buf)
}

// Callers ensure the file is non-empty.
fn ends_with_newline(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
