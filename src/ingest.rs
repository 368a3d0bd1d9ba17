//! CSV ingestion and cleaning for per-interval vehicle counts.
//!
//! Sources must carry `intersection_id`, `timestamp`, and `count` columns;
//! `approach` is optional. Rows that fail coercion are dropped, not fatal —
//! only structural problems (missing file, missing column, empty source)
//! surface as errors.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const REQUIRED_COLUMNS: [&str; 3] = ["count", "intersection_id", "timestamp"];

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// One cleaned per-interval count observation. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeRecord {
    pub intersection_id: String,
    pub timestamp: NaiveDateTime,
    pub count: f64,
    pub approach: Option<String>,
}

impl VolumeRecord {
    /// Hour of day (0-23) derived from the timestamp.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn day_of_week(&self) -> Weekday {
        self.timestamp.weekday()
    }
}

/// A cleaned table of count records plus what we learned about the source
/// schema while reading it.
#[derive(Debug, Default)]
pub struct CountTable {
    records: Vec<VolumeRecord>,
    has_approach: bool,
    dropped_rows: usize,
}

impl CountTable {
    /// Builds a table from already-typed records, e.g. assembled in memory
    /// rather than read from a file.
    pub fn from_records(records: Vec<VolumeRecord>) -> Self {
        let has_approach = records.iter().any(|r| r.approach.is_some());
        CountTable {
            records,
            has_approach,
            dropped_rows: 0,
        }
    }

    pub fn records(&self) -> &[VolumeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows discarded during cleaning (bad timestamp, bad count, null id).
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Streams records one at a time, optionally filtered to a single
    /// approach. Requesting an approach filter against a source that never
    /// carried the `approach` column is a schema error.
    pub fn stream(&self, approach: Option<&str>) -> Result<impl Iterator<Item = &VolumeRecord>> {
        if approach.is_some() && !self.has_approach {
            return Err(Error::schema(["approach"]));
        }
        let wanted = approach.map(str::to_owned);
        Ok(self
            .records
            .iter()
            .filter(move |r| match (&wanted, &r.approach) {
                (None, _) => true,
                (Some(w), Some(a)) => a == w,
                (Some(_), None) => false,
            }))
    }

    /// Groups records by (intersection, calendar day), sorted by intersection
    /// id and timestamp. The stable sort is the barrier before any grouping
    /// that depends on global order.
    pub fn group_by_intersection_and_day(
        &self,
    ) -> BTreeMap<(String, NaiveDate), Vec<&VolumeRecord>> {
        let mut sorted: Vec<&VolumeRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            (a.intersection_id.as_str(), a.timestamp).cmp(&(b.intersection_id.as_str(), b.timestamp))
        });

        let mut grouped: BTreeMap<(String, NaiveDate), Vec<&VolumeRecord>> = BTreeMap::new();
        for record in sorted {
            grouped
                .entry((record.intersection_id.clone(), record.timestamp.date()))
                .or_default()
                .push(record);
        }
        grouped
    }
}

/// Column positions resolved from the CSV header row.
struct ColumnLayout {
    intersection_id: usize,
    timestamp: usize,
    count: usize,
    approach: Option<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let intersection_id = find("intersection_id");
        let timestamp = find("timestamp");
        let count = find("count");

        let missing: Vec<&str> = [
            ("intersection_id", intersection_id),
            ("timestamp", timestamp),
            ("count", count),
        ]
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(Error::schema(missing));
        }

        Ok(ColumnLayout {
            intersection_id: intersection_id.unwrap(),
            timestamp: timestamp.unwrap(),
            count: count.unwrap(),
            approach: find("approach"),
        })
    }

    /// Cleans one raw row. Returns `None` for rows that fail coercion.
    fn clean(&self, row: &csv::StringRecord) -> Option<VolumeRecord> {
        let intersection_id = row.get(self.intersection_id)?.trim();
        if intersection_id.is_empty() {
            return None;
        }

        let timestamp = parse_timestamp(row.get(self.timestamp)?.trim())?;

        let count: f64 = row.get(self.count)?.trim().parse().ok()?;
        if !count.is_finite() || count < 0.0 {
            return None;
        }

        let approach = self
            .approach
            .and_then(|idx| row.get(idx))
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_owned);

        Some(VolumeRecord {
            intersection_id: intersection_id.to_owned(),
            timestamp,
            count,
            approach,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    // Bare dates land on midnight
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Loads and cleans a CSV file of per-interval counts.
pub fn load_counts<P: AsRef<Path>>(path: P) -> Result<CountTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let table = read_counts(File::open(path)?)?;
    debug!(
        path = %path.display(),
        rows = table.len(),
        dropped = table.dropped_rows(),
        "Loaded traffic counts"
    );
    Ok(table)
}

/// Reads and cleans counts from any reader.
///
/// A source with no data rows at all is [`Error::EmptyInput`]; a source whose
/// rows all fail cleaning yields an empty (but valid) table.
pub fn read_counts<R: Read>(reader: R) -> Result<CountTable> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers()?.clone();
    let rows: Vec<csv::StringRecord> = rdr.records().collect::<std::result::Result<_, _>>()?;
    if rows.is_empty() {
        return Err(Error::EmptyInput("source has no data rows".to_owned()));
    }

    let layout = ColumnLayout::from_headers(&headers)?;

    let mut records = Vec::with_capacity(rows.len());
    let mut dropped_rows = 0;
    for row in &rows {
        match layout.clean(row) {
            Some(record) => records.push(record),
            None => dropped_rows += 1,
        }
    }

    if dropped_rows > 0 {
        warn!(dropped_rows, "Dropped rows that failed cleaning");
    }

    Ok(CountTable {
        records,
        has_approach: layout.approach.is_some(),
        dropped_rows,
    })
}

/// Lazy, forward-only reader yielding cleaned chunks of bounded size.
///
/// The header schema is validated once when the reader is opened; each call
/// to `next` reads at most `chunk_size` raw rows from the source. Not
/// restartable without re-opening.
pub struct ChunkedReader {
    rdr: csv::Reader<File>,
    layout: ColumnLayout,
    chunk_size: usize,
}

impl ChunkedReader {
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let mut rdr = csv::Reader::from_reader(File::open(path)?);
        let layout = ColumnLayout::from_headers(&rdr.headers()?.clone())?;

        Ok(ChunkedReader {
            rdr,
            layout,
            chunk_size: chunk_size.max(1),
        })
    }
}

impl Iterator for ChunkedReader {
    type Item = Result<Vec<VolumeRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        let mut raw_read = 0;

        for row in self.rdr.records().take(self.chunk_size) {
            raw_read += 1;
            match row {
                Ok(row) => {
                    if let Some(record) = self.layout.clean(&row) {
                        chunk.push(record);
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }

        if raw_read == 0 { None } else { Some(Ok(chunk)) }
    }
}

/// Advisory notices raised during validation. These are observations for the
/// operator, not failures.
#[derive(Debug, PartialEq, Eq)]
pub enum Advisory {
    ZeroCounts(usize),
    DroppedRows(usize),
    NoRecords,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ZeroCounts(n) => write!(f, "found {n} zero counts in data"),
            Advisory::DroppedRows(n) => write!(f, "{n} rows were dropped during cleaning"),
            Advisory::NoRecords => write!(f, "no records survived cleaning"),
        }
    }
}

/// Outcome of validating a cleaned table: a pass/fail verdict plus any
/// advisory notices, decoupled from how the caller chooses to report them.
#[derive(Debug)]
pub struct ValidationReport {
    pub ok: bool,
    pub advisories: Vec<Advisory>,
}

/// Checks a cleaned table for basic data-quality issues.
pub fn validate(table: &CountTable) -> ValidationReport {
    let mut advisories = Vec::new();

    if table.dropped_rows() > 0 {
        advisories.push(Advisory::DroppedRows(table.dropped_rows()));
    }

    if table.is_empty() {
        advisories.push(Advisory::NoRecords);
        return ValidationReport {
            ok: false,
            advisories,
        };
    }

    let zero_counts = table.records().iter().filter(|r| r.count == 0.0).count();
    if zero_counts > 0 {
        advisories.push(Advisory::ZeroCounts(zero_counts));
    }

    ValidationReport {
        ok: true,
        advisories,
    }
}
