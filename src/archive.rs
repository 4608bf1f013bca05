//! Zip-wrapped CSV codec for price lists.
//!
//! Upload direction: find the first `.csv` entry of an archive and decode it
//! into raw rows, dropping a leading `id,...` header row. Download direction:
//! encode ledger rows as CSV and wrap them as a single archive entry.

use std::io::{Cursor, Read, Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::config::{HEADER_SENTINEL, TABLE_SUFFIX};
use crate::error::{LedgerError, Result};
use crate::models::PriceRecord;

/// One decoded CSV row, untyped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// 1-based line in the source table where the row starts.
    pub line: u64,
    pub fields: Vec<String>,
}

impl RowRecord {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Decode the first CSV entry of a zip archive held in memory.
///
/// Entries are scanned in stored order. Fails with
/// [`LedgerError::NoTabularEntry`] if no entry name ends in `.csv`, and with
/// [`LedgerError::MalformedTable`] if the archive or the table cannot be read.
pub fn extract_rows(bytes: &[u8]) -> Result<Vec<RowRecord>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let index = find_table_entry(&archive).ok_or(LedgerError::NoTabularEntry)?;
    let entry = archive.by_index(index)?;
    log::debug!(
        "Reading table entry '{}' ({} bytes)",
        entry.name(),
        entry.size()
    );

    let rows = read_table(entry)?;
    Ok(strip_header(rows))
}

/// Match entry names from the central directory only; no entry is opened
/// here. Directory names end in `/` and never match the suffix.
fn find_table_entry<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<usize> {
    (0..archive.len()).find(|&i| {
        archive
            .name_for_index(i)
            .is_some_and(|name| name.ends_with(TABLE_SUFFIX))
    })
}

/// Decode comma-delimited, quote-aware rows of any arity.
pub fn read_table<R: Read>(source: R) -> Result<Vec<RowRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(RowRecord::new(
            line,
            record.iter().map(str::to_string).collect(),
        ));
    }
    Ok(rows)
}

fn strip_header(mut rows: Vec<RowRecord>) -> Vec<RowRecord> {
    let is_header = rows
        .first()
        .and_then(|row| row.fields.first())
        .map(|field| field.trim_start_matches('\u{feff}') == HEADER_SENTINEL)
        .unwrap_or(false);

    if is_header {
        rows.remove(0);
    }
    rows
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode ledger rows as header-less CSV, one record per row.
pub fn encode_table(records: &[PriceRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for record in records {
        writer
            .write_record(record.to_csv_fields())
            .map_err(|e| LedgerError::EncodeFailed(format!("failed to write CSV record: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| LedgerError::EncodeFailed(format!("failed to flush CSV writer: {e}")))
}

/// Wrap `contents` as the single deflated entry `entry_name` of a new archive.
///
/// Entries carry the DOS epoch as their timestamp, so equal contents always
/// produce equal archives.
pub fn write_archive(entry_name: &str, contents: &[u8]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    writer
        .start_file(entry_name, options)
        .map_err(|e| LedgerError::EncodeFailed(format!("failed to create zip entry: {e}")))?;
    writer
        .write_all(contents)
        .map_err(|e| LedgerError::EncodeFailed(format!("failed to write zip entry: {e}")))?;

    let cursor = writer
        .finish()
        .map_err(|e| LedgerError::EncodeFailed(format!("failed to finish zip archive: {e}")))?;
    Ok(cursor.into_inner())
}
