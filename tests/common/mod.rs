//! Shared test fixtures for the price ledger integration tests.
//!
//! Provides in-memory ledgers plus helpers to build upload archives and to
//! decode exported ones.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use price_ledger::{IngestMode, PriceLedger};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const HEADER: &str = "id,name,category,price,create_date\n";

/// Create an in-memory ledger with the given ingest policy.
pub fn setup_ledger(mode: IngestMode) -> PriceLedger {
    PriceLedger::builder()
        .in_memory()
        .ingest_mode(mode)
        .build()
        .unwrap()
}

/// Build a zip archive holding the given `(name, contents)` entries in order.
pub fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Build a zip archive whose entries are stored uncompressed.
pub fn zip_stored(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Rewrite the compression method recorded for entry `name` in both its
/// local header and its central directory record.
pub fn with_compression_method(mut archive: Vec<u8>, name: &str, method: u16) -> Vec<u8> {
    const LOCAL: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
    const CENTRAL: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];

    let read_u16 = |bytes: &[u8], at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]) as usize;
    let mut patched = 0;

    for offset in 0..archive.len().saturating_sub(46) {
        let sig = &archive[offset..offset + 4];
        let (method_at, name_len_at, name_at) = if sig == LOCAL {
            (8, 26, 30)
        } else if sig == CENTRAL {
            (10, 28, 46)
        } else {
            continue;
        };
        let name_len = read_u16(&archive, offset + name_len_at);
        let start = offset + name_at;
        if archive.get(start..start + name_len) == Some(name.as_bytes()) {
            archive[offset + method_at..offset + method_at + 2]
                .copy_from_slice(&method.to_le_bytes());
            patched += 1;
        }
    }

    assert_eq!(patched, 2, "entry {name} not found in archive");
    archive
}

/// Build an upload archive with a single `data.csv` entry.
pub fn csv_archive(csv: &str) -> Vec<u8> {
    zip_with(&[("data.csv", csv.as_bytes())])
}

/// Build an upload archive with a header row followed by `rows`.
pub fn csv_archive_with_header(rows: &str) -> Vec<u8> {
    csv_archive(&format!("{HEADER}{rows}"))
}

/// Read the named entry of an archive as raw bytes.
pub fn read_entry(archive: &[u8], name: &str) -> Vec<u8> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents).unwrap();
    contents
}

/// Decode the `data.csv` entry of an exported archive into rows of fields.
pub fn read_export(archive: &[u8]) -> Vec<Vec<String>> {
    let contents = read_entry(archive, "data.csv");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_slice());
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

/// Ids currently in the ledger, ascending.
pub fn ledger_ids(ledger: &PriceLedger) -> Vec<i64> {
    let (records, _) = ledger.prices().all().unwrap();
    records.into_iter().map(|r| r.id).collect()
}
