//! Ingest, aggregate and scan queries against the DuckDB `prices` table.

use duckdb::params;

use crate::archive::RowRecord;
use crate::connection::Connection;
use crate::decode::decode_row;
use crate::error::Result;
use crate::models::{IngestMode, IngestReport, NewPrice, PriceRecord, PriceStats, SkippedRow};

const INSERT_ASSIGNED_ID: &str =
    "INSERT INTO prices (name, category, price, create_date) VALUES (?, ?, ?, ?)";

const INSERT_WITH_ID: &str =
    "INSERT INTO prices (id, name, category, price, create_date) VALUES (?, ?, ?, ?, ?)";

const STATS: &str = r#"
    SELECT
        COUNT(*) AS total_items,
        COUNT(DISTINCT category) AS total_categories,
        CAST(COALESCE(SUM(price), 0) AS DOUBLE) AS total_price
    FROM prices
"#;

const SCAN_ORDERED: &str =
    "SELECT id, name, category, price, create_date FROM prices ORDER BY id ASC";

// ---------------------------------------------------------------------------
// PriceQuery
// ---------------------------------------------------------------------------

/// Query interface for the price ledger backed by the `prices` table.
pub struct PriceQuery<'a> {
    conn: &'a Connection,
}

impl<'a> PriceQuery<'a> {
    /// Create a new `PriceQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record decoded CSV rows, then return aggregates over the whole ledger.
    ///
    /// `rows` must already have any header row removed.
    pub fn ingest(&self, rows: &[RowRecord], mode: IngestMode) -> Result<IngestReport> {
        let (inserted, skipped) = match mode {
            IngestMode::Strict => (self.ingest_strict(rows)?, Vec::new()),
            IngestMode::Lenient => self.ingest_lenient(rows)?,
        };

        let stats = self.stats()?;
        log::info!(
            "Ingested {} row(s) in {} mode, skipped {}; ledger now holds {} item(s)",
            inserted,
            mode,
            skipped.len(),
            stats.total_items
        );

        Ok(IngestReport {
            inserted,
            skipped,
            stats,
        })
    }

    /// All-or-nothing ingest.
    ///
    /// Every row is decoded before anything is written, so a bad row never
    /// leaves a partial batch behind. Inserts share one transaction.
    fn ingest_strict(&self, rows: &[RowRecord]) -> Result<usize> {
        let prices = rows
            .iter()
            .map(|row| decode_row(row, IngestMode::Strict).map_err(|e| e.at_line(row.line)))
            .collect::<Result<Vec<NewPrice>>>()?;

        if prices.is_empty() {
            return Ok(0);
        }

        self.conn.transaction(|raw| {
            let mut stmt = raw.prepare(INSERT_ASSIGNED_ID)?;
            for price in &prices {
                stmt.execute(params![price.name, price.category, price.price, price.create_date])?;
            }
            Ok(prices.len())
        })
    }

    /// Row-by-row ingest that skips whatever it cannot decode or insert.
    fn ingest_lenient(&self, rows: &[RowRecord]) -> Result<(usize, Vec<SkippedRow>)> {
        let mut stmt = self.conn.raw().prepare(INSERT_WITH_ID)?;
        let mut inserted = 0;
        let mut skipped = Vec::new();

        for row in rows {
            let price = match decode_row(row, IngestMode::Lenient) {
                Ok(price) => price,
                Err(e) => {
                    log::debug!("Skipping line {}: {}", row.line, e);
                    skipped.push(SkippedRow {
                        position: row.line,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match stmt.execute(params![
                price.id,
                price.name,
                price.category,
                price.price,
                price.create_date
            ]) {
                Ok(_) => inserted += 1,
                Err(e) => {
                    log::warn!("Failed to insert record from line {}: {}", row.line, e);
                    skipped.push(SkippedRow {
                        position: row.line,
                        reason: format!("insert failed: {e}"),
                    });
                }
            }
        }

        Ok((inserted, skipped))
    }

    /// Item count, distinct category count and price sum over the whole ledger.
    ///
    /// The sum is read as a plain `f64`, so a non-finite total from rows
    /// written outside this crate still yields stats.
    pub fn stats(&self) -> Result<PriceStats> {
        let stats = self.conn.raw().query_row(STATS, [], |row| {
            Ok(PriceStats {
                total_items: row.get(0)?,
                total_categories: row.get(1)?,
                total_price: row.get(2)?,
            })
        })?;
        Ok(stats)
    }

    /// Every row ordered by ascending id.
    ///
    /// Rows that cannot be read are logged and reported as skipped instead
    /// of failing the scan.
    pub fn all(&self) -> Result<(Vec<PriceRecord>, Vec<SkippedRow>)> {
        let mut stmt = self.conn.raw().prepare(SCAN_ORDERED)?;
        let mut rows = stmt.query([])?;

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        let mut position = 0u64;

        while let Some(row) = rows.next()? {
            position += 1;
            match PriceRecord::from_row(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    log::warn!("Failed to read ledger row {}: {}", position, e);
                    skipped.push(SkippedRow {
                        position,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok((records, skipped))
    }

    /// Number of rows in the ledger.
    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .execute_scalar("SELECT COUNT(*) FROM prices", &[])?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        Ok(count)
    }
}
