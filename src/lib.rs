//! Price ledger service.
//!
//! Exchanges price lists with a DuckDB-backed ledger as zip-wrapped CSV:
//! uploads are extracted, validated and recorded, downloads serialize the
//! current ledger back into the same format.
//!
//! # Quick start
//!
//! ```no_run
//! use price_ledger::PriceLedger;
//!
//! let ledger = PriceLedger::builder().in_memory().build().unwrap();
//!
//! // Record an uploaded archive
//! # let upload: Vec<u8> = Vec::new();
//! let report = ledger.ingest_archive(&upload).unwrap();
//! println!("{} items in ledger", report.stats.total_items);
//!
//! // Serialize the ledger back into an archive
//! let export = ledger.export().unwrap();
//! ```

pub mod archive;
#[cfg(feature = "server")]
pub mod async_client;
pub mod config;
pub mod connection;
pub mod decode;
pub mod error;
pub mod models;
pub mod queries;
#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "server")]
pub use async_client::AsyncPriceLedger;
pub use connection::{Connection, Location};
pub use error::{LedgerError, Result};
pub use models::{IngestMode, IngestReport, PriceExport, PriceRecord, PriceStats, SkippedRow};

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// PriceLedgerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`PriceLedger`].
///
/// Use [`PriceLedger::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](PriceLedgerBuilder::build) to open the store.
#[derive(Debug, Clone)]
pub struct PriceLedgerBuilder {
    location: Location,
    ingest_mode: IngestMode,
}

impl Default for PriceLedgerBuilder {
    fn default() -> Self {
        Self {
            location: Location::File(config::default_database_path()),
            ingest_mode: IngestMode::default(),
        }
    }
}

impl PriceLedgerBuilder {
    /// Store the ledger in a DuckDB file.
    ///
    /// If not set, the platform data directory is used (e.g.
    /// `~/.local/share/price-ledger/prices.duckdb` on Linux).
    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.location = Location::File(path.as_ref().to_path_buf());
        self
    }

    /// Keep the ledger in memory. Nothing survives the process.
    pub fn in_memory(mut self) -> Self {
        self.location = Location::Memory;
        self
    }

    /// Set where the ledger lives.
    pub fn location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Choose how uploads are validated and written. Defaults to
    /// [`IngestMode::Strict`].
    pub fn ingest_mode(mut self, mode: IngestMode) -> Self {
        self.ingest_mode = mode;
        self
    }

    /// Open the store, check it answers, and make sure the `prices` table exists.
    pub fn build(self) -> Result<PriceLedger> {
        let conn = Connection::open(&self.location)?;
        conn.ping()?;
        conn.ensure_schema()?;
        log::info!(
            "Opened price ledger at {} ({} ingest)",
            self.location,
            self.ingest_mode
        );
        Ok(PriceLedger {
            conn,
            ingest_mode: self.ingest_mode,
        })
    }
}

// ---------------------------------------------------------------------------
// PriceLedger
// ---------------------------------------------------------------------------

/// The ledger handle: one store connection plus the ingest policy.
///
/// Created via [`PriceLedger::builder()`]. Pass it (or an
/// [`AsyncPriceLedger`] pool of them) to whatever serves requests; there is
/// no process-wide store state.
pub struct PriceLedger {
    conn: Connection,
    ingest_mode: IngestMode,
}

impl PriceLedger {
    /// Create a new builder for configuring the ledger.
    pub fn builder() -> PriceLedgerBuilder {
        PriceLedgerBuilder::default()
    }

    /// Access the price query interface.
    pub fn prices(&self) -> queries::prices::PriceQuery<'_> {
        queries::prices::PriceQuery::new(&self.conn)
    }

    pub fn ingest_mode(&self) -> IngestMode {
        self.ingest_mode
    }

    /// Extract the first CSV entry of `bytes` and record its rows.
    ///
    /// Returns the batch outcome with aggregates over the entire ledger.
    pub fn ingest_archive(&self, bytes: &[u8]) -> Result<IngestReport> {
        let rows = archive::extract_rows(bytes)?;
        log::debug!("Extracted {} data row(s) from upload", rows.len());
        self.prices().ingest(&rows, self.ingest_mode)
    }

    /// Serialize the whole ledger, ordered by id, into a zip holding `data.csv`.
    pub fn export(&self) -> Result<PriceExport> {
        let (records, skipped) = self.prices().all()?;
        let table = archive::encode_table(&records)?;
        let archive = archive::write_archive(config::EXPORT_ENTRY_NAME, &table)?;
        Ok(PriceExport {
            archive,
            rows: records.len(),
            skipped,
        })
    }

    /// Aggregates over the whole ledger.
    pub fn stats(&self) -> Result<PriceStats> {
        self.prices().stats()
    }

    /// Check that the store still answers.
    pub fn ping(&self) -> Result<()> {
        self.conn.ping()
    }

    /// Open a second handle on the same database with the same policy.
    pub fn try_clone(&self) -> Result<PriceLedger> {
        Ok(PriceLedger {
            conn: self.conn.try_clone()?,
            ingest_mode: self.ingest_mode,
        })
    }

    /// Execute a raw SQL query against the ledger database.
    ///
    /// * `query` - SQL string with `?` positional placeholders.
    /// * `params` - Parameter values corresponding to the placeholders.
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.conn.execute(query, params)
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl fmt::Display for PriceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PriceLedger(database={}, ingest_mode={})",
            self.conn.location(),
            self.ingest_mode
        )
    }
}
