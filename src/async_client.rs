//! Async, pooled wrapper around [`PriceLedger`] for use inside Tokio.
//!
//! Holds several ledger handles opened on the same database, each behind a
//! [`Mutex`]. Operations pick a handle round-robin and run on the blocking
//! thread pool via [`tokio::task::spawn_blocking`], keeping the event loop
//! free while DuckDB works.
//!
//! # Example
//!
//! ```no_run
//! use price_ledger::AsyncPriceLedger;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ledger = AsyncPriceLedger::builder()
//!         .in_memory()
//!         .pool_size(2)
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let stats = ledger.stats().await.unwrap();
//!     println!("{} items", stats.total_items);
//! }
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::DEFAULT_POOL_SIZE;
use crate::connection::Location;
use crate::error::{LedgerError, Result};
use crate::models::{IngestMode, IngestReport, PriceExport, PriceStats};
use crate::PriceLedger;

// ---------------------------------------------------------------------------
// AsyncPriceLedgerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncPriceLedger`].
pub struct AsyncPriceLedgerBuilder {
    inner: crate::PriceLedgerBuilder,
    pool_size: usize,
}

impl Default for AsyncPriceLedgerBuilder {
    fn default() -> Self {
        Self {
            inner: PriceLedger::builder(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl AsyncPriceLedgerBuilder {
    /// Store the ledger in a DuckDB file.
    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.database(path);
        self
    }

    /// Keep the ledger in memory.
    pub fn in_memory(mut self) -> Self {
        self.inner = self.inner.in_memory();
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.inner = self.inner.location(location);
        self
    }

    pub fn ingest_mode(mut self, mode: IngestMode) -> Self {
        self.inner = self.inner.ingest_mode(mode);
        self
    }

    /// Number of store connections to keep. Must be at least 1.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Open the store and fill the pool.
    ///
    /// Runs on the blocking thread pool. A store that cannot be opened or
    /// pinged fails the build.
    pub async fn build(self) -> Result<AsyncPriceLedger> {
        if self.pool_size == 0 {
            return Err(LedgerError::InvalidArgument(
                "pool size must be at least 1".into(),
            ));
        }

        tokio::task::spawn_blocking(move || {
            let first = self.inner.build()?;
            let mut slots = Vec::with_capacity(self.pool_size);
            for _ in 1..self.pool_size {
                slots.push(Mutex::new(first.try_clone()?));
            }
            slots.insert(0, Mutex::new(first));
            log::debug!("Ledger pool ready with {} connection(s)", slots.len());

            Ok(AsyncPriceLedger {
                slots: Arc::new(slots),
                next: Arc::new(AtomicUsize::new(0)),
            })
        })
        .await
        .map_err(|e| LedgerError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncPriceLedger
// ---------------------------------------------------------------------------

/// Async handle over a small pool of [`PriceLedger`] connections.
///
/// Cloning is cheap and shares the pool. Each connection serves one
/// operation at a time; operations on different connections run in
/// parallel and are isolated only by DuckDB's own transactions.
#[derive(Clone)]
pub struct AsyncPriceLedger {
    slots: Arc<Vec<Mutex<PriceLedger>>>,
    next: Arc<AtomicUsize>,
}

impl AsyncPriceLedger {
    /// Create a new builder for configuring the async ledger.
    pub fn builder() -> AsyncPriceLedgerBuilder {
        AsyncPriceLedgerBuilder::default()
    }

    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    /// Run a sync ledger operation on the blocking thread pool.
    ///
    /// The closure receives a `&PriceLedger` from the next pool slot.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PriceLedger) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let index = self.next.fetch_add(1, Ordering::Relaxed) % slots.len();

        tokio::task::spawn_blocking(move || {
            let guard = slots[index]
                .lock()
                .map_err(|_| LedgerError::InvalidArgument("Ledger lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| LedgerError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Extract and record an uploaded archive.
    pub async fn ingest_archive(&self, bytes: Vec<u8>) -> Result<IngestReport> {
        self.run(move |ledger| ledger.ingest_archive(&bytes)).await
    }

    /// Serialize the whole ledger into a zip archive.
    pub async fn export(&self) -> Result<PriceExport> {
        self.run(|ledger| ledger.export()).await
    }

    pub async fn stats(&self) -> Result<PriceStats> {
        self.run(|ledger| ledger.stats()).await
    }

    pub async fn ping(&self) -> Result<()> {
        self.run(|ledger| ledger.ping()).await
    }

    pub async fn ingest_mode(&self) -> Result<IngestMode> {
        self.run(|ledger| Ok(ledger.ingest_mode())).await
    }
}
