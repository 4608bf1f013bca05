use crate::AsyncPriceLedger;

/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Pooled ledger handle. Dispatches blocking store work to a thread
    /// pool internally.
    pub ledger: AsyncPriceLedger,

    /// Largest accepted request body for uploads, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(ledger: AsyncPriceLedger, max_upload_bytes: usize) -> Self {
        Self {
            ledger,
            max_upload_bytes,
        }
    }
}
