use std::path::PathBuf;

pub const PRICES_ROUTE: &str = "/api/v0/prices";

/// Multipart form field carrying the uploaded archive.
pub const UPLOAD_FIELD: &str = "file";

/// Suffix identifying the tabular entry inside an uploaded archive.
pub const TABLE_SUFFIX: &str = ".csv";

/// First field of a header row. A leading row starting with it is not data.
pub const HEADER_SENTINEL: &str = "id";

pub const EXPORT_ENTRY_NAME: &str = "data.csv";
pub const EXPORT_CONTENT_DISPOSITION: &str = "attachment; filename=data.zip";

/// Every price row has exactly these columns, in this order.
pub const PRICE_COLUMNS: [&str; 5] = ["id", "name", "category", "price", "create_date"];

/// Largest accepted unit price.
pub const MAX_PRICE: f64 = 1e12;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_POOL_SIZE: usize = 4;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 32;

/// Upload limit in bytes for a limit given in MiB, or `None` on overflow.
pub fn upload_limit_bytes(max_upload_mb: usize) -> Option<usize> {
    max_upload_mb.checked_mul(1024 * 1024)
}

/// Database location that selects an in-memory DuckDB instance.
pub const IN_MEMORY: &str = ":memory:";

pub fn default_database_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("price-ledger").join("prices.duckdb")
    } else {
        PathBuf::from(".price-ledger").join("prices.duckdb")
    }
}
