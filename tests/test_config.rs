//! Configuration helper tests.

use price_ledger::config::{default_database_path, upload_limit_bytes, DEFAULT_MAX_UPLOAD_MB};

#[test]
fn upload_limit_converts_mib_to_bytes() {
    assert_eq!(upload_limit_bytes(0), Some(0));
    assert_eq!(upload_limit_bytes(1), Some(1024 * 1024));
    assert_eq!(
        upload_limit_bytes(DEFAULT_MAX_UPLOAD_MB),
        Some(32 * 1024 * 1024)
    );
}

#[test]
fn upload_limit_that_overflows_is_rejected() {
    assert_eq!(upload_limit_bytes(usize::MAX), None);
    assert_eq!(upload_limit_bytes(usize::MAX / (1024 * 1024) + 1), None);
    assert!(upload_limit_bytes(usize::MAX / (1024 * 1024)).is_some());
}

#[test]
fn default_database_path_ends_with_ledger_file() {
    let path = default_database_path();
    assert!(path.ends_with("price-ledger/prices.duckdb"));
}
