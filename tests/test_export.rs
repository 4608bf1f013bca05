//! Export pipeline tests: ordering, rounding, round trips and idempotence.

mod common;

use price_ledger::IngestMode;

#[test]
fn export_orders_rows_by_id() {
    let ledger = common::setup_ledger(IngestMode::Lenient);
    ledger
        .ingest_archive(&common::csv_archive(
            "3,Hammer,Tools,7.4,2024-01-03\n1,Widget,Tools,9.99,2024-01-01\n2,Apple,Food,1.5,2024-01-02\n",
        ))
        .unwrap();

    let export = ledger.export().unwrap();
    assert_eq!(export.rows, 3);
    assert!(export.skipped.is_empty());

    let rows = common::read_export(&export.archive);
    let ids: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(rows[0], vec!["1", "Widget", "Tools", "10", "2024-01-01"]);
    assert_eq!(rows[2], vec!["3", "Hammer", "Tools", "7", "2024-01-03"]);
}

#[test]
fn export_of_empty_ledger_has_empty_table() {
    let ledger = common::setup_ledger(IngestMode::Strict);

    let export = ledger.export().unwrap();
    assert_eq!(export.rows, 0);
    assert!(common::read_entry(&export.archive, "data.csv").is_empty());
}

#[test]
fn export_after_ingest_round_trips() {
    let ledger = common::setup_ledger(IngestMode::Strict);
    let uploaded = [
        ["Widget", "Tools", "9.99", "2024-01-01"],
        ["Apple, red", "Food", "1.2", "2024-01-02"],
        ["Hammer", "Tools", "15", "2024-01-03"],
    ];
    let csv: String = uploaded
        .iter()
        .enumerate()
        .map(|(i, [name, category, price, date])| {
            format!("{},\"{}\",{},{},{}\n", i + 1, name, category, price, date)
        })
        .collect();
    ledger
        .ingest_archive(&common::csv_archive_with_header(&csv))
        .unwrap();

    let rows = common::read_export(&ledger.export().unwrap().archive);
    assert_eq!(rows.len(), uploaded.len());

    for (row, [name, category, price, date]) in rows.iter().zip(uploaded.iter()) {
        let rounded = format!("{:.0}", price.parse::<f64>().unwrap());
        assert_eq!(row[1], *name);
        assert_eq!(row[2], *category);
        assert_eq!(row[3], rounded);
        assert_eq!(row[4], *date);
    }
}

#[test]
fn export_is_idempotent_without_writes() {
    let ledger = common::setup_ledger(IngestMode::Strict);
    ledger
        .ingest_archive(&common::csv_archive(
            "1,Widget,Tools,9.99,2024-01-01\n2,Apple,Food,1.5,2024-01-02\n",
        ))
        .unwrap();

    let first = ledger.export().unwrap();
    let second = ledger.export().unwrap();

    assert_eq!(
        common::read_entry(&first.archive, "data.csv"),
        common::read_entry(&second.archive, "data.csv")
    );
    assert_eq!(first.archive, second.archive);
}

#[test]
fn exported_archive_reingests_with_same_ids() {
    let source = common::setup_ledger(IngestMode::Strict);
    source
        .ingest_archive(&common::csv_archive(
            "1,Widget,Tools,9.99,2024-01-01\n2,Apple,Food,2,2024-01-02\n",
        ))
        .unwrap();
    let export = source.export().unwrap();

    let copy = common::setup_ledger(IngestMode::Lenient);
    let report = copy.ingest_archive(&export.archive).unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(common::ledger_ids(&copy), vec![1, 2]);
    assert_eq!(
        common::read_export(&copy.export().unwrap().archive),
        common::read_export(&export.archive)
    );
}

#[test]
fn export_omits_unreadable_rows_and_reports_them() {
    let ledger = common::setup_ledger(IngestMode::Strict);
    ledger
        .connection()
        .raw()
        .execute_batch(
            "DROP TABLE prices; \
             CREATE TABLE prices (id BIGINT, name VARCHAR, category VARCHAR, \
                                  price DOUBLE, create_date VARCHAR); \
             INSERT INTO prices VALUES \
                 (1, 'Widget', 'Tools', 9.99, '2024-01-01'), \
                 (2, NULL, 'Tools', 5.0, '2024-01-02'), \
                 (3, 'Apple', 'Food', 1.5, '2024-01-03');",
        )
        .unwrap();

    let export = ledger.export().unwrap();
    assert_eq!(export.rows, 2);
    assert_eq!(export.skipped.len(), 1);
    assert_eq!(export.skipped[0].position, 2);

    let rows = common::read_export(&export.archive);
    let ids: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}
