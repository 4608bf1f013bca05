//! DuckDB connection wrapper with schema bootstrap, transactions and query execution.
//!
//! The ledger only ever talks to the store through this type: parameterized
//! statements in, rows (or deserialized structs) out.

use crate::error::{LedgerError, Result};
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Bootstrap DDL for the `prices` table. Never alters an existing table.
const SCHEMA_SQL: &str = "\
    CREATE SEQUENCE IF NOT EXISTS prices_id_seq START 1; \
    CREATE TABLE IF NOT EXISTS prices ( \
        id BIGINT PRIMARY KEY DEFAULT nextval('prices_id_seq'), \
        name VARCHAR NOT NULL, \
        category VARCHAR NOT NULL, \
        price DOUBLE NOT NULL, \
        create_date VARCHAR NOT NULL \
    );";

/// Where the DuckDB database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Memory,
    File(PathBuf),
}

impl Location {
    /// Interpret a CLI/config value; `:memory:` selects an in-memory database.
    pub fn parse(value: &str) -> Self {
        if value == crate::config::IN_MEMORY {
            Location::Memory
        } else {
            Location::File(PathBuf::from(value))
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Memory => f.write_str(crate::config::IN_MEMORY),
            Location::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Wraps a DuckDB connection to the price ledger database.
pub struct Connection {
    conn: DuckDbConnection,
    location: Location,
}

impl Connection {
    /// Open the database at `location`, creating parent directories for a
    /// file-backed database.
    pub fn open(location: &Location) -> Result<Self> {
        let conn = match location {
            Location::Memory => DuckDbConnection::open_in_memory()?,
            Location::File(path) => {
                ensure_parent(path)?;
                DuckDbConnection::open(path)?
            }
        };
        Ok(Self {
            conn,
            location: location.clone(),
        })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&Location::Memory)
    }

    /// Open another connection to the same database instance.
    ///
    /// For in-memory databases the clone sees the same tables, which is what
    /// lets several pooled connections share one ledger.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            conn: self.conn.try_clone()?,
            location: self.location.clone(),
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Round-trip a trivial query to prove the store is reachable.
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
        Ok(())
    }

    /// Create the `prices` table and its id sequence if they are missing.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        log::debug!("Schema ensured for {}", self.location);
        Ok(())
    }

    /// Run `f` inside a single transaction.
    ///
    /// Commits when `f` succeeds. Any error from `f` or from the commit rolls
    /// the whole transaction back and surfaces as
    /// [`LedgerError::StorageWriteFailed`].
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&DuckDbConnection) -> duckdb::Result<T>,
    {
        self.conn.execute_batch("BEGIN TRANSACTION")?;

        let outcome = f(&self.conn).and_then(|value| {
            self.conn.execute_batch("COMMIT")?;
            Ok(value)
        });

        outcome.map_err(|e| {
            // A failed COMMIT has already aborted the transaction in DuckDB,
            // so a rollback error here is expected and only worth a debug line.
            if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                log::debug!("Rollback after failed write: {}", rollback);
            }
            LedgerError::StorageWriteFailed(e)
        })
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has run.
        let column_names: Vec<String> = match rows.as_ref() {
            Some(stmt) => stmt.column_names().into_iter().map(|s| s.to_string()).collect(),
            None => Vec::new(),
        };

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                map.insert(col_name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            log::info!("Created database directory: {}", parent.display());
        }
    }
    Ok(())
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UTinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::USmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => serde_json::Value::Number(i.into()),
            Err(_) => serde_json::Value::String(n.to_string()),
        },
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
        // Dates, decimals, lists and the rest never appear in the ledger schema.
        _ => serde_json::Value::Null,
    }
}
