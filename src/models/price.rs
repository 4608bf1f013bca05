use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// PriceRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub create_date: String,
}

impl PriceRecord {
    /// Read a row selected as `id, name, category, price, create_date`.
    pub fn from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            price: row.get(3)?,
            create_date: row.get(4)?,
        })
    }

    /// CSV cells in export order, price rounded to zero decimals.
    pub fn to_csv_fields(&self) -> [String; 5] {
        [
            self.id.to_string(),
            self.name.clone(),
            self.category.clone(),
            format!("{:.0}", self.price),
            self.create_date.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// NewPrice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NewPrice {
    /// Caller-supplied id. Only set in [`IngestMode::Lenient`]; strict
    /// ingest lets the store assign ids.
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub create_date: String,
}

// ---------------------------------------------------------------------------
// PriceStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub total_items: i64,
    pub total_categories: i64,
    /// Exact sum; serialized rounded to a whole number.
    #[serde(serialize_with = "serialize_whole")]
    pub total_price: f64,
}

/// Round half to even (the `%.0f` rule) and emit an integer when it fits.
fn serialize_whole<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let rounded = value.round_ties_even();
    // Beyond 2^53 an f64 no longer maps onto consecutive integers.
    if rounded.is_finite() && rounded.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(rounded as i64)
    } else {
        serializer.serialize_f64(rounded)
    }
}

// ---------------------------------------------------------------------------
// IngestMode
// ---------------------------------------------------------------------------

/// How an upload is validated and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Any bad row rejects the whole upload; all rows commit in one
    /// transaction and the store assigns ids.
    #[default]
    Strict,
    /// Bad rows are skipped; every valid row is inserted on its own with
    /// the caller's id, and a failed insert only skips that row.
    Lenient,
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestMode::Strict => f.write_str("strict"),
            IngestMode::Lenient => f.write_str("lenient"),
        }
    }
}

impl FromStr for IngestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(IngestMode::Strict),
            "lenient" => Ok(IngestMode::Lenient),
            other => Err(format!(
                "unknown ingest mode '{other}' (expected 'strict' or 'lenient')"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A row left out of an ingest or export, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// CSV line number on ingest; 1-based result row on export.
    pub position: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub skipped: Vec<SkippedRow>,
    /// Computed after the batch, over the whole ledger.
    pub stats: PriceStats,
}

#[derive(Debug, Clone)]
pub struct PriceExport {
    /// Zip archive holding a single `data.csv` entry.
    pub archive: Vec<u8>,
    pub rows: usize,
    pub skipped: Vec<SkippedRow>,
}
