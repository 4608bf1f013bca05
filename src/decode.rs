//! Typed decoding of raw CSV rows into [`NewPrice`] values.

use crate::archive::RowRecord;
use crate::config::{MAX_PRICE, PRICE_COLUMNS};
use crate::error::LedgerError;
use crate::models::{IngestMode, NewPrice};

const ID: usize = 0;
const NAME: usize = 1;
const CATEGORY: usize = 2;
const PRICE: usize = 3;
const CREATE_DATE: usize = 4;

/// Why a single row could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("name is empty")]
    EmptyName,

    #[error("invalid id {0:?}")]
    InvalidId(String),

    #[error("invalid price {0:?}")]
    InvalidPrice(String),
}

impl RowError {
    /// Lift into the request-level error for the row starting at `line`.
    pub fn at_line(self, line: u64) -> LedgerError {
        match self {
            RowError::InvalidPrice(value) => LedgerError::InvalidPrice { line, value },
            other => LedgerError::InvalidFormat {
                line,
                reason: other.to_string(),
            },
        }
    }
}

/// Decode one row of `id, name, category, price, create_date`.
///
/// The id column is only parsed in lenient mode; strict ingest ignores it
/// and lets the store assign one.
pub fn decode_row(row: &RowRecord, mode: IngestMode) -> Result<NewPrice, RowError> {
    let fields = &row.fields;
    if fields.len() != PRICE_COLUMNS.len() {
        return Err(RowError::Arity {
            expected: PRICE_COLUMNS.len(),
            found: fields.len(),
        });
    }

    let id = match mode {
        IngestMode::Strict => None,
        IngestMode::Lenient => Some(parse_id(&fields[ID])?),
    };

    if fields[NAME].is_empty() {
        return Err(RowError::EmptyName);
    }

    Ok(NewPrice {
        id,
        name: fields[NAME].clone(),
        category: fields[CATEGORY].clone(),
        price: parse_price(&fields[PRICE])?,
        create_date: fields[CREATE_DATE].clone(),
    })
}

fn parse_id(raw: &str) -> Result<i64, RowError> {
    raw.parse::<i64>()
        .map_err(|_| RowError::InvalidId(raw.to_string()))
}

/// Prices must be finite, non-negative and at most [`MAX_PRICE`].
pub fn parse_price(raw: &str) -> Result<f64, RowError> {
    match raw.parse::<f64>() {
        Ok(price) if (0.0..=MAX_PRICE).contains(&price) => Ok(price),
        _ => Err(RowError::InvalidPrice(raw.to_string())),
    }
}
