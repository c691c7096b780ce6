pub mod coerce;
pub mod loader;

use crate::analysis::price_index::IndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Malformed amount in column {column:?}: {value:?}")]
    MalformedAmount { column: String, value: String },
    #[error("Invalid year in column {column:?}: {value:?}")]
    InvalidYear { column: String, value: String },
    #[error("Normalization failed for row {row}: {source}")]
    Normalization {
        row: usize,
        #[source]
        source: IndexError,
    },
    #[error("Adjusted amount for row {row} overflows: {amount}")]
    AdjustmentOverflow { row: usize, amount: u64 },
    #[error("No data rows in {0}")]
    EmptyInput(String),
}

pub type Result<T> = std::result::Result<T, DataError>;

/// A CSV file held in memory: header names plus rows of text fields in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
            .collect())
    }

    /// Append a column, or overwrite it in place when the header already exists.
    /// `values` must hold one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        let idx = match self.headers.iter().position(|h| h == name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };

        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() <= idx {
                row.resize(idx + 1, String::new());
            }
            row[idx] = value;
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
