use crate::types::Year;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("No price index recorded for year {0}")]
    UnknownYear(Year),
    #[error("Reference year {0} is not in the price index table")]
    MissingReferenceYear(Year),
    #[error("Price index for {year} must be positive and finite, got {value}")]
    InvalidIndexValue { year: Year, value: f64 },
    #[error("Adjusted amount for {amount} in {year} does not fit in a whole-unit amount")]
    AmountOverflow { amount: u64, year: Year },
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// US CPI-U annual averages for the years the franchise data covers. The last entry is the
/// reference year.
const CPI_U: [(u16, f64); 10] = [
    (1979, 72.6),
    (1986, 109.6),
    (1992, 140.3),
    (1997, 160.5),
    (2004, 188.9),
    (2007, 207.3),
    (2012, 229.6),
    (2017, 245.1),
    (2024, 315.6),
    (2025, 319.1),
];

const CPI_U_REFERENCE: (u16, f64) = CPI_U[CPI_U.len() - 1];

/// Immutable year -> price index lookup with one designated reference year.
///
/// The table is sparse on purpose: only years backed by source data are present, and no value is
/// ever interpolated for a missing year.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceIndexTable {
    values: BTreeMap<Year, f64>,
    reference_year: Year,
    reference_value: f64,
}

impl PriceIndexTable {
    pub fn new(
        values: impl IntoIterator<Item = (Year, f64)>,
        reference_year: Year,
    ) -> Result<Self> {
        let values: BTreeMap<Year, f64> = values.into_iter().collect();

        for (&year, &value) in &values {
            if !value.is_finite() || value <= 0.0 {
                return Err(IndexError::InvalidIndexValue { year, value });
            }
        }

        let reference_value = *values
            .get(&reference_year)
            .ok_or(IndexError::MissingReferenceYear(reference_year))?;

        Ok(Self {
            values,
            reference_year,
            reference_value,
        })
    }

    /// Built-in CPI-U table normalized to 2025.
    pub fn cpi_u() -> Self {
        let values = CPI_U
            .iter()
            .map(|&(year, value)| (Year::new(year), value))
            .collect();
        let (reference_year, reference_value) = CPI_U_REFERENCE;

        Self {
            values,
            reference_year: Year::new(reference_year),
            reference_value,
        }
    }

    pub fn index_for(&self, year: Year) -> Result<f64> {
        self.values
            .get(&year)
            .copied()
            .ok_or(IndexError::UnknownYear(year))
    }

    pub fn reference_value(&self) -> f64 {
        self.reference_value
    }

    pub fn reference_year(&self) -> Year {
        self.reference_year
    }

    pub fn contains(&self, year: Year) -> bool {
        self.values.contains_key(&year)
    }

    /// Years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Year, f64)> + '_ {
        self.values.iter().map(|(&year, &value)| (year, value))
    }
}

impl Default for PriceIndexTable {
    fn default() -> Self {
        Self::cpi_u()
    }
}
