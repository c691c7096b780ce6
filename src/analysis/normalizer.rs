use super::price_index::{IndexError, PriceIndexTable, Result};
use crate::types::{RoundingMode, Year};

// 2^64; any rounded value at or above it cannot be a u64.
const U64_CEILING: f64 = 18_446_744_073_709_551_616.0;

/// Restates whole-unit amounts recorded in a historical year in reference-year terms.
///
/// `normalize(amount, year) = round(amount * (reference_value / index_for(year)))`
#[derive(Debug, Clone, Copy)]
pub struct ValueNormalizer<'a> {
    table: &'a PriceIndexTable,
    rounding: RoundingMode,
}

impl<'a> ValueNormalizer<'a> {
    pub fn new(table: &'a PriceIndexTable, rounding: RoundingMode) -> Self {
        Self { table, rounding }
    }

    pub fn table(&self) -> &'a PriceIndexTable {
        self.table
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Multiplier that takes an amount from `year` to the reference year.
    pub fn ratio(&self, year: Year) -> Result<f64> {
        Ok(self.table.reference_value() / self.table.index_for(year)?)
    }

    pub fn normalize(&self, amount: u64, year: Year) -> Result<u64> {
        let index = self.table.index_for(year)?;
        if amount == 0 {
            return Ok(0);
        }
        // Exact identity, even for amounts beyond f64's integer precision
        if index == self.table.reference_value() {
            return Ok(amount);
        }

        let ratio = self.table.reference_value() / index;
        let adjusted = self.rounding.apply(amount as f64 * ratio);
        if !adjusted.is_finite() || adjusted >= U64_CEILING {
            return Err(IndexError::AmountOverflow { amount, year });
        }
        Ok(adjusted as u64)
    }
}

/// Scales every amount by one constant, independent of year.
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplier {
    multiplier: f64,
    rounding: RoundingMode,
}

impl FixedMultiplier {
    pub fn new(multiplier: f64, rounding: RoundingMode) -> Self {
        Self {
            multiplier,
            rounding,
        }
    }

    pub fn apply(&self, amount: u64) -> Option<u64> {
        let adjusted = self.rounding.apply(amount as f64 * self.multiplier);
        if adjusted.is_finite() && adjusted >= 0.0 && adjusted < U64_CEILING {
            Some(adjusted as u64)
        } else {
            None
        }
    }
}
