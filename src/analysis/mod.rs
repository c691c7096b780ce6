pub mod adjustment;
pub mod comparison;
pub mod normalizer;
pub mod price_index;

use crate::charts::ChartError;
use crate::config::{Config, ConfigError};
use crate::data::DataError;
use crate::types::UnknownPolicy;
use normalizer::ValueNormalizer;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, JobError>;

/// Settings shared by every job in one run.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub normalizer: ValueNormalizer<'a>,
    pub policy: UnknownPolicy,
    pub sentinel: String,
    pub output_dir: Option<PathBuf>,
}

impl<'a> RunContext<'a> {
    pub fn new(normalizer: ValueNormalizer<'a>) -> Self {
        Self {
            normalizer,
            policy: UnknownPolicy::default(),
            sentinel: "Unknown".to_string(),
            output_dir: None,
        }
    }

    pub fn from_config(config: &Config, normalizer: ValueNormalizer<'a>) -> Self {
        Self {
            normalizer,
            policy: config.unknown_policy,
            sentinel: config.sentinel.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn with_policy(mut self, policy: UnknownPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Apply the run-wide policy to a field that could not be adjusted:
    /// `Ok(None)` means the caller skips the row as described by `action`,
    /// `Err` aborts the run.
    pub(crate) fn skip_or_abort<T>(
        &self,
        row: usize,
        err: DataError,
        action: &str,
    ) -> Result<Option<T>> {
        match self.policy {
            UnknownPolicy::Abort => Err(err.into()),
            UnknownPolicy::Sentinel => {
                warn!(row, error = %err, action, "row skipped");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::price_index::{IndexError, PriceIndexTable};
    use crate::types::{RoundingMode, Year};

    fn unknown_year() -> DataError {
        DataError::Normalization {
            row: 2,
            source: IndexError::UnknownYear(Year::new(2099)),
        }
    }

    #[test]
    fn test_skip_or_abort_follows_policy() {
        let table = PriceIndexTable::cpi_u();
        let ctx = RunContext::new(ValueNormalizer::new(&table, RoundingMode::HalfEven));

        let skipped = ctx
            .skip_or_abort::<u64>(2, unknown_year(), "dropped from chart")
            .unwrap();
        assert_eq!(skipped, None);

        let ctx = ctx.with_policy(UnknownPolicy::Abort);
        assert!(matches!(
            ctx.skip_or_abort::<u64>(2, unknown_year(), "sentinel written"),
            Err(JobError::Data(DataError::Normalization { row: 2, .. }))
        ));
    }
}
