use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::analysis::price_index::{IndexError, PriceIndexTable};
use crate::types::{RoundingMode, UnknownPolicy, Year};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid price index table: {0}")]
    PriceIndex(#[from] IndexError),
    #[error("Invalid job {job:?}: {reason}")]
    InvalidJob { job: String, reason: String },
    #[error("Duplicate job name: {0}")]
    DuplicateJob(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn default_sentinel() -> String {
    "Unknown".to_string()
}

fn default_label_column() -> String {
    "Film Title".to_string()
}

fn default_year_column() -> String {
    "Year".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceIndexConfig {
    pub reference_year: Year,
    #[serde(deserialize_with = "unique_years")]
    pub values: BTreeMap<Year, f64>,
}

/// `"1979"` and `1979` are distinct YAML keys but the same year; reject the repeat instead of
/// letting the later value win.
fn unique_years<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<Year, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueYears;

    impl<'de> Visitor<'de> for UniqueYears {
        type Value = BTreeMap<Year, f64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of year to price index value")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut values = BTreeMap::new();
            while let Some((year, value)) = map.next_entry::<Year, f64>()? {
                if values.insert(year, value).is_some() {
                    return Err(de::Error::custom(format!(
                        "price index year {year} is listed more than once"
                    )));
                }
            }
            Ok(values)
        }
    }

    deserializer.deserialize_map(UniqueYears)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentMethod {
    /// Per-row year looked up in the price index table.
    #[default]
    PriceIndex,
    /// One constant applied to every row; needs `multiplier`.
    FixedMultiplier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Adjusted values of the first mapped column.
    Line,
    /// Original vs adjusted values of the first mapped column.
    BarComparison,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub title: String,
    pub file: PathBuf,
    #[serde(default)]
    pub original_label: Option<String>,
    #[serde(default)]
    pub adjusted_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentJob {
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default = "default_year_column")]
    pub year_column: String,
    #[serde(default)]
    pub method: AdjustmentMethod,
    #[serde(default)]
    pub multiplier: Option<f64>,
    pub columns: Vec<ColumnMapping>,
    /// Rewrite parsed source amounts with grouping separators.
    #[serde(default)]
    pub reformat_source: bool,
    #[serde(default)]
    pub chart: Option<ChartConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesColumn {
    pub column: String,
    /// Short name used in legends, e.g. "Budget".
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonVariant {
    pub adjusted: bool,
    pub title: String,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonJob {
    pub name: String,
    pub input: PathBuf,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default = "default_year_column")]
    pub year_column: String,
    pub left: SeriesColumn,
    pub right: SeriesColumn,
    pub variants: Vec<ComparisonVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub price_index: Option<PriceIndexConfig>,
    #[serde(default)]
    pub rounding: RoundingMode,
    #[serde(default)]
    pub unknown_policy: UnknownPolicy,
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
    /// Base directory for relative output and chart paths.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub adjustments: Vec<AdjustmentJob>,
    #[serde(default)]
    pub comparisons: Vec<ComparisonJob>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            price_index: None,
            rounding: RoundingMode::default(),
            unknown_policy: UnknownPolicy::default(),
            sentinel: default_sentinel(),
            output_dir: None,
            adjustments: Vec::new(),
            comparisons: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Load `path`, or fall back to the defaults (built-in CPI-U table, no jobs) when the file
    /// does not exist and `required` is false.
    pub fn load_or_default(path: impl AsRef<Path>, required: bool) -> Result<Self> {
        let path = path.as_ref();
        if required || path.exists() {
            return Self::load(path);
        }
        warn!(path = %path.display(), "config not found, using built-in CPI-U table");
        Ok(Self::default())
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Table from the `price_index` section, or the built-in CPI-U table when absent.
    pub fn price_index_table(&self) -> Result<PriceIndexTable> {
        match &self.price_index {
            Some(section) => Ok(PriceIndexTable::new(
                section.values.iter().map(|(&y, &v)| (y, v)),
                section.reference_year,
            )?),
            None => Ok(PriceIndexTable::cpi_u()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.price_index_table()?;

        let mut names = HashSet::new();
        let all_names = self
            .adjustments
            .iter()
            .map(|j| &j.name)
            .chain(self.comparisons.iter().map(|j| &j.name));
        for name in all_names {
            if !names.insert(name.as_str()) {
                return Err(ConfigError::DuplicateJob(name.clone()));
            }
        }

        for job in &self.adjustments {
            job.validate()?;
        }
        for job in &self.comparisons {
            if job.variants.is_empty() {
                return Err(invalid(&job.name, "no variants to render"));
            }
        }
        Ok(())
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.adjustments
            .iter()
            .map(|j| j.name.as_str())
            .chain(self.comparisons.iter().map(|j| j.name.as_str()))
            .collect()
    }
}

fn invalid(job: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidJob {
        job: job.to_string(),
        reason: reason.into(),
    }
}

impl AdjustmentJob {
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(invalid(&self.name, "no columns to adjust"));
        }
        match (self.method, self.multiplier) {
            (AdjustmentMethod::FixedMultiplier, None) => {
                Err(invalid(&self.name, "fixed_multiplier needs a multiplier"))
            }
            (AdjustmentMethod::FixedMultiplier, Some(m)) if !m.is_finite() || m <= 0.0 => {
                Err(invalid(&self.name, format!("multiplier must be positive, got {m}")))
            }
            (AdjustmentMethod::PriceIndex, Some(_)) => Err(invalid(
                &self.name,
                "multiplier is only used with fixed_multiplier",
            )),
            _ => Ok(()),
        }
    }
}
