pub mod svg;

pub use svg::SvgChartRenderer;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Drawing error: {0}")]
    Drawing(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Chart {0:?} has no data points")]
    EmptySeries(String),
    #[error("Chart {title:?}: {labels} labels but {values} values")]
    LengthMismatch {
        title: String,
        labels: usize,
        values: usize,
    },
}

pub type Result<T> = std::result::Result<T, ChartError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<u64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<u64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn max(&self) -> u64 {
        self.values.iter().copied().max().unwrap_or(0)
    }
}

/// One value series plotted against category labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub labels: Vec<String>,
    pub series: Series,
    pub path: PathBuf,
}

/// Two value series drawn as side-by-side bars per label.
#[derive(Debug, Clone, PartialEq)]
pub struct BarComparison {
    pub title: String,
    pub labels: Vec<String>,
    pub left: Series,
    pub right: Series,
    pub path: PathBuf,
}

impl LineChart {
    pub fn validate(&self) -> Result<()> {
        check_lengths(&self.title, &self.labels, &[&self.series])
    }
}

impl BarComparison {
    pub fn validate(&self) -> Result<()> {
        check_lengths(&self.title, &self.labels, &[&self.left, &self.right])
    }
}

fn check_lengths(title: &str, labels: &[String], series: &[&Series]) -> Result<()> {
    if labels.is_empty() {
        return Err(ChartError::EmptySeries(title.to_string()));
    }
    for s in series {
        if s.values.len() != labels.len() {
            return Err(ChartError::LengthMismatch {
                title: title.to_string(),
                labels: labels.len(),
                values: s.values.len(),
            });
        }
    }
    Ok(())
}

/// Sink for rendered charts. Jobs only hand over finished series.
pub trait ChartRenderer {
    fn line_chart(&mut self, chart: &LineChart) -> Result<()>;
    fn bar_comparison(&mut self, chart: &BarComparison) -> Result<()>;
}
