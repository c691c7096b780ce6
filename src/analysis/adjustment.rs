use super::normalizer::FixedMultiplier;
use super::{Result, RunContext};
use crate::charts::{BarComparison, ChartRenderer, LineChart, Series};
use crate::config::{
    AdjustmentJob, AdjustmentMethod, ChartConfig, ChartKind, ColumnMapping, ConfigError,
};
use crate::data::coerce::{format_amount, parse_amount, parse_year};
use crate::data::loader::DataLoader;
use crate::data::{DataError, Table};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustedAmount {
    pub original: u64,
    pub adjusted: u64,
}

/// Per-row results for one source column; `None` where the sentinel was written.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedColumn {
    pub source: String,
    pub target: String,
    pub amounts: Vec<Option<AdjustedAmount>>,
}

impl AdjustedColumn {
    pub fn adjusted_count(&self) -> usize {
        self.amounts.iter().filter(|a| a.is_some()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.amounts.len() - self.adjusted_count()
    }
}

#[derive(Debug)]
pub struct AdjustmentReport {
    pub job: String,
    pub rows: usize,
    pub columns: Vec<AdjustedColumn>,
    pub output: PathBuf,
    pub chart: Option<PathBuf>,
}

enum Method {
    PriceIndex { year_idx: usize },
    Fixed(FixedMultiplier),
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn resolve_method(table: &Table, job: &AdjustmentJob, ctx: &RunContext) -> Result<Method> {
    match job.method {
        AdjustmentMethod::PriceIndex => Ok(Method::PriceIndex {
            year_idx: table.column_index(&job.year_column)?,
        }),
        AdjustmentMethod::FixedMultiplier => {
            let multiplier = job.multiplier.ok_or_else(|| ConfigError::InvalidJob {
                job: job.name.clone(),
                reason: "fixed_multiplier needs a multiplier".to_string(),
            })?;
            Ok(Method::Fixed(FixedMultiplier::new(
                multiplier,
                ctx.normalizer.rounding(),
            )))
        }
    }
}

fn adjust_column(
    table: &mut Table,
    job: &AdjustmentJob,
    mapping: &ColumnMapping,
    method: &Method,
    ctx: &RunContext,
) -> Result<AdjustedColumn> {
    let source_idx = table.column_index(&mapping.source)?;
    let mut amounts = Vec::with_capacity(table.len());

    for (i, row) in table.rows.iter_mut().enumerate() {
        let row_no = i + 1;
        let original = match parse_amount(&mapping.source, cell(row, source_idx)) {
            Ok(amount) => amount,
            Err(err) => {
                amounts.push(ctx.skip_or_abort(row_no, err, "sentinel written")?);
                continue;
            }
        };
        if job.reformat_source {
            if let Some(field) = row.get_mut(source_idx) {
                *field = format_amount(original);
            }
        }

        let adjusted = match method {
            Method::PriceIndex { year_idx } => parse_year(&job.year_column, cell(row, *year_idx))
                .and_then(|year| {
                    ctx.normalizer
                        .normalize(original, year)
                        .map_err(|source| DataError::Normalization {
                            row: row_no,
                            source,
                        })
                }),
            Method::Fixed(multiplier) => {
                multiplier
                    .apply(original)
                    .ok_or(DataError::AdjustmentOverflow {
                        row: row_no,
                        amount: original,
                    })
            }
        };

        match adjusted {
            Ok(adjusted) => {
                debug!(row = row_no, original, adjusted, column = %mapping.source, "adjusted");
                amounts.push(Some(AdjustedAmount { original, adjusted }));
            }
            Err(err) => amounts.push(ctx.skip_or_abort(row_no, err, "sentinel written")?),
        }
    }

    let rendered = amounts
        .iter()
        .map(|a| match a {
            Some(a) => a.adjusted.to_string(),
            None => ctx.sentinel.clone(),
        })
        .collect();
    table.set_column(&mapping.target, rendered);

    Ok(AdjustedColumn {
        source: mapping.source.clone(),
        target: mapping.target.clone(),
        amounts,
    })
}

/// Adjust every mapped column in place, appending one target column per source column.
pub fn adjust_table(
    table: &mut Table,
    job: &AdjustmentJob,
    ctx: &RunContext,
) -> Result<Vec<AdjustedColumn>> {
    job.validate()?;
    let method = resolve_method(table, job, ctx)?;

    job.columns
        .iter()
        .map(|mapping| adjust_column(table, job, mapping, &method, ctx))
        .collect()
}

fn build_chart(
    table: &Table,
    job: &AdjustmentJob,
    column: &AdjustedColumn,
    chart: &ChartConfig,
    ctx: &RunContext,
) -> Result<Option<ChartSpec>> {
    let titles = table.column(&job.label_column)?;

    let mut labels = Vec::new();
    let mut originals = Vec::new();
    let mut adjusted = Vec::new();
    for (title, amount) in titles.iter().zip(&column.amounts) {
        if let Some(amount) = amount {
            labels.push(title.to_string());
            originals.push(amount.original);
            adjusted.push(amount.adjusted);
        }
    }

    if labels.is_empty() {
        warn!(job = %job.name, chart = %chart.title, "no adjusted rows to chart");
        return Ok(None);
    }

    let path = ctx.resolve(&chart.file);
    let adjusted_name = chart
        .adjusted_label
        .clone()
        .unwrap_or_else(|| column.target.clone());

    let spec = match chart.kind {
        ChartKind::Line => ChartSpec::Line(LineChart {
            title: chart.title.clone(),
            labels,
            series: Series::new(adjusted_name, adjusted),
            path,
        }),
        ChartKind::BarComparison => ChartSpec::Bar(BarComparison {
            title: chart.title.clone(),
            labels,
            left: Series::new(
                chart
                    .original_label
                    .clone()
                    .unwrap_or_else(|| column.source.clone()),
                originals,
            ),
            right: Series::new(adjusted_name, adjusted),
            path,
        }),
    };
    Ok(Some(spec))
}

enum ChartSpec {
    Line(LineChart),
    Bar(BarComparison),
}

pub fn run_adjustment(
    job: &AdjustmentJob,
    ctx: &RunContext,
    renderer: &mut dyn ChartRenderer,
) -> Result<AdjustmentReport> {
    info!(job = %job.name, input = %job.input.display(), "running adjustment");

    let mut required: Vec<&str> = vec![job.label_column.as_str()];
    if job.method == AdjustmentMethod::PriceIndex {
        required.push(job.year_column.as_str());
    }
    required.extend(job.columns.iter().map(|c| c.source.as_str()));

    let mut table = DataLoader::load_with_columns(&job.input, &required)?;
    let columns = adjust_table(&mut table, job, ctx)?;

    let output = ctx.resolve(&job.output);
    DataLoader::save(&output, &table)?;

    let chart = match (&job.chart, columns.first()) {
        (Some(chart), Some(first)) => match build_chart(&table, job, first, chart, ctx)? {
            Some(ChartSpec::Line(line)) => {
                renderer.line_chart(&line)?;
                Some(line.path)
            }
            Some(ChartSpec::Bar(bar)) => {
                renderer.bar_comparison(&bar)?;
                Some(bar.path)
            }
            None => None,
        },
        _ => None,
    };

    for column in &columns {
        info!(
            job = %job.name,
            column = %column.source,
            adjusted = column.adjusted_count(),
            skipped = column.skipped_count(),
            "column adjusted"
        );
    }

    Ok(AdjustmentReport {
        job: job.name.clone(),
        rows: table.len(),
        columns,
        output,
        chart,
    })
}
