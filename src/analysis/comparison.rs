use super::{Result, RunContext};
use crate::charts::{BarComparison, ChartRenderer, Series};
use crate::config::{ComparisonJob, ComparisonVariant};
use crate::data::coerce::{parse_amount, parse_year};
use crate::data::loader::DataLoader;
use crate::data::{DataError, Table};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug)]
pub struct ComparisonReport {
    pub job: String,
    pub charts: Vec<PathBuf>,
}

fn series_name(variant: &ComparisonVariant, label: &str, ctx: &RunContext) -> String {
    if variant.adjusted {
        format!(
            "Adjusted {} ({} USD)",
            label,
            ctx.normalizer.table().reference_year()
        )
    } else {
        format!("Original {}", label)
    }
}

/// Left/right amounts for one row, normalized when the variant asks for it.
fn row_pair(
    row_no: usize,
    left: &str,
    right: &str,
    year: &str,
    job: &ComparisonJob,
    variant: &ComparisonVariant,
    ctx: &RunContext,
) -> std::result::Result<(u64, u64), DataError> {
    let left = parse_amount(&job.left.column, left)?;
    let right = parse_amount(&job.right.column, right)?;
    if !variant.adjusted {
        return Ok((left, right));
    }

    let year = parse_year(&job.year_column, year)?;
    let normalize = |amount| {
        ctx.normalizer
            .normalize(amount, year)
            .map_err(|source| DataError::Normalization {
                row: row_no,
                source,
            })
    };
    Ok((normalize(left)?, normalize(right)?))
}

/// Build the bar chart for one variant. Rows that cannot be read or normalized drop out of
/// both series, or abort the run, according to the run policy.
pub fn build_variant(
    table: &Table,
    job: &ComparisonJob,
    variant: &ComparisonVariant,
    ctx: &RunContext,
) -> Result<Option<BarComparison>> {
    let titles = table.column(&job.label_column)?;
    let lefts = table.column(&job.left.column)?;
    let rights = table.column(&job.right.column)?;
    let years = if variant.adjusted {
        table.column(&job.year_column)?
    } else {
        vec![""; table.len()]
    };

    let mut labels = Vec::new();
    let mut left_values = Vec::new();
    let mut right_values = Vec::new();
    for (i, title) in titles.iter().enumerate() {
        let row_no = i + 1;
        match row_pair(row_no, lefts[i], rights[i], years[i], job, variant, ctx) {
            Ok((l, r)) => {
                labels.push(title.to_string());
                left_values.push(l);
                right_values.push(r);
            }
            Err(err) => {
                ctx.skip_or_abort::<()>(row_no, err, "dropped from chart")?;
            }
        }
    }

    if labels.is_empty() {
        warn!(job = %job.name, chart = %variant.title, "no rows to compare");
        return Ok(None);
    }

    Ok(Some(BarComparison {
        title: variant.title.clone(),
        labels,
        left: Series::new(series_name(variant, &job.left.label, ctx), left_values),
        right: Series::new(series_name(variant, &job.right.label, ctx), right_values),
        path: ctx.resolve(&variant.file),
    }))
}

pub fn run_comparison(
    job: &ComparisonJob,
    ctx: &RunContext,
    renderer: &mut dyn ChartRenderer,
) -> Result<ComparisonReport> {
    info!(job = %job.name, input = %job.input.display(), "running comparison");

    let mut required = vec![
        job.label_column.as_str(),
        job.left.column.as_str(),
        job.right.column.as_str(),
    ];
    if job.variants.iter().any(|v| v.adjusted) {
        required.push(job.year_column.as_str());
    }
    let table = DataLoader::load_with_columns(&job.input, &required)?;

    // Every variant is built before any is drawn, so an aborted job leaves no charts behind.
    let built = job
        .variants
        .iter()
        .map(|variant| build_variant(&table, job, variant, ctx))
        .collect::<Result<Vec<_>>>()?;

    let mut charts = Vec::new();
    for chart in built.into_iter().flatten() {
        renderer.bar_comparison(&chart)?;
        charts.push(chart.path);
    }

    Ok(ComparisonReport {
        job: job.name.clone(),
        charts,
    })
}
