use anyhow::{bail, Context, Result};
use box_office_toolkit::analysis::adjustment::run_adjustment;
use box_office_toolkit::analysis::comparison::run_comparison;
use box_office_toolkit::analysis::RunContext;
use box_office_toolkit::charts::SvgChartRenderer;
use box_office_toolkit::config::Config;
use box_office_toolkit::data::coerce::{format_amount, parse_amount, parse_year};
use box_office_toolkit::logging::{init_logging, LogConfig};
use box_office_toolkit::ValueNormalizer;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "box-office-toolkit", version, about = "Inflation-adjust film financials")]
struct Cli {
    /// YAML config with the price index table and jobs
    #[arg(long, short, global = true, default_value = "config/franchise.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every configured job, or a single one by name
    Run {
        #[arg(long)]
        job: Option<String>,
    },
    /// Restate one amount in reference-year terms
    Normalize {
        /// Amount as written in the sheet, e.g. "~1,000,000"
        #[arg(long)]
        amount: String,
        #[arg(long)]
        year: String,
    },
    /// Print the price index table
    Table,
}

fn main() -> Result<()> {
    init_logging(LogConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;

    let cli = Cli::parse();
    // `run` needs a config file; the other commands fall back to the built-in table
    let required = matches!(cli.command, Commands::Run { .. });
    let config = Config::load_or_default(&cli.config, required)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    let table = config.price_index_table()?;
    let normalizer = ValueNormalizer::new(&table, config.rounding);

    match cli.command {
        Commands::Run { job } => {
            let names = config.job_names();
            if let Some(name) = &job {
                if !names.contains(&name.as_str()) {
                    bail!("no job named {name:?}; configured jobs: {}", names.join(", "));
                }
            }
            let selected = |name: &str| job.as_deref().map_or(true, |j| j == name);

            let ctx = RunContext::from_config(&config, normalizer);
            let mut renderer = SvgChartRenderer::new();

            for adjustment in config.adjustments.iter().filter(|j| selected(&j.name)) {
                let report = run_adjustment(adjustment, &ctx, &mut renderer)
                    .with_context(|| format!("adjustment job {:?} failed", adjustment.name))?;
                println!(
                    "{}: {} rows -> {}",
                    report.job,
                    report.rows,
                    report.output.display()
                );
                for column in &report.columns {
                    println!(
                        "  {} -> {}: {} adjusted, {} marked {:?}",
                        column.source,
                        column.target,
                        column.adjusted_count(),
                        column.skipped_count(),
                        ctx.sentinel
                    );
                }
                if let Some(chart) = &report.chart {
                    println!("  chart: {}", chart.display());
                }
            }

            for comparison in config.comparisons.iter().filter(|j| selected(&j.name)) {
                let report = run_comparison(comparison, &ctx, &mut renderer)
                    .with_context(|| format!("comparison job {:?} failed", comparison.name))?;
                println!("{}: {} charts", report.job, report.charts.len());
                for chart in &report.charts {
                    println!("  chart: {}", chart.display());
                }
            }
            info!("run complete");
        }
        Commands::Normalize { amount, year } => {
            let amount = parse_amount("amount", &amount)?;
            let year = parse_year("year", &year)?;
            let adjusted = normalizer.normalize(amount, year)?;
            println!(
                "{} ({}) = {} ({})",
                format_amount(amount),
                year,
                format_amount(adjusted),
                table.reference_year()
            );
        }
        Commands::Table => {
            println!("Reference year: {}", table.reference_year());
            println!("\n{:<6} {:>10} {:>12}", "Year", "Index", "Multiplier");
            println!("{:-<30}", "");
            for (year, value) in table.iter() {
                println!(
                    "{:<6} {:>10.1} {:>12.5}",
                    year,
                    value,
                    table.reference_value() / value
                );
            }
        }
    }

    Ok(())
}
