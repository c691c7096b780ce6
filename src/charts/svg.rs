use super::{BarComparison, ChartError, ChartRenderer, LineChart, Result};
use crate::data::coerce::format_currency;
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use tracing::info;

const BACKGROUND: RGBColor = RGBColor(0x2b, 0x2b, 0x2b);
const LINE_COLOR: RGBColor = RGBColor(0x00, 0xff, 0x90);
const LEFT_BAR: RGBColor = RGBColor(0xff, 0x3b, 0x3b);
const RIGHT_BAR: RGBColor = RGBColor(0xd9, 0xd1, 0xc7);
const BAR_WIDTH: f64 = 0.4;

fn drawing(err: impl Display) -> ChartError {
    ChartError::Drawing(err.to_string())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Category label for an x position, blank between categories.
fn label_at(labels: &[String], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    labels.get(nearest as usize).cloned().unwrap_or_default()
}

fn y_ceiling(max: u64) -> f64 {
    (max.max(1) as f64) * 1.1
}

/// Renders charts as SVG files.
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    pub line_size: (u32, u32),
    pub bar_size: (u32, u32),
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            line_size: (1000, 600),
            bar_size: (1200, 600),
        }
    }
}

impl SvgChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn line_chart(&mut self, chart: &LineChart) -> Result<()> {
        chart.validate()?;
        ensure_parent(&chart.path)?;

        let root = SVGBackend::new(&chart.path, self.line_size).into_drawing_area();
        root.fill(&BACKGROUND).map_err(drawing)?;

        let n = chart.labels.len();
        let x_fmt = |x: &f64| label_at(&chart.labels, *x);
        let y_fmt = |y: &f64| format_currency(y.max(0.0) as u64);
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24).into_font().color(&WHITE))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_ceiling(chart.series.max()))
            .map_err(drawing)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .light_line_style(TRANSPARENT)
            .bold_line_style(WHITE.mix(0.15))
            .x_labels(n)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_desc("Film Title")
            .y_desc("USD")
            .axis_style(WHITE)
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
            .draw()
            .map_err(drawing)?;

        let points: Vec<(f64, f64)> = chart
            .series
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v as f64))
            .collect();

        ctx.draw_series(LineSeries::new(points.iter().copied(), &LINE_COLOR))
            .map_err(drawing)?;
        ctx.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 4, LINE_COLOR.filled())),
        )
        .map_err(drawing)?;

        root.present().map_err(drawing)?;
        info!(path = %chart.path.display(), "rendered line chart");
        Ok(())
    }

    fn bar_comparison(&mut self, chart: &BarComparison) -> Result<()> {
        chart.validate()?;
        ensure_parent(&chart.path)?;

        let root = SVGBackend::new(&chart.path, self.bar_size).into_drawing_area();
        root.fill(&BACKGROUND).map_err(drawing)?;

        let n = chart.labels.len();
        let x_fmt = |x: &f64| label_at(&chart.labels, *x);
        let y_fmt = |y: &f64| format_currency(y.max(0.0) as u64);
        let top = y_ceiling(chart.left.max().max(chart.right.max()));
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24).into_font().color(&WHITE))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..top)
            .map_err(drawing)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .light_line_style(TRANSPARENT)
            .bold_line_style(WHITE.mix(0.15))
            .x_labels(n)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_desc("Film Title")
            .y_desc("USD")
            .axis_style(WHITE)
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
            .draw()
            .map_err(drawing)?;

        for (series, color, offset) in [
            (&chart.left, LEFT_BAR, -BAR_WIDTH),
            (&chart.right, RIGHT_BAR, 0.0),
        ] {
            ctx.draw_series(series.values.iter().enumerate().map(|(i, &v)| {
                let x0 = i as f64 + offset;
                Rectangle::new([(x0, 0.0), (x0 + BAR_WIDTH, v as f64)], color.mix(0.9).filled())
            }))
            .map_err(drawing)?
            .label(series.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(BACKGROUND)
            .border_style(WHITE)
            .label_font(("sans-serif", 12).into_font().color(&WHITE))
            .draw()
            .map_err(drawing)?;

        root.present().map_err(drawing)?;
        info!(path = %chart.path.display(), "rendered bar comparison");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Series;

    #[test]
    fn test_label_at_only_hits_integer_positions() {
        let labels = vec!["Alien".to_string(), "Aliens".to_string()];
        assert_eq!(label_at(&labels, 0.0), "Alien");
        assert_eq!(label_at(&labels, 1.0), "Aliens");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, -1.0), "");
        assert_eq!(label_at(&labels, 2.0), "");
    }

    #[test]
    fn test_bar_comparison_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("box_office.svg");
        let chart = BarComparison {
            title: "Box Office: Original vs. Adjusted".into(),
            labels: vec!["Alien".into(), "Aliens".into()],
            left: Series::new("Original Revenue", vec![104_931_801, 131_060_248]),
            right: Series::new("Adjusted Revenue", vec![461_208_018, 381_585_190]),
            path: path.clone(),
        };

        SvgChartRenderer::new().bar_comparison(&chart).unwrap();
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Original Revenue"));
    }

    #[test]
    fn test_line_chart_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.svg");
        let chart = LineChart {
            title: "Budgets".into(),
            labels: vec!["Alien".into()],
            series: Series::new("Adjusted Budget", vec![11_285_780]),
            path: path.clone(),
        };

        SvgChartRenderer::new().line_chart(&chart).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("Budgets"));
    }
}
