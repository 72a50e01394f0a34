//! Chart Plotter Module
//! Renders the exploratory charts as PNG files using plotters.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataFrame;
use thiserror::Error;

use crate::data::processor::{self, StageError};
use crate::stats::StatsCalculator;

/// Line color for the GHI series
const GHI_COLOR: RGBColor = RGBColor(255, 140, 0); // Orange
/// Point color for the wind scatter
const WIND_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue
/// Cell color for correlation pairs with no usable observations
const MISSING_CELL: RGBColor = RGBColor(220, 220, 220); // Light grey

/// Columns the correlation heatmap is computed over.
pub const CORRELATION_COLUMNS: &[&str] = &["GHI", "DNI", "DHI", "Tamb", "TModA", "TModB"];

const TIME_SERIES_SIZE: (u32, u32) = (1000, 600);
const CHART_SIZE: (u32, u32) = (800, 600);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("nothing to plot: {0}")]
    Empty(&'static str),
    #[error("failed to render chart: {0}")]
    Render(String),
}

fn render_err(e: impl std::fmt::Display) -> ChartError {
    ChartError::Render(e.to_string())
}

/// Renders the exploratory charts. Each function validates its required
/// columns before touching the drawing backend, writes one PNG under the
/// given directory and returns the written path.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Line chart of GHI against the parsed `Timestamp` column.
    ///
    /// The chart is skipped when any timestamp fails to parse: a partially
    /// invalid time axis would silently misplace the remaining points.
    pub fn time_series(df: &DataFrame, out_dir: &Path) -> Result<PathBuf, ChartError> {
        processor::require_columns(df, &["Timestamp", "GHI"])?;

        let stamps = processor::parse_timestamps(df, "Timestamp")?;
        if stamps.invalid > 0 {
            return Err(StageError::UnparseableTimestamps(stamps.invalid).into());
        }
        let ghi = processor::numeric_column(df, "GHI")?;

        let series: Vec<(NaiveDateTime, f64)> = stamps
            .values
            .iter()
            .zip(ghi)
            .filter_map(|(ts, v)| Some(((*ts)?, v?)))
            .collect();
        if series.is_empty() {
            return Err(ChartError::Empty("no complete (Timestamp, GHI) observations"));
        }

        let (min_t, max_t) = series
            .iter()
            .fold((series[0].0, series[0].0), |(lo, hi), (t, _)| {
                (lo.min(*t), hi.max(*t))
            });
        // A single instant makes a zero-width axis; widen it.
        let max_t = if min_t == max_t {
            max_t + chrono::Duration::hours(1)
        } else {
            max_t
        };
        let (y0, y1) = padded_range(series.iter().map(|(_, v)| *v));

        let path = out_dir.join("time_series_ghi.png");
        let root = BitMapBackend::new(&path, TIME_SERIES_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Global Horizontal Irradiance Over Time", ("sans-serif", 28))
            .margin(10)
            .x_label_area_size(90)
            .y_label_area_size(70)
            .build_cartesian_2d(RangedDateTime::from(min_t..max_t), y0..y1)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc("Time")
            .y_desc("GHI (W/m²)")
            .x_label_formatter(&|t: &NaiveDateTime| t.format("%Y-%m-%d %H:%M").to_string())
            .x_label_style(("sans-serif", 11).into_font().transform(FontTransform::Rotate90))
            .light_line_style(BLACK.mix(0.15))
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(series, GHI_COLOR))
            .map_err(render_err)?
            .label("GHI")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], GHI_COLOR));

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(path.clone())
    }

    /// Annotated heatmap of the Pearson correlation matrix over
    /// `CORRELATION_COLUMNS`, diverging cool-to-warm scale over [-1, 1].
    pub fn correlation_heatmap(df: &DataFrame, out_dir: &Path) -> Result<PathBuf, ChartError> {
        let matrix = StatsCalculator::correlation_matrix(df, CORRELATION_COLUMNS)?;
        let n = matrix.labels.len();

        let path = out_dir.join("correlation_matrix.png");
        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Correlation Matrix", ("sans-serif", 28))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)
            .map_err(render_err)?;

        let x_fmt = |v: &f64| cell_label(&matrix.labels, *v, false);
        let y_fmt = |v: &f64| cell_label(&matrix.labels, *v, true);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(n + 1)
            .y_labels(n + 1)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .draw()
            .map_err(render_err)?;

        // Row 0 of the matrix is drawn as the top row of cells.
        chart
            .draw_series((0..n).flat_map(|i| (0..n).map(move |j| (i, j))).map(|(i, j)| {
                Rectangle::new(
                    [
                        (i as f64, (n - 1 - j) as f64),
                        ((i + 1) as f64, (n - j) as f64),
                    ],
                    heat_color(matrix.values[j][i]).filled(),
                )
            }))
            .map_err(render_err)?;

        chart
            .draw_series((0..n).flat_map(|i| (0..n).map(move |j| (i, j))).map(|(i, j)| {
                let r = matrix.values[j][i];
                let style = TextStyle::from(("sans-serif", 15).into_font())
                    .pos(Pos::new(HPos::Center, VPos::Center))
                    .color(if r.is_finite() && r.abs() > 0.6 { &WHITE } else { &BLACK });
                Text::new(
                    if r.is_finite() { format!("{r:.2}") } else { "n/a".to_string() },
                    (i as f64 + 0.5, (n - 1 - j) as f64 + 0.5),
                    style,
                )
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(path.clone())
    }

    /// Scatter of wind speed against wind direction.
    pub fn wind_scatter(df: &DataFrame, out_dir: &Path) -> Result<PathBuf, ChartError> {
        processor::require_columns(df, &["WD", "WS"])?;

        let wd = processor::numeric_column(df, "WD")?;
        let ws = processor::numeric_column(df, "WS")?;
        let points: Vec<(f64, f64)> = wd.into_iter().zip(ws).filter_map(|(d, s)| d.zip(s)).collect();
        if points.is_empty() {
            return Err(ChartError::Empty("no complete (WD, WS) observations"));
        }

        let (x0, x1) = padded_range(points.iter().map(|p| p.0));
        let (y0, y1) = padded_range(points.iter().map(|p| p.1));

        let path = out_dir.join("wind_scatter.png");
        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Wind Speed vs Wind Direction", ("sans-serif", 28))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc("Wind Direction (°N)")
            .y_desc("Wind Speed (m/s)")
            .light_line_style(BLACK.mix(0.15))
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, WIND_COLOR.mix(0.5).filled())),
            )
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(path.clone())
    }

    /// Scatter of GHI against ambient temperature, one colored point series
    /// per `Cleaning` category.
    pub fn temperature_scatter(df: &DataFrame, out_dir: &Path) -> Result<PathBuf, ChartError> {
        processor::require_columns(df, &["Tamb", "GHI", "Cleaning"])?;

        let tamb = processor::numeric_column(df, "Tamb")?;
        let ghi = processor::numeric_column(df, "GHI")?;
        let cleaning = processor::categorical_column(df, "Cleaning")?;

        let mut groups: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
        for ((t, g), c) in tamb.into_iter().zip(ghi).zip(cleaning) {
            if let (Some(t), Some(g), Some(c)) = (t, g, c) {
                groups.entry(c).or_default().push((t, g));
            }
        }
        if groups.is_empty() {
            return Err(ChartError::Empty("no complete (Tamb, GHI, Cleaning) observations"));
        }

        let (x0, x1) = padded_range(groups.values().flatten().map(|p| p.0));
        let (y0, y1) = padded_range(groups.values().flatten().map(|p| p.1));

        let path = out_dir.join("temperature_vs_ghi.png");
        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Temperature vs Global Horizontal Irradiance (GHI)",
                ("sans-serif", 24),
            )
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc("Ambient Temperature (°C)")
            .y_desc("Global Horizontal Irradiance (W/m²)")
            .light_line_style(BLACK.mix(0.15))
            .draw()
            .map_err(render_err)?;

        let count = groups.len();
        for (idx, (category, points)) in groups.iter().enumerate() {
            let color = category_color(idx, count);
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 3, color.mix(0.7).filled())),
                )
                .map_err(render_err)?
                .label(format!("Cleaning = {category}"))
                .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(path.clone())
    }
}

/// Value range extended by a small margin so points do not sit on the frame.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let pad = if (max - min).abs() > 1e-9 {
        (max - min) * 0.05
    } else {
        1.0
    };
    (min - pad, max + pad)
}

/// Tick label for the heatmap axes: integer ticks name the cell starting
/// there, everything else stays blank. The y axis runs top-down.
fn cell_label(labels: &[String], v: f64, flip: bool) -> String {
    if v < 0.0 || (v - v.round()).abs() > 1e-6 {
        return String::new();
    }
    let idx = v.round() as usize;
    if idx >= labels.len() {
        return String::new();
    }
    let idx = if flip { labels.len() - 1 - idx } else { idx };
    labels[idx].clone()
}

/// Map a correlation in [-1, 1] onto the diverging scale, cool to warm.
fn heat_color(r: f64) -> RGBColor {
    if !r.is_finite() {
        return MISSING_CELL;
    }
    let t = ((r + 1.0) / 2.0).clamp(0.0, 1.0);
    let c = colorous::RED_BLUE.eval_continuous(1.0 - t);
    RGBColor(c.r, c.g, c.b)
}

/// Colors for the scatter categories, sampled cool-to-warm from the
/// diverging scale.
fn category_color(idx: usize, count: usize) -> RGBColor {
    let t = if count > 1 {
        idx as f64 / (count - 1) as f64
    } else {
        0.5
    };
    let c = colorous::RED_BLUE.eval_continuous(1.0 - t);
    RGBColor(c.r, c.g, c.b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn out_dir() -> PathBuf {
        // Never created: every test here must fail before the backend runs.
        std::env::temp_dir().join("solarscan_charts_never_written")
    }

    fn irradiance_fixture() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "Timestamp".into(),
                vec!["2021-08-09 00:01", "2021-08-09 00:02", "2021-08-09 00:03"],
            ),
            Column::new("GHI".into(), vec![0.0, 150.0, 300.0]),
            Column::new("DNI".into(), vec![0.0, 120.0, 240.0]),
            Column::new("DHI".into(), vec![0.0, 30.0, 60.0]),
            Column::new("Tamb".into(), vec![21.0, 22.0, 23.0]),
            Column::new("TModA".into(), vec![22.0, 24.0, 26.0]),
            Column::new("TModB".into(), vec![21.5, 23.5, 25.5]),
            Column::new("Cleaning".into(), vec![0i64, 0, 1]),
        ])
        .unwrap()
    }

    #[test]
    fn wind_stage_fails_before_rendering_when_wd_is_absent() {
        let df = irradiance_fixture();
        let dir = out_dir();

        let err = ChartPlotter::wind_scatter(&df, &dir).unwrap_err();
        assert!(matches!(
            err,
            ChartError::Stage(StageError::MissingColumn(name)) if name == "WD"
        ));
        assert!(!dir.join("wind_scatter.png").exists());

        // Stage isolation: the other stages still work on the same dataset.
        assert!(StatsCalculator::correlation_matrix(&df, CORRELATION_COLUMNS).is_ok());
        assert!(!StatsCalculator::summarize_columns(&df).is_empty());
    }

    #[test]
    fn time_series_skips_on_unparseable_timestamps() {
        let df = DataFrame::new(vec![
            Column::new(
                "Timestamp".into(),
                vec!["2021-08-09 00:01", "not a date", "2021-08-09 00:03"],
            ),
            Column::new("GHI".into(), vec![0.0, 150.0, 300.0]),
        ])
        .unwrap();
        let dir = out_dir();

        let err = ChartPlotter::time_series(&df, &dir).unwrap_err();
        assert!(matches!(
            err,
            ChartError::Stage(StageError::UnparseableTimestamps(1))
        ));
        assert!(!dir.join("time_series_ghi.png").exists());
    }

    #[test]
    fn time_series_requires_its_columns() {
        let df = DataFrame::new(vec![Column::new("GHI".into(), vec![1.0, 2.0])]).unwrap();

        let err = ChartPlotter::time_series(&df, &out_dir()).unwrap_err();
        assert!(matches!(
            err,
            ChartError::Stage(StageError::MissingColumn(name)) if name == "Timestamp"
        ));
    }

    #[test]
    fn temperature_stage_requires_the_cleaning_column() {
        let df = DataFrame::new(vec![
            Column::new("Tamb".into(), vec![21.0, 22.0]),
            Column::new("GHI".into(), vec![100.0, 200.0]),
        ])
        .unwrap();

        let err = ChartPlotter::temperature_scatter(&df, &out_dir()).unwrap_err();
        assert!(matches!(
            err,
            ChartError::Stage(StageError::MissingColumn(name)) if name == "Cleaning"
        ));
    }

    #[test]
    fn wind_stage_reports_empty_when_no_row_is_complete() {
        let df = DataFrame::new(vec![
            Column::new("WD".into(), vec![Some(120.0), Some(200.0)]),
            Column::new("WS".into(), vec![None::<f64>, None]),
        ])
        .unwrap();

        let err = ChartPlotter::wind_scatter(&df, &out_dir()).unwrap_err();
        assert!(matches!(err, ChartError::Empty(_)));
    }

    #[test]
    fn heat_colors_diverge_around_zero() {
        let hot = heat_color(1.0);
        let cold = heat_color(-1.0);
        assert!(hot.0 > hot.2, "positive correlation should render warm");
        assert!(cold.2 > cold.0, "negative correlation should render cool");
        assert_eq!(heat_color(f64::NAN), MISSING_CELL);
    }

    #[test]
    fn category_colors_span_the_scale() {
        let first = category_color(0, 2);
        let last = category_color(1, 2);
        assert!(first.2 > first.0, "first category should render cool");
        assert!(last.0 > last.2, "last category should render warm");
        // A lone category sits at the midpoint rather than an extreme.
        let only = category_color(0, 1);
        assert_ne!(only, first);
        assert_ne!(only, last);
    }

    #[test]
    fn heatmap_tick_labels_align_to_cells() {
        let labels: Vec<String> = ["GHI", "DNI", "DHI"].iter().map(|s| s.to_string()).collect();

        assert_eq!(cell_label(&labels, 0.0, false), "GHI");
        assert_eq!(cell_label(&labels, 2.0, false), "DHI");
        // The y axis runs top-down.
        assert_eq!(cell_label(&labels, 0.0, true), "DHI");
        assert_eq!(cell_label(&labels, 2.0, true), "GHI");
        // Off-grid and out-of-range ticks stay blank.
        assert_eq!(cell_label(&labels, 0.5, false), "");
        assert_eq!(cell_label(&labels, 3.0, false), "");
    }
}
