//! Statistics Calculator Module
//! Descriptive per-column summaries, missing-value counts and Pearson correlation.

use polars::prelude::*;
use statrs::statistics::Statistics;

use crate::data::processor::{self, StageError};

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Pairwise Pearson correlation over a fixed column subset.
///
/// `values[i][j]` is the correlation between `labels[i]` and `labels[j]`.
/// Pairs with fewer than two complete observations, or with a zero-variance
/// side, hold `NaN`.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Handles the statistical computations of the pipeline.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Summaries for every column interpretable as numeric, in dataset order.
    pub fn summarize_columns(df: &DataFrame) -> Vec<ColumnSummary> {
        df.get_columns()
            .iter()
            .filter(|col| Self::is_numeric(col.dtype()))
            .filter_map(|col| {
                let values = Self::sample_values(col).ok()?;
                Some(Self::summarize(col.name().as_str(), &values))
            })
            .collect()
    }

    /// Missing (null) value count for every column, in dataset order.
    pub fn missing_counts(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .map(|col| (col.name().to_string(), col.null_count()))
            .collect()
    }

    /// Pairwise Pearson correlation over `columns`. Rows with a missing value
    /// in either column of a pair are excluded for that pair only.
    pub fn correlation_matrix(
        df: &DataFrame,
        columns: &[&str],
    ) -> Result<CorrelationMatrix, StageError> {
        processor::require_columns(df, columns)?;

        let series: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|name| processor::numeric_column(df, name))
            .collect::<Result<_, _>>()?;

        let n = columns.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = Self::pearson(&series[i], &series[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            labels: columns.iter().map(|c| c.to_string()).collect(),
            values,
        })
    }

    /// Print the summary-statistics and missing-values tables to stdout.
    pub fn print_report(df: &DataFrame) {
        println!("Summary Statistics:");
        println!(
            "{:<12} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        );
        for s in Self::summarize_columns(df) {
            println!(
                "{:<12} {:>8} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3}",
                s.name, s.count, s.mean, s.std, s.min, s.q1, s.median, s.q3, s.max
            );
        }

        println!("\nMissing Values:");
        for (name, missing) in Self::missing_counts(df) {
            println!("{name:<12} {missing:>8}");
        }
    }

    fn is_numeric(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Float32
                | DataType::Float64
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }

    /// Non-missing, finite values of a numeric column.
    fn sample_values(col: &Column) -> Result<Vec<f64>, StageError> {
        let casted = col.cast(&DataType::Float64)?;
        let ca = casted.f64()?;
        Ok(ca.into_iter().flatten().filter(|v| v.is_finite()).collect())
    }

    /// Compute descriptive statistics for a sample of values.
    fn summarize(name: &str, values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary {
                name: name.to_string(),
                count: 0,
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                q1: f64::NAN,
                median: f64::NAN,
                q3: f64::NAN,
                max: f64::NAN,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        ColumnSummary {
            name: name.to_string(),
            count: n,
            mean: values.iter().mean(),
            std: if n > 1 { values.iter().std_dev() } else { f64::NAN },
            min: sorted[0],
            q1: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q3: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Pearson correlation over pairwise-complete observations.
    fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
        let pairs: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys.iter())
            .filter_map(|(x, y)| (*x).zip(*y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();

        let n = pairs.len() as f64;
        if n < 2.0 {
            return f64::NAN;
        }

        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in &pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x == 0.0 || var_y == 0.0 {
            return f64::NAN;
        }
        cov / (var_x * var_y).sqrt()
    }
}
