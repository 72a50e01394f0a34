//! Statistics module - descriptive summaries and correlation

mod calculator;

pub use calculator::{ColumnSummary, CorrelationMatrix, StatsCalculator};
