//! Data processing for garden harvest statistics.
//!
//! This crate turns the rows of a harvest sheet into the totals and
//! derived figures the dashboard charts and exports. Everything here is a
//! pure function of its inputs: no I/O, no errors for malformed data.

pub mod aggregation;
pub mod statistics;

pub use aggregation::{aggregate, VarietyTotals, YearRange, YearTotals};
pub use statistics::{DerivedStats, Trend, TrendDirection, VarietyValue, YearValue};
