//! Export of a garden's statistics to spreadsheet-friendly files.
//!
//! # Architecture
//!
//! - [`report`]: projects already-computed totals into a four-section
//!   [`ExportReport`] (summary, per variety, per year, raw rows)
//! - [`sink`]: writes a report to disk as sectioned CSV or JSON
//!
//! # Usage
//!
//! ```ignore
//! let report = ExportReport::build(input, Utc::now());
//! let sink = CsvReportSink::new("exports");
//! let file_name = export_file_name("Jardin des Roses", today, sink.extension());
//! let path = sink.write_report(&report, &file_name)?;
//! ```

pub mod report;
pub mod sink;

pub use report::{ExportReport, ReportInput, ReportSummary, VarietyLine, YearLine};
pub use sink::{export_file_name, CsvReportSink, JsonReportSink, ReportSink};
