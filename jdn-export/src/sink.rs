//! Report sinks: where an [`ExportReport`] ends up.
//!
//! A failed write is a [`GardenError::Write`]; the caller may simply
//! export again.

use crate::report::ExportReport;
use chrono::NaiveDate;
use csv::WriterBuilder;
use jdn_core::error::{GardenError, Result};
use jdn_data::statistics::{VarietyValue, YearValue};
use jdn_utils::dates::format_long_date;
use jdn_utils::format::{format_kg, format_number, format_percentage};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker written where a value does not apply.
pub const NOT_APPLICABLE: &str = "n/a";

/// Writes a report under a file name.
pub trait ReportSink: Send + Sync {
    /// File extension, without the dot.
    fn extension(&self) -> &'static str;

    /// Write `report` as `file_name` and return the written path.
    fn write_report(&self, report: &ExportReport, file_name: &str) -> Result<PathBuf>;
}

/// File name of an export: `export_jardin_<Name_With_Underscores>_<YYYY-MM-DD>.<ext>`.
pub fn export_file_name(garden_name: &str, date: NaiveDate, extension: &str) -> String {
    let name = garden_name
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    format!("export_jardin_{}_{}.{}", name, date.format("%Y-%m-%d"), extension)
}

fn prepare_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| GardenError::write(dir.display().to_string(), e))?;
    Ok(dir.join(file_name))
}

fn or_not_applicable(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_APPLICABLE.to_string())
}

/// Sectioned CSV: summary, per variety, per year, raw rows, one after the other.
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    dir: PathBuf,
}

impl CsvReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn records(report: &ExportReport) -> Vec<Vec<String>> {
        let summary = &report.summary;
        let mut records: Vec<Vec<String>> = Vec::new();

        records.push(vec!["Résumé".to_string()]);
        let year_cell = |value: Option<YearValue>| {
            or_not_applicable(value.map(|v| format!("{} ({})", v.year, format_kg(v.value))))
        };
        let variety_cell = |value: Option<&VarietyValue>| {
            or_not_applicable(value.map(|v| format!("{} ({})", v.variety, format_kg(v.value))))
        };
        let summary_lines = [
            ("Jardin", summary.garden_name.clone()),
            ("Date d'export", format_long_date(&summary.exported_at.date_naive())),
            ("Total récolté (g)", format_number(summary.total_grams, 0)),
            ("Total récolté (kg)", format_number(summary.total_kg, 1)),
            ("Nombre de variétés", summary.variety_count.to_string()),
            ("Année la plus productive", year_cell(summary.most_productive_year)),
            ("Année la moins productive", year_cell(summary.least_productive_year)),
            (
                "Variété la plus productive",
                variety_cell(summary.most_productive_variety.as_ref()),
            ),
            (
                "Variété la moins productive",
                variety_cell(summary.least_productive_variety.as_ref()),
            ),
            ("Tendance", summary.trend.to_string()),
            (
                "Croissance totale",
                or_not_applicable(summary.total_growth_percent.map(format_percentage)),
            ),
        ];
        for (label, value) in summary_lines {
            records.push(vec![label.to_string(), value]);
        }

        records.push(vec!["Par variété".to_string()]);
        records.push(
            ["Variété", "Total (g)", "Pourcentage", "Moyenne annuelle (g)"]
                .map(String::from)
                .to_vec(),
        );
        for line in &report.per_variety {
            records.push(vec![
                line.variety.clone(),
                format_number(line.total, 0),
                format_percentage(line.percentage),
                format_number(line.annual_average, 1),
            ]);
        }

        records.push(vec!["Par année".to_string()]);
        records.push(
            ["Année", "Total (g)", "Évolution", "Écart à la moyenne (g)", "Écart à la moyenne"]
                .map(String::from)
                .to_vec(),
        );
        for line in &report.per_year {
            records.push(vec![
                line.year.to_string(),
                format_number(line.total, 0),
                or_not_applicable(line.change_percent.map(format_percentage)),
                format_number(line.deviation_from_average, 1),
                or_not_applicable(line.deviation_percent.map(format_percentage)),
            ]);
        }

        records.push(vec!["Données brutes".to_string()]);
        records.push(report.raw.columns.clone());
        records.extend(report.raw.rows.iter().cloned());
        records
    }
}

impl ReportSink for CsvReportSink {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_report(&self, report: &ExportReport, file_name: &str) -> Result<PathBuf> {
        let path = prepare_path(&self.dir, file_name)?;
        let origin = path.display().to_string();
        let mut wtr = WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| GardenError::write(origin.as_str(), e))?;
        for record in Self::records(report) {
            wtr.write_record(&record)
                .map_err(|e| GardenError::write(origin.as_str(), e))?;
        }
        wtr.flush().map_err(|e| GardenError::write(origin.as_str(), e))?;
        info!("export: wrote {}", origin);
        Ok(path)
    }
}

/// The whole report as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for JsonReportSink {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write_report(&self, report: &ExportReport, file_name: &str) -> Result<PathBuf> {
        let path = prepare_path(&self.dir, file_name)?;
        let origin = path.display().to_string();
        let body = serde_json::to_string_pretty(report)
            .map_err(|e| GardenError::write(origin.as_str(), e))?;
        fs::write(&path, body).map_err(|e| GardenError::write(origin.as_str(), e))?;
        info!("export: wrote {}", origin);
        Ok(path)
    }
}
