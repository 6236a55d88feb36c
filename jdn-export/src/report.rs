use chrono::{DateTime, Utc};
use jdn_core::harvest::HarvestSheet;
use jdn_data::aggregation::{VarietyTotals, YearTotals};
use jdn_data::statistics::{
    least_productive_variety, least_productive_year, top_n, year_over_year_percent, DerivedStats,
    TrendDirection, VarietyValue, YearValue,
};
use jdn_utils::format::grams_to_kg;
use serde::Serialize;

/// Everything the report is projected from. Borrowed, never modified.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub garden_name: &'a str,
    pub sheet: &'a HarvestSheet,
    pub variety_totals: &'a VarietyTotals,
    pub year_totals: &'a YearTotals,
    pub derived: &'a DerivedStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub garden_name: String,
    pub exported_at: DateTime<Utc>,
    pub total_grams: f64,
    pub total_kg: f64,
    pub variety_count: usize,
    pub most_productive_year: Option<YearValue>,
    pub least_productive_year: Option<YearValue>,
    pub most_productive_variety: Option<VarietyValue>,
    pub least_productive_variety: Option<VarietyValue>,
    pub trend: TrendDirection,
    pub total_growth_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarietyLine {
    pub variety: String,
    pub total: f64,
    pub percentage: f64,
    /// Total divided by the number of analysed years
    pub annual_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearLine {
    pub year: i32,
    pub total: f64,
    /// `None` for the first year and after a zero year
    pub change_percent: Option<f64>,
    pub deviation_from_average: f64,
    /// `None` when the multi-year average is zero
    pub deviation_percent: Option<f64>,
}

/// The sheet exactly as read: original headers and every record cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A presentation-ready view of one garden's statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub summary: ReportSummary,
    pub per_variety: Vec<VarietyLine>,
    pub per_year: Vec<YearLine>,
    pub raw: RawRows,
}

impl ExportReport {
    /// Build the report. No aggregation happens here; a garden without
    /// rows yields a zero-filled report.
    pub fn build(input: ReportInput<'_>, exported_at: DateTime<Utc>) -> ExportReport {
        let ReportInput {
            garden_name,
            sheet,
            variety_totals,
            year_totals,
            derived,
        } = input;

        let total_grams = variety_totals.total();
        let summary = ReportSummary {
            garden_name: garden_name.to_string(),
            exported_at,
            total_grams,
            total_kg: grams_to_kg(total_grams),
            variety_count: variety_totals.len(),
            most_productive_year: derived.trend.peak_year,
            least_productive_year: least_productive_year(year_totals),
            most_productive_variety: top_n(variety_totals, 1).into_iter().next(),
            least_productive_variety: least_productive_variety(variety_totals),
            trend: derived.trend.direction,
            total_growth_percent: derived.trend.total_growth_percent,
        };

        let year_count = year_totals.len().max(1) as f64;
        let per_variety = variety_totals
            .iter()
            .map(|(variety, total)| VarietyLine {
                variety: variety.to_string(),
                total,
                percentage: derived.percentages.get(variety).unwrap_or(0.0),
                annual_average: total / year_count,
            })
            .collect();

        let average = year_totals.average();
        let per_year = year_totals
            .iter()
            .map(|(year, total)| YearLine {
                year,
                total,
                change_percent: year_over_year_percent(year_totals, year),
                deviation_from_average: total - average,
                deviation_percent: (average != 0.0).then(|| (total - average) / average * 100.0),
            })
            .collect();

        let raw = RawRows {
            columns: sheet.raw_columns.clone(),
            rows: sheet.rows.iter().map(|row| row.raw().to_vec()).collect(),
        };

        log::debug!(
            "report: {} with {} varieties, {} years, {} raw rows",
            garden_name,
            variety_totals.len(),
            year_totals.len(),
            sheet.rows.len()
        );
        ExportReport {
            summary,
            per_variety,
            per_year,
            raw,
        }
    }
}
