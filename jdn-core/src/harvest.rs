use crate::error::{GardenError, Result};
use crate::garden_key::strip_diacritics;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// Canonical name of the column holding the cultivated variety.
pub const VARIETY_COLUMN: &str = "variety";

/// Variety assigned to rows whose variety cell is missing or blank.
pub const OTHER_VARIETY: &str = "Autre";

/// Spellings of the variety column found in harvest spreadsheets,
/// compared after diacritics are stripped and case is folded.
const VARIETY_ALIASES: [&str; 5] = ["varietes", "variete", "variety", "varieties", "variete(s)"];

/// One row of a garden's harvest spreadsheet.
///
/// Cells are kept in column order as `(column, value)` pairs, with column
/// names already normalized (see [`normalize_column`]). The record as read,
/// extra cells included, is kept separately in [`HarvestRow::raw`]. Rows are
/// never rejected: a missing or non-numeric quantity reads as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HarvestRow {
    cells: Vec<(String, String)>,
    #[serde(default)]
    raw: Vec<String>,
}

impl HarvestRow {
    pub fn from_cells<I, K, V>(cells: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let cells: Vec<(String, String)> = cells
            .into_iter()
            .map(|(column, value)| (normalize_column(column.as_ref()), value.into()))
            .collect();
        let raw = cells.iter().map(|(_, value)| value.clone()).collect();
        HarvestRow { cells, raw }
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    /// Cells exactly as read, including any past the last header.
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// Raw cell value for a normalized column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// The variety named on this row, if the cell is present and not blank.
    pub fn variety(&self) -> Option<&str> {
        self.get(VARIETY_COLUMN)
            .map(str::trim)
            .filter(|variety| !variety.is_empty())
    }

    /// The variety, or [`OTHER_VARIETY`] when absent.
    pub fn variety_or_other(&self) -> &str {
        self.variety().unwrap_or(OTHER_VARIETY)
    }

    /// Harvested quantity in grams for `year`, zero when missing or malformed.
    pub fn quantity(&self, year: i32) -> f64 {
        self.get(&year.to_string()).map_or(0.0, parse_quantity)
    }
}

/// Lenient quantity parse: blank, non-numeric, negative and non-finite
/// values all read as zero.
pub fn parse_quantity(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// Map a spreadsheet header to its canonical column name.
///
/// - any known spelling of the variety column becomes [`VARIETY_COLUMN`]
/// - an integral numeric header (`2020`, `2020.0`) becomes the bare year
/// - every other header is kept, trimmed
pub fn normalize_column(header: &str) -> String {
    let trimmed = header.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let folded = strip_diacritics(trimmed).to_lowercase();
    if VARIETY_ALIASES.contains(&folded.as_str()) {
        return VARIETY_COLUMN.to_string();
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        if number.fract() == 0.0 && number >= i32::MIN as f64 && number <= i32::MAX as f64 {
            return (number as i32).to_string();
        }
    }
    trimmed.to_string()
}

/// Field delimiter of a sheet: `;` for semicolon exports, `,` otherwise.
fn sniff_delimiter(csv_data: &str) -> u8 {
    let header = csv_data.lines().next().unwrap_or("");
    if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

/// Whether a normalized column feeds the aggregation.
fn is_aggregated(column: &str) -> bool {
    column == VARIETY_COLUMN || column.parse::<i32>().is_ok()
}

/// A parsed harvest spreadsheet: normalized column names plus rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HarvestSheet {
    pub columns: Vec<String>,
    /// Header row as read, before normalization.
    #[serde(default)]
    pub raw_columns: Vec<String>,
    pub rows: Vec<HarvestRow>,
}

impl HarvestSheet {
    /// Parse a harvest sheet from CSV text.
    ///
    /// Expected format (with headers): `Variétés,2020,2021,...,2026`, plus
    /// any number of extra columns, which are carried but not aggregated.
    ///
    /// # Example CSV
    /// ```text
    /// Variétés,2020,2021,Remarques
    /// Tomate,1200,1500,serre
    /// Courgette,800,,
    /// ```
    ///
    /// Short rows are padded with empty cells. Both `,` and `;` separated
    /// sheets are read. A missing header row, a CSV framing error, or two
    /// headers naming the same variety or year column is a
    /// [`GardenError::Parse`].
    pub fn parse_csv(origin: &str, csv_data: &str) -> Result<HarvestSheet> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(sniff_delimiter(csv_data))
            .from_reader(csv_data.as_bytes());

        let raw_columns: Vec<String> = rdr
            .headers()
            .map_err(|e| GardenError::parse(origin, e))?
            .iter()
            .map(str::to_string)
            .collect();
        let columns: Vec<String> = raw_columns.iter().map(|h| normalize_column(h)).collect();
        if columns.iter().all(|column| column.is_empty()) {
            return Err(GardenError::parse(origin, "missing header row"));
        }
        for (i, column) in columns.iter().enumerate() {
            if is_aggregated(column) && columns[..i].contains(column) {
                return Err(GardenError::parse(
                    origin,
                    format!("duplicate column {:?} (header {:?})", column, raw_columns[i]),
                ));
            }
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| GardenError::parse(origin, e))?;
            let cells = columns
                .iter()
                .enumerate()
                .map(|(i, column)| (column.clone(), record.get(i).unwrap_or("").to_string()))
                .collect();
            let raw = record.iter().map(str::to_string).collect();
            rows.push(HarvestRow { cells, raw });
        }
        log::info!("harvest: parsed {} rows from {}", rows.len(), origin);
        Ok(HarvestSheet {
            columns,
            raw_columns,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Year columns present in the sheet, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .columns
            .iter()
            .filter_map(|column| column.parse::<i32>().ok())
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column() {
        for header in ["Variétés", "variétés", "VARIETES", "Variété", "Variety", " Varieties "] {
            assert_eq!(normalize_column(header), VARIETY_COLUMN, "header {header}");
        }
        assert_eq!(normalize_column("2021.0"), "2021");
        assert_eq!(normalize_column(" 2022 "), "2022");
        assert_eq!(normalize_column("\u{feff}Variétés"), VARIETY_COLUMN);
        assert_eq!(normalize_column("Remarques"), "Remarques");
        assert_eq!(normalize_column("2021.5"), "2021.5");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("1200"), 1200.0);
        assert_eq!(parse_quantity(" 12.5 "), 12.5);
        assert_eq!(parse_quantity(""), 0.0);
        assert_eq!(parse_quantity("n/a"), 0.0);
        assert_eq!(parse_quantity("-40"), 0.0);
        assert_eq!(parse_quantity("NaN"), 0.0);
        assert_eq!(parse_quantity("inf"), 0.0);
    }

    #[test]
    fn test_parse_harvest_csv() {
        let csv_data = "\
Variétés,2020,2021,Remarques
Tomate,1200,1500,serre
Courgette,800
,50,abc,
";
        let sheet = HarvestSheet::parse_csv("stats_test.csv", csv_data).unwrap();
        assert_eq!(sheet.columns, vec!["variety", "2020", "2021", "Remarques"]);
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.years(), vec![2020, 2021]);

        let tomate = &sheet.rows[0];
        assert_eq!(tomate.variety(), Some("Tomate"));
        assert_eq!(tomate.quantity(2021), 1500.0);
        assert_eq!(tomate.get("Remarques"), Some("serre"));

        let courgette = &sheet.rows[1];
        assert_eq!(courgette.quantity(2020), 800.0);
        assert_eq!(courgette.quantity(2021), 0.0);
        assert_eq!(courgette.get("Remarques"), Some(""));

        let unnamed = &sheet.rows[2];
        assert_eq!(unnamed.variety(), None);
        assert_eq!(unnamed.variety_or_other(), OTHER_VARIETY);
        assert_eq!(unnamed.quantity(2021), 0.0);
        assert_eq!(unnamed.quantity(2026), 0.0);
    }

    #[test]
    fn test_parse_empty_input() {
        let result = HarvestSheet::parse_csv("stats_empty.csv", "");
        assert!(matches!(result, Err(GardenError::Parse { .. })));
    }

    #[test]
    fn test_parse_header_only() {
        let sheet = HarvestSheet::parse_csv("stats_new.csv", "Variétés,2020\n").unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_parse_keeps_raw_record() {
        let csv_data = "Variétés,2020.0,Remarques\nTomate,100,serre,note perdue\nRadis\n";
        let sheet = HarvestSheet::parse_csv("stats_test.csv", csv_data).unwrap();
        assert_eq!(sheet.columns, vec!["variety", "2020", "Remarques"]);
        assert_eq!(sheet.raw_columns, vec!["Variétés", "2020.0", "Remarques"]);
        assert_eq!(sheet.rows[0].raw(), ["Tomate", "100", "serre", "note perdue"]);
        assert_eq!(sheet.rows[0].quantity(2020), 100.0);
        assert_eq!(sheet.rows[1].raw(), ["Radis"]);
    }

    #[test]
    fn test_parse_duplicate_year_column() {
        let csv_data = "Variétés,2021.0,2021,Remarques\nTomate,100,200,serre\n";
        let result = HarvestSheet::parse_csv("stats_test.csv", csv_data);
        assert!(matches!(result, Err(GardenError::Parse { .. })));

        let twice_variety = "Variétés,Variety,2021\nTomate,Tomate,100\n";
        assert!(HarvestSheet::parse_csv("stats_test.csv", twice_variety).is_err());
    }

    #[test]
    fn test_parse_repeated_free_column() {
        let csv_data = "Variétés,2021,Remarques,Remarques,,\nTomate,100,a,b,,\n";
        let sheet = HarvestSheet::parse_csv("stats_test.csv", csv_data).unwrap();
        assert_eq!(sheet.rows[0].quantity(2021), 100.0);
        assert_eq!(sheet.rows[0].raw(), ["Tomate", "100", "a", "b", "", ""]);
    }

    #[test]
    fn test_parse_semicolon_sheet() {
        let csv_data = "Variétés;2020;2021\nTomate;1200;1500\nCourgette;800;\n";
        let sheet = HarvestSheet::parse_csv("stats_test.csv", csv_data).unwrap();
        assert_eq!(sheet.columns, vec!["variety", "2020", "2021"]);
        assert_eq!(sheet.rows[0].variety(), Some("Tomate"));
        assert_eq!(sheet.rows[0].quantity(2021), 1500.0);
        assert_eq!(sheet.rows[1].quantity(2020), 800.0);
    }

    #[test]
    fn test_row_from_cells_normalizes_columns() {
        let row = HarvestRow::from_cells([("Variétés", "Radis"), ("2023.0", "75")]);
        assert_eq!(row.variety(), Some("Radis"));
        assert_eq!(row.quantity(2023), 75.0);
    }
}
