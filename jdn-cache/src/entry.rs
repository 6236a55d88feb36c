use jdn_core::garden_key::GardenKey;
use jdn_core::harvest::{HarvestRow, HarvestSheet};
use jdn_data::aggregation::{aggregate, VarietyTotals, YearRange, YearTotals};
use jdn_data::statistics::DerivedStats;

/// A garden's parsed sheet together with its aggregated totals.
///
/// Built once per successful load and never mutated; callers receive it
/// behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: GardenKey,
    pub sheet: HarvestSheet,
    pub variety_totals: VarietyTotals,
    pub year_totals: YearTotals,
}

impl CacheEntry {
    /// Aggregate `sheet` over `range`.
    pub fn from_sheet(key: GardenKey, sheet: HarvestSheet, range: YearRange) -> Self {
        let (variety_totals, year_totals) = aggregate(&sheet.rows, range);
        Self {
            key,
            sheet,
            variety_totals,
            year_totals,
        }
    }

    pub fn rows(&self) -> &[HarvestRow] {
        &self.sheet.rows
    }

    pub fn derived(&self) -> DerivedStats {
        DerivedStats::compute(&self.variety_totals, &self.year_totals)
    }
}
