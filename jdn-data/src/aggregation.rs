//! Variety and year totals over a fixed range of harvest years.

use jdn_core::error::{GardenError, Result};
use jdn_core::harvest::HarvestRow;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

/// First harvest year analysed by default.
pub const DEFAULT_YEAR_MIN: i32 = 2020;

/// Last harvest year analysed by default.
pub const DEFAULT_YEAR_MAX: i32 = 2026;

/// Widest accepted year range, in years.
pub const MAX_YEAR_SPAN: usize = 200;

/// Closed range of years over which harvests are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct YearRange {
    min: i32,
    max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Result<Self> {
        if min > max {
            return Err(GardenError::InvalidConfig(format!(
                "year range {min}..={max} is empty"
            )));
        }
        let span = i64::from(max) - i64::from(min) + 1;
        if span > MAX_YEAR_SPAN as i64 {
            return Err(GardenError::InvalidConfig(format!(
                "year range {min}..={max} spans {span} years, at most {MAX_YEAR_SPAN} allowed"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }

    /// Number of years in the range, never zero.
    pub fn len(&self) -> usize {
        (i64::from(self.max) - i64::from(self.min)) as usize + 1
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years().contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_YEAR_MIN,
            max: DEFAULT_YEAR_MAX,
        }
    }
}

/// Cumulative quantity per variety, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarietyTotals {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl VarietyTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` to `variety`, creating it at the end if unseen.
    pub fn add(&mut self, variety: &str, quantity: f64) {
        match self.index.get(variety) {
            Some(&i) => self.entries[i].1 += quantity,
            None => {
                self.index.insert(variety.to_string(), self.entries.len());
                self.entries.push((variety.to_string(), quantity));
            }
        }
    }

    pub fn get(&self, variety: &str) -> Option<f64> {
        self.index.get(variety).map(|&i| self.entries[i].1)
    }

    /// `(variety, total)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(variety, total)| (variety.as_str(), *total))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Grand total across all varieties.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, total)| total).sum()
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for VarietyTotals {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut totals = VarietyTotals::new();
        for (variety, quantity) in iter {
            totals.add(variety.as_ref(), quantity);
        }
        totals
    }
}

impl Serialize for VarietyTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (variety, total) in &self.entries {
            map.serialize_entry(variety, total)?;
        }
        map.end()
    }
}

/// Cumulative quantity per year, every year of the range present.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct YearTotals(BTreeMap<i32, f64>);

impl YearTotals {
    /// Zero-filled totals for every year of `range`.
    pub fn new(range: YearRange) -> Self {
        YearTotals(range.years().map(|year| (year, 0.0)).collect())
    }

    fn add(&mut self, year: i32, quantity: f64) {
        *self.0.entry(year).or_insert(0.0) += quantity;
    }

    /// Total for `year`, zero for years outside the range.
    pub fn get(&self, year: i32) -> f64 {
        self.0.get(&year).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, year: i32) -> bool {
        self.0.contains_key(&year)
    }

    /// `(year, total)` pairs in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.0.iter().map(|(year, total)| (*year, *total))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Grand total across all years.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Mean of the yearly totals, zero when there are no years.
    pub fn average(&self) -> f64 {
        if self.0.is_empty() {
            0.0
        } else {
            self.total() / self.0.len() as f64
        }
    }
}

impl FromIterator<(i32, f64)> for YearTotals {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        let mut totals = YearTotals::default();
        for (year, quantity) in iter {
            totals.add(year, quantity);
        }
        totals
    }
}

/// Sum harvest rows into variety totals and year totals over `range`.
///
/// Rows without a variety count under [`jdn_core::harvest::OTHER_VARIETY`].
/// Years outside the range are ignored; missing or malformed quantities
/// count as zero. No row is ever rejected.
pub fn aggregate(rows: &[HarvestRow], range: YearRange) -> (VarietyTotals, YearTotals) {
    let mut variety_totals = VarietyTotals::new();
    let mut year_totals = YearTotals::new(range);
    for row in rows {
        let variety = row.variety_or_other();
        // create the variety even when every year is empty
        variety_totals.add(variety, 0.0);
        for year in range.years() {
            let quantity = row.quantity(year);
            variety_totals.add(variety, quantity);
            year_totals.add(year, quantity);
        }
    }
    log::debug!(
        "aggregation: {} rows -> {} varieties over {}-{}",
        rows.len(),
        variety_totals.len(),
        range.min(),
        range.max()
    );
    (variety_totals, year_totals)
}
