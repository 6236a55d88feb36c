//! Figures derived from variety and year totals: shares, trend, rankings.
//!
//! Division by a zero total never happens here. A zero grand total gives
//! every variety a 0 % share, and a zero first year leaves the growth
//! percentage undefined (`None`).

use crate::aggregation::{VarietyTotals, YearTotals};
use serde::Serialize;
use std::fmt;

/// Last year above this multiple of the first year means growth.
const GROWING_RATIO: f64 = 1.1;

/// Last year below this multiple of the first year means decline.
const DECLINING_RATIO: f64 = 0.9;

/// A year and its total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// A variety and its total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarietyValue {
    pub variety: String,
    pub value: f64,
}

/// Share of the grand total per variety, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Percentages(Vec<VarietyValue>);

impl Percentages {
    pub fn get(&self, variety: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|share| share.variety == variety)
            .map(|share| share.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VarietyValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Percentage of the grand total held by each variety (0 to 100).
///
/// When the grand total is zero every variety is listed at 0 %.
pub fn percentages(variety_totals: &VarietyTotals) -> Percentages {
    let grand_total = variety_totals.total();
    Percentages(
        variety_totals
            .iter()
            .map(|(variety, total)| VarietyValue {
                variety: variety.to_string(),
                value: if grand_total > 0.0 {
                    total / grand_total * 100.0
                } else {
                    0.0
                },
            })
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Growing,
    Declining,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Growing => write!(f, "growing"),
            TrendDirection::Declining => write!(f, "declining"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Harvest trend across the analysed years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Growth from the first to the last year, `None` when the first year is zero
    pub total_growth_percent: Option<f64>,
    /// Mean of the yearly totals
    pub average_annual: f64,
    /// Best year, earliest on ties; `None` only without any year
    pub peak_year: Option<YearValue>,
}

/// Classify the evolution from the earliest to the latest year.
///
/// Growing when `last > first * 1.1`, declining when `last < first * 0.9`,
/// stable otherwise.
pub fn trend(year_totals: &YearTotals) -> Trend {
    let first = year_totals.iter().next().map_or(0.0, |(_, value)| value);
    let last = year_totals.iter().last().map_or(0.0, |(_, value)| value);

    let direction = if last > first * GROWING_RATIO {
        TrendDirection::Growing
    } else if last < first * DECLINING_RATIO {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };
    let total_growth_percent = if first != 0.0 {
        Some((last - first) / first * 100.0)
    } else {
        None
    };

    Trend {
        direction,
        total_growth_percent,
        average_annual: year_totals.average(),
        peak_year: most_productive_year(year_totals),
    }
}

/// Year with the highest total, earliest year on ties.
pub fn most_productive_year(year_totals: &YearTotals) -> Option<YearValue> {
    year_totals.iter().fold(None, |best: Option<YearValue>, (year, value)| match best {
        Some(b) if b.value >= value => Some(b),
        _ => Some(YearValue { year, value }),
    })
}

/// Year with the lowest total, earliest year on ties.
pub fn least_productive_year(year_totals: &YearTotals) -> Option<YearValue> {
    year_totals.iter().fold(None, |best: Option<YearValue>, (year, value)| match best {
        Some(b) if b.value <= value => Some(b),
        _ => Some(YearValue { year, value }),
    })
}

/// The `n` largest varieties, descending; ties keep first-seen order.
pub fn top_n(variety_totals: &VarietyTotals, n: usize) -> Vec<VarietyValue> {
    let mut ranked: Vec<(&str, f64)> = variety_totals.iter().collect();
    // stable sort: equal totals stay in first-seen order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(n)
        .map(|(variety, value)| VarietyValue {
            variety: variety.to_string(),
            value,
        })
        .collect()
}

/// Variety with the lowest total, first-seen on ties.
pub fn least_productive_variety(variety_totals: &VarietyTotals) -> Option<VarietyValue> {
    variety_totals
        .iter()
        .fold(None, |best: Option<(&str, f64)>, (variety, value)| match best {
            Some(b) if b.1 <= value => Some(b),
            _ => Some((variety, value)),
        })
        .map(|(variety, value)| VarietyValue {
            variety: variety.to_string(),
            value,
        })
}

/// Percent change of `year` against the year before.
///
/// `None` when the previous year is not analysed or its total is zero.
pub fn year_over_year_percent(year_totals: &YearTotals, year: i32) -> Option<f64> {
    let previous = year.checked_sub(1)?;
    if !year_totals.contains(previous) || !year_totals.contains(year) {
        return None;
    }
    let before = year_totals.get(previous);
    if before == 0.0 {
        return None;
    }
    Some((year_totals.get(year) - before) / before * 100.0)
}

/// Everything the charts need beyond the raw totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStats {
    pub percentages: Percentages,
    pub trend: Trend,
}

impl DerivedStats {
    pub fn compute(variety_totals: &VarietyTotals, year_totals: &YearTotals) -> Self {
        Self {
            percentages: percentages(variety_totals),
            trend: trend(year_totals),
        }
    }
}
