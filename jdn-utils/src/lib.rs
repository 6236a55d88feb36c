//! Shared utility functions for JDN crates.
//!
//! The dashboard is presented in French, so numbers use a decimal comma
//! and narrow no-break spaces between thousands.

/// Narrow no-break space, the French thousands separator.
pub const THOUSANDS_SEPARATOR: char = '\u{202f}';

/// Number formatting helpers
pub mod format {
    use super::THOUSANDS_SEPARATOR;

    /// Grams per kilogram.
    pub const GRAMS_PER_KG: f64 = 1000.0;

    /// Format a number with `decimals` decimals, French style: `12 345,6`.
    pub fn format_number(value: f64, decimals: usize) -> String {
        if !value.is_finite() {
            return "n/a".to_string();
        }
        let formatted = format!("{:.*}", decimals, value.abs());
        let (integer, fraction) = match formatted.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (formatted.as_str(), None),
        };

        let mut grouped = String::with_capacity(formatted.len() + integer.len() / 3);
        for (i, digit) in integer.chars().enumerate() {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                grouped.push(THOUSANDS_SEPARATOR);
            }
            grouped.push(digit);
        }
        if let Some(fraction) = fraction {
            grouped.push(',');
            grouped.push_str(fraction);
        }

        // "-0,0" reads oddly; only keep the sign when something non-zero shows
        let shows_non_zero = grouped.chars().any(|c| c.is_ascii_digit() && c != '0');
        if value < 0.0 && shows_non_zero {
            format!("-{grouped}")
        } else {
            grouped
        }
    }

    /// Format a percentage (0 to 100) with one decimal: `12,5 %`.
    pub fn format_percentage(value: f64) -> String {
        format!("{}{}%", format_number(value, 1), THOUSANDS_SEPARATOR)
    }

    /// Convert grams to kilograms.
    pub fn grams_to_kg(grams: f64) -> f64 {
        grams / GRAMS_PER_KG
    }

    /// Format grams as kilograms with one decimal: `1 234,5 kg`.
    pub fn format_kg(grams: f64) -> String {
        format!("{} kg", format_number(grams_to_kg(grams), 1))
    }

}

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};

    const MONTHS_FR: [&str; 12] = [
        "janvier",
        "février",
        "mars",
        "avril",
        "mai",
        "juin",
        "juillet",
        "août",
        "septembre",
        "octobre",
        "novembre",
        "décembre",
    ];

    /// Format a date the French long way: "18 octobre 2026", "1er mai 2024".
    pub fn format_long_date(date: &NaiveDate) -> String {
        let month = MONTHS_FR[date.month0() as usize];
        match date.day() {
            1 => format!("1er {} {}", month, date.year()),
            day => format!("{} {} {}", day, month, date.year()),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_long_date() {
            let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
            assert_eq!(format_long_date(&date), "18 octobre 2026");
            let first = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
            assert_eq!(format_long_date(&first), "1er mai 2024");
        }
    }
}
