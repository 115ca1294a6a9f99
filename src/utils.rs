use chrono::{Datelike, NaiveDate};

/// Truncates a raw `fecha` value to month granularity.
///
/// Only the first seven characters are considered, so `2023-04`,
/// `2023-04-15` and `2023-04-15 00:00:00` all map to 2023-04-01.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..7)?;
    let (year, month) = head.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `(current / base - 1) * 100`, or `None` when the base is zero or either
/// side is not a finite number.
pub fn percent_change(current: f64, base: f64) -> Option<f64> {
    if base == 0.0 || !base.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current / base - 1.0) * 100.0)
}

/// Positional percent change against the value `lag` rows earlier.
///
/// The lag counts rows, not calendar months: a missing month silently
/// widens the effective period.
pub fn lagged_percent_changes(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, current)| {
            if lag == 0 || i < lag {
                return None;
            }
            match (current, values[i - lag]) {
                (Some(current), Some(base)) => percent_change(*current, base),
                _ => None,
            }
        })
        .collect()
}
