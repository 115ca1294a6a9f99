use crate::error::Notice;
use crate::schema::{ChartKind, Indicator, Observation};
use crate::utils::{first_of_month, month_label};
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    /// Any start and end, normalized to a non-decreasing interval.
    Generic,
    /// End locked to the start's calendar month in a strictly later year.
    YearOverYear,
}

impl RangeMode {
    pub fn for_view(chart: ChartKind, indicator: Indicator) -> Self {
        match (chart, indicator) {
            (ChartKind::TimeSeries, Indicator::YoyChange) => RangeMode::YearOverYear,
            _ => RangeMode::Generic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mode: RangeMode,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.mode {
            RangeMode::Generic => self.start <= date && date <= self.end,
            RangeMode::YearOverYear => {
                date.month() == self.start.month()
                    && self.start.year() <= date.year()
                    && date.year() <= self.end.year()
            }
        }
    }

    pub fn label(&self) -> String {
        format!("{} -> {}", month_label(self.start), month_label(self.end))
    }
}

/// Dropdown contents for the start and end pickers.
///
/// Always carries the start options so another start can be picked even
/// when no valid range exists for the current one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateChoices {
    pub mode: RangeMode,
    pub start_options: Vec<NaiveDate>,
    pub end_options: Vec<NaiveDate>,
    pub default_start: Option<NaiveDate>,
    /// The chosen start truncated to its month, or the default start.
    pub selected_start: Option<NaiveDate>,
    pub default_end: Option<NaiveDate>,
}

impl DateChoices {
    /// Selected start and default end, or the notice explaining why the
    /// pickers cannot produce a range.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate), Notice> {
        let Some(start) = self.selected_start else {
            return Err(Notice::NoData);
        };
        let end = self.default_end.ok_or(Notice::NoLaterYearSameMonth {
            month: start.month(),
            year: start.year(),
        })?;
        Ok((start, end))
    }
}

/// Sorted distinct dates of the given rows.
pub fn available_dates<'a>(rows: impl IntoIterator<Item = &'a Observation>) -> Vec<NaiveDate> {
    rows.into_iter()
        .filter_map(|o| o.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Dates sharing `start`'s month in a strictly later year, ascending.
pub fn year_over_year_candidates(dates: &[NaiveDate], start: NaiveDate) -> Vec<NaiveDate> {
    dates
        .iter()
        .copied()
        .filter(|d| d.month() == start.month() && d.year() > start.year())
        .collect()
}

pub fn date_choices(
    mode: RangeMode,
    dates: &[NaiveDate],
    chosen_start: Option<NaiveDate>,
) -> DateChoices {
    let earliest = dates.first().copied();
    let selected_start = earliest.and(chosen_start.map(first_of_month).or(earliest));

    match mode {
        RangeMode::Generic => DateChoices {
            mode,
            start_options: dates.to_vec(),
            end_options: dates.iter().rev().copied().collect(),
            default_start: earliest,
            selected_start,
            default_end: dates.last().copied(),
        },
        RangeMode::YearOverYear => {
            let end_options = selected_start
                .map(|start| year_over_year_candidates(dates, start))
                .unwrap_or_default();
            DateChoices {
                mode,
                start_options: dates.to_vec(),
                default_end: end_options.last().copied(),
                end_options,
                default_start: earliest,
                selected_start,
            }
        }
    }
}

/// Turns the user's picks into a validated range.
///
/// Picks are truncated to their month. Generic mode swaps a reversed pair.
/// Year-over-year mode keeps the start and replaces an end that is not a
/// valid candidate by the latest one.
pub fn resolve_range(
    mode: RangeMode,
    dates: &[NaiveDate],
    chosen_start: Option<NaiveDate>,
    chosen_end: Option<NaiveDate>,
) -> Result<DateRange, Notice> {
    let choices = date_choices(mode, dates, chosen_start);
    let (start, default_end) = choices.bounds()?;
    let chosen_end = chosen_end.map(first_of_month);

    let end = match mode {
        RangeMode::Generic => chosen_end.unwrap_or(default_end),
        RangeMode::YearOverYear => match chosen_end {
            Some(end) if choices.end_options.contains(&end) => end,
            Some(end) => {
                debug!(
                    "End {} is not a same-month later year for start {}, using {}",
                    month_label(end),
                    month_label(start),
                    month_label(default_end)
                );
                default_end
            }
            None => default_end,
        },
    };

    if end < start {
        debug!(
            "Swapping reversed range {} -> {}",
            month_label(start),
            month_label(end)
        );
        return Ok(DateRange {
            start: end,
            end: start,
            mode,
        });
    }

    Ok(DateRange { start, end, mode })
}
