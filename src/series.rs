use crate::error::Notice;
use crate::filter::Resolution;
use crate::range::DateRange;
use crate::schema::{Indicator, Observation, Source};
use crate::utils::{month_label, percent_change};
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Text drawn next to the point, if any.
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesReport {
    pub title: String,
    pub source: Source,
    pub region: String,
    pub category: String,
    pub indicator: Indicator,
    pub range: DateRange,
    pub points: Vec<SeriesPoint>,
    /// Change between the first and last point; level indicators only.
    pub total_change_pct: Option<f64>,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RealOutcome {
    Gain,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealComparison {
    pub actual_amount: f64,
    pub difference: f64,
    /// `None` when the adjusted amount is zero.
    pub difference_pct: Option<f64>,
    pub outcome: RealOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountAdjustment {
    pub amount: f64,
    pub adjusted_amount: f64,
    pub real: Option<RealComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub index: f64,
    pub cumulative_change_pct: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeReport {
    pub title: String,
    pub source: Source,
    pub region: String,
    pub category: String,
    pub range: DateRange,
    pub index_start: f64,
    pub index_end: f64,
    pub accumulated_inflation_pct: f64,
    pub adjustment: Option<AmountAdjustment>,
    pub points: Vec<CumulativePoint>,
}

/// Rows inside `range` as points of `indicator`, ascending by date.
pub fn extract_series(
    rows: &[&Observation],
    indicator: Indicator,
    range: &DateRange,
) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = rows
        .iter()
        .filter_map(|o| {
            let date = o.date?;
            let value = o.value(indicator)?;
            range.contains(date).then_some(SeriesPoint {
                date,
                value,
                label: None,
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// `(last / first - 1) * 100`, or `None` when there are no points or the
/// first value is zero.
pub fn total_change_pct(points: &[SeriesPoint]) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;
    percent_change(last.value, first.value)
}

pub fn build_time_series(
    resolution: &Resolution<'_>,
    range: DateRange,
) -> Result<TimeSeriesReport, Notice> {
    let indicator = resolution.indicator;
    let mut points = extract_series(&resolution.rows, indicator, &range);
    if points.is_empty() {
        return Err(Notice::EmptySelection);
    }

    let (total_change_pct, annotation) = if indicator.is_percentage() {
        for point in &mut points {
            point.label = Some(format!("{:.2}%", point.value));
        }
        (None, None)
    } else {
        match total_change_pct(&points) {
            Some(pct) => (Some(pct), Some(format!("Total change: {:.2}%", pct))),
            None => {
                debug!(
                    "Total change for {} / {} is not computable from a first value of {}",
                    resolution.region, resolution.category, points[0].value
                );
                (None, Some("Total change: not computable".to_string()))
            }
        }
    };

    Ok(TimeSeriesReport {
        title: format!(
            "Evolution of {} - {} in {} ({})",
            indicator, resolution.category, resolution.region, resolution.source
        ),
        source: resolution.source.clone(),
        region: resolution.region.clone(),
        category: resolution.category.clone(),
        indicator,
        range,
        points,
        total_change_pct,
        annotation,
    })
}

/// Inflation-adjusts `amount` by the index ratio, and compares it against
/// the realized amount when one is given.
pub fn adjust_amount(
    index_start: f64,
    index_end: f64,
    amount: f64,
    actual_amount: Option<f64>,
) -> AmountAdjustment {
    let adjusted_amount = amount * (index_end / index_start);

    let real = actual_amount.map(|actual_amount| {
        let difference = actual_amount - adjusted_amount;
        RealComparison {
            actual_amount,
            difference,
            difference_pct: percent_change(actual_amount, adjusted_amount),
            outcome: if difference > 0.0 {
                RealOutcome::Gain
            } else {
                RealOutcome::Loss
            },
        }
    });

    AmountAdjustment {
        amount,
        adjusted_amount,
        real,
    }
}

fn positive(amount: Option<f64>) -> Option<f64> {
    amount.filter(|a| a.is_finite() && *a > 0.0)
}

/// Accumulated inflation between the exact rows at `range.start` and
/// `range.end` of the index column. No nearest-date fallback.
pub fn build_cumulative(
    resolution: &Resolution<'_>,
    range: DateRange,
    amount: Option<f64>,
    actual_amount: Option<f64>,
) -> Result<CumulativeReport, Notice> {
    let index_at = |date: NaiveDate| {
        resolution
            .rows
            .iter()
            .find(|o| o.date == Some(date))
            .and_then(|o| o.index)
    };

    let (Some(index_start), Some(index_end)) = (index_at(range.start), index_at(range.end)) else {
        return Err(Notice::MissingIndexForDates {
            start: month_label(range.start),
            end: month_label(range.end),
        });
    };

    let accumulated_inflation_pct =
        percent_change(index_end, index_start).ok_or_else(|| Notice::ZeroBaseIndex {
            date: month_label(range.start),
        })?;

    let adjustment = positive(amount)
        .map(|amount| adjust_amount(index_start, index_end, amount, positive(actual_amount)));

    let points = extract_series(&resolution.rows, Indicator::Index, &range)
        .into_iter()
        .filter_map(|p| {
            let cumulative_change_pct = percent_change(p.value, index_start)?;
            Some(CumulativePoint {
                date: p.date,
                index: p.value,
                cumulative_change_pct,
                label: format!("{:.1}%", cumulative_change_pct),
            })
        })
        .collect();

    Ok(CumulativeReport {
        title: format!(
            "Index evolution - {} in {} ({})",
            resolution.category, resolution.region, resolution.source
        ),
        source: resolution.source.clone(),
        region: resolution.region.clone(),
        category: resolution.category.clone(),
        range,
        index_start,
        index_end,
        accumulated_inflation_pct,
        adjustment,
        points,
    })
}
