//! Multi-series views: one indicator across regions, or across the
//! categories of a single region.

use crate::error::Notice;
use crate::filter::{FilterResolver, Resolution};
use crate::range::{available_dates, resolve_range, DateRange, RangeMode};
use crate::schema::{Indicator, Observation, Source};
use crate::series::{extract_series, SeriesPoint};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSeries {
    pub region: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalComparisonReport {
    pub title: String,
    pub source: Source,
    pub category: String,
    pub indicator: Indicator,
    pub range: DateRange,
    pub series: Vec<RegionSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapReport {
    pub title: String,
    pub source: Source,
    pub region: String,
    pub indicator: Indicator,
    pub range: DateRange,
    pub dates: Vec<NaiveDate>,
    pub categories: Vec<String>,
    /// `cells[row][column]` for `categories[row]` at `dates[column]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

type Grouped<'r, 'a> = Vec<(&'r str, Vec<&'a Observation>)>;

fn rows_per_region<'r, 'a>(
    resolver: &FilterResolver<'a>,
    resolution: &'r Resolution<'_>,
) -> Grouped<'r, 'a> {
    resolution
        .available_regions
        .iter()
        .map(|region| {
            let rows = resolver.rows_matching(
                &resolution.source,
                region,
                &resolution.category,
                resolution.indicator,
            );
            (region.as_str(), rows)
        })
        .filter(|(_, rows)| !rows.is_empty())
        .collect()
}

fn rows_per_category<'r, 'a>(
    resolver: &FilterResolver<'a>,
    resolution: &'r Resolution<'_>,
) -> Grouped<'r, 'a> {
    resolution
        .available_categories
        .iter()
        .map(|category| {
            let rows = resolver.rows_matching(
                &resolution.source,
                &resolution.region,
                category,
                resolution.indicator,
            );
            (category.as_str(), rows)
        })
        .filter(|(_, rows)| !rows.is_empty())
        .collect()
}

fn union_of_dates(groups: &Grouped<'_, '_>) -> Vec<NaiveDate> {
    available_dates(groups.iter().flat_map(|(_, rows)| rows.iter().copied()))
}

/// Dates offered by the regional comparison pickers.
pub fn regional_dates(resolver: &FilterResolver<'_>, resolution: &Resolution<'_>) -> Vec<NaiveDate> {
    union_of_dates(&rows_per_region(resolver, resolution))
}

/// Dates offered by the heatmap pickers.
pub fn heatmap_dates(resolver: &FilterResolver<'_>, resolution: &Resolution<'_>) -> Vec<NaiveDate> {
    union_of_dates(&rows_per_category(resolver, resolution))
}

/// Every region carrying the resolved category, over a generic range built
/// from the union of their dates.
pub fn regional_comparison(
    resolver: &FilterResolver<'_>,
    resolution: &Resolution<'_>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<RegionalComparisonReport, Notice> {
    let per_region = rows_per_region(resolver, resolution);
    let dates = union_of_dates(&per_region);
    let range = resolve_range(RangeMode::Generic, &dates, start, end)?;

    let series: Vec<RegionSeries> = per_region
        .iter()
        .map(|(region, rows)| RegionSeries {
            region: region.to_string(),
            points: extract_series(rows, resolution.indicator, &range),
        })
        .filter(|s| !s.points.is_empty())
        .collect();

    if series.is_empty() {
        return Err(Notice::EmptySelection);
    }

    Ok(RegionalComparisonReport {
        title: format!(
            "Regional comparison of {} - {} ({})",
            resolution.indicator, resolution.category, resolution.source
        ),
        source: resolution.source.clone(),
        category: resolution.category.clone(),
        indicator: resolution.indicator,
        range,
        series,
    })
}

/// Categories by month for the resolved region. A cell holds the first
/// value found for its (category, date).
pub fn heatmap(
    resolver: &FilterResolver<'_>,
    resolution: &Resolution<'_>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<HeatmapReport, Notice> {
    let per_category = rows_per_category(resolver, resolution);
    let all_dates = union_of_dates(&per_category);
    let range = resolve_range(RangeMode::Generic, &all_dates, start, end)?;
    let dates: Vec<NaiveDate> = all_dates
        .into_iter()
        .filter(|d| range.contains(*d))
        .collect();

    let mut categories = Vec::new();
    let mut cells = Vec::new();
    for (category, rows) in &per_category {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for point in extract_series(rows, resolution.indicator, &range) {
            by_date.entry(point.date).or_insert(point.value);
        }
        if by_date.is_empty() {
            continue;
        }

        categories.push(category.to_string());
        cells.push(dates.iter().map(|d| by_date.get(d).copied()).collect());
    }

    if categories.is_empty() {
        return Err(Notice::EmptySelection);
    }

    Ok(HeatmapReport {
        title: format!(
            "{} by category - {} ({})",
            resolution.indicator, resolution.region, resolution.source
        ),
        source: resolution.source.clone(),
        region: resolution.region.clone(),
        indicator: resolution.indicator,
        range,
        dates,
        categories,
        cells,
    })
}
