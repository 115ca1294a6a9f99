//! # CPI Report Builder
//!
//! A library for exploring a Consumer Price Index master table broken down by
//! region, category and data source.
//!
//! ## Core Concepts
//!
//! - **Master table**: monthly observations read from a delimited file, with
//!   dates truncated to month granularity
//! - **National aggregate**: a synthetic region computed as the weighted sum of
//!   the real regions, with its own monthly and year-over-year changes
//! - **Selection**: the user's source / region / category / indicator / chart
//!   / date choices; anything left unset takes a sensible default
//! - **Screens**: each selection renders to chart-ready rows and annotations,
//!   an empty state, or a warning. Rendering itself is left to the caller
//!
//! ## Example
//!
//! ```rust,ignore
//! use cpi_report_builder::*;
//! use chrono::NaiveDate;
//!
//! let session = ReportSession::load(ReportConfig::default())?;
//!
//! let selection = Selection {
//!     source: Some(Source::Variations),
//!     chart: ChartKind::Cumulative,
//!     start: NaiveDate::from_ymd_opt(2023, 1, 1),
//!     end: NaiveDate::from_ymd_opt(2023, 12, 1),
//!     amount: Some(100_000.0),
//!     ..Selection::default()
//! };
//!
//! match session.render(&selection) {
//!     ScreenOutcome::Ready(Screen::Cumulative(report)) => {
//!         println!("Accumulated inflation: {:.2}%", report.accumulated_inflation_pct);
//!     }
//!     other => println!("{}", other.message().unwrap_or_default()),
//! }
//! ```

pub mod aggregation;
pub mod comparison;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod range;
pub mod schema;
pub mod series;
pub mod table;
pub mod utils;
pub mod weights;

pub use aggregation::{aggregate, NationalAggregator};
pub use comparison::{HeatmapReport, RegionSeries, RegionalComparisonReport};
pub use config::{CoveragePolicy, ReportConfig};
pub use error::{CpiError, Notice, Result};
pub use filter::{FilterResolver, Resolution};
pub use ingestion::{load_dataset, DatasetLoader};
pub use range::{DateChoices, DateRange, RangeMode};
pub use schema::*;
pub use series::{
    AmountAdjustment, CumulativePoint, CumulativeReport, RealComparison, RealOutcome,
    SeriesPoint, TimeSeriesReport,
};
pub use table::MergedTable;
pub use weights::RegionWeights;

use log::{debug, info};
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;

/// What the presentation layer receives for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum ScreenOutcome<T> {
    Ready(T),
    /// Nothing to plot for this combination.
    Empty(Notice),
    /// The interaction stops here; show the message, plot nothing.
    Warning(Notice),
}

impl<T> ScreenOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ScreenOutcome::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            ScreenOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            ScreenOutcome::Ready(_) => None,
            ScreenOutcome::Empty(notice) | ScreenOutcome::Warning(notice) => Some(notice),
        }
    }

    pub fn message(&self) -> Option<String> {
        self.notice().map(ToString::to_string)
    }
}

impl<T> From<std::result::Result<T, Notice>> for ScreenOutcome<T> {
    fn from(result: std::result::Result<T, Notice>) -> Self {
        match result {
            Ok(value) => ScreenOutcome::Ready(value),
            Err(notice) if notice.is_empty_state() => ScreenOutcome::Empty(notice),
            Err(notice) => ScreenOutcome::Warning(notice),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum Screen {
    TimeSeries(TimeSeriesReport),
    RegionalComparison(RegionalComparisonReport),
    Heatmap(HeatmapReport),
    Cumulative(CumulativeReport),
}

/// Dropdown contents and the values preselected in them.
///
/// When the current picks yield no usable range, the lists are still
/// filled and `notice` says why nothing can be plotted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOptions {
    pub sources: Vec<Source>,
    pub indicators: Vec<Indicator>,
    pub regions: Vec<String>,
    pub categories: Vec<String>,
    pub source: Source,
    pub indicator: Indicator,
    pub region: String,
    pub category: String,
    pub dates: DateChoices,
    pub notice: Option<Notice>,
}

/// A loaded dataset plus its configuration. Clones share the merged table.
#[derive(Debug, Clone)]
pub struct ReportSession {
    config: ReportConfig,
    table: Arc<MergedTable>,
}

impl ReportSession {
    pub fn load(config: ReportConfig) -> Result<Self> {
        config.validate()?;
        let observations = load_dataset(&config)?;
        Self::from_observations(observations, config)
    }

    pub fn from_reader<R: Read>(reader: R, config: ReportConfig) -> Result<Self> {
        config.validate()?;
        let observations = DatasetLoader::from_config(&config)?.load_reader(reader)?;
        Self::from_observations(observations, config)
    }

    pub fn from_observations(observations: Vec<Observation>, config: ReportConfig) -> Result<Self> {
        if observations.is_empty() {
            return Err(CpiError::EmptyDataset);
        }
        let table = MergedTable::build(observations, &config)?;
        info!("Merged table ready with {} rows", table.len());
        Ok(Self {
            config,
            table: Arc::new(table),
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn table(&self) -> &Arc<MergedTable> {
        &self.table
    }

    fn resolver(&self) -> FilterResolver<'_> {
        FilterResolver::new(&self.table, &self.config)
    }

    pub fn options(&self, selection: &Selection) -> ScreenOutcome<SelectionOptions> {
        self.try_options(selection).into()
    }

    pub fn render(&self, selection: &Selection) -> ScreenOutcome<Screen> {
        let outcome: ScreenOutcome<Screen> = self.try_render(selection).into();
        if let Some(notice) = outcome.notice() {
            debug!("Selection {:?} rendered no chart: {}", selection.chart, notice);
        }
        outcome
    }

    fn try_options(&self, selection: &Selection) -> std::result::Result<SelectionOptions, Notice> {
        let resolver = self.resolver();
        let resolution = resolver.resolve(selection)?;
        let mode = RangeMode::for_view(selection.chart, resolution.indicator);

        let dates = match selection.chart {
            ChartKind::TimeSeries | ChartKind::Cumulative => {
                range::available_dates(resolution.rows.iter().copied())
            }
            ChartKind::RegionalComparison => comparison::regional_dates(&resolver, &resolution),
            ChartKind::Heatmap => comparison::heatmap_dates(&resolver, &resolution),
        };

        let dates = range::date_choices(mode, &dates, selection.start);
        let notice = dates.bounds().err().map(|notice| match (notice, selection.chart) {
            (Notice::NoData, ChartKind::Cumulative) => Notice::NoIndexData,
            (notice, _) => notice,
        });
        if let Some(notice) = &notice {
            debug!("Options for {:?} have no usable range: {}", selection.chart, notice);
        }

        Ok(SelectionOptions {
            sources: resolution.available_sources,
            indicators: resolution.available_indicators,
            regions: resolution.available_regions,
            categories: resolution.available_categories,
            source: resolution.source,
            indicator: resolution.indicator,
            region: resolution.region,
            category: resolution.category,
            dates,
            notice,
        })
    }

    fn try_render(&self, selection: &Selection) -> std::result::Result<Screen, Notice> {
        let resolver = self.resolver();
        let resolution = resolver.resolve(selection)?;

        match selection.chart {
            ChartKind::TimeSeries => {
                let mode = RangeMode::for_view(selection.chart, resolution.indicator);
                let dates = range::available_dates(resolution.rows.iter().copied());
                let range = range::resolve_range(mode, &dates, selection.start, selection.end)?;
                series::build_time_series(&resolution, range).map(Screen::TimeSeries)
            }
            ChartKind::Cumulative => {
                if resolution.rows.is_empty() {
                    return Err(Notice::NoIndexData);
                }
                let dates = range::available_dates(resolution.rows.iter().copied());
                let range =
                    range::resolve_range(RangeMode::Generic, &dates, selection.start, selection.end)?;
                series::build_cumulative(
                    &resolution,
                    range,
                    selection.amount,
                    selection.actual_amount,
                )
                .map(Screen::Cumulative)
            }
            ChartKind::RegionalComparison => comparison::regional_comparison(
                &resolver,
                &resolution,
                selection.start,
                selection.end,
            )
            .map(Screen::RegionalComparison),
            ChartKind::Heatmap => {
                comparison::heatmap(&resolver, &resolution, selection.start, selection.end)
                    .map(Screen::Heatmap)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
fecha,region,categoria,origen,indice,precio_promedio,variacion_mensual,variacion_interanual
2023-01-01,Región GBA,Nivel general,variaciones,100,,,94.8
2023-02-01,Región GBA,Nivel general,variaciones,110,,10,98.9
2023-03-01,Región GBA,Nivel general,variaciones,121,,10,104.3
2023-01-01,Región Pampeana,Nivel general,variaciones,100,,,
2023-02-01,Región Pampeana,Nivel general,variaciones,120,,20,
2023-03-01,Región Pampeana,Nivel general,variaciones,130,,8.33,
2023-01-01,Región GBA,Pan,precios,,500,,
2023-02-01,Región GBA,Pan,precios,,550,,
2023-01-01,Región GBA,Nivel general,canastas,1,,,
";

    fn session() -> ReportSession {
        let mut config = ReportConfig::default();
        config.region_weights = [
            ("Región GBA".to_string(), 0.5),
            ("Región Pampeana".to_string(), 0.5),
        ]
        .into_iter()
        .collect();
        ReportSession::from_reader(SAMPLE.as_bytes(), config).unwrap()
    }

    #[test]
    fn test_default_selection_uses_national_general_level() {
        let session = session();
        let options = session
            .options(&Selection {
                source: Some(Source::Variations),
                ..Selection::default()
            })
            .ready()
            .unwrap();

        assert_eq!(options.region, "Región Nacional");
        assert_eq!(options.category, "Nivel general");
        assert_eq!(options.indicator, Indicator::MonthlyChange);
        assert_eq!(
            options.sources,
            vec![
                Source::Other("canastas".to_string()),
                Source::Prices,
                Source::Variations
            ]
        );
        assert_eq!(options.dates.end_options.len(), 2);
        assert_eq!(options.notice, None);
    }

    #[test]
    fn test_options_survive_a_combination_without_data() {
        let session = session();
        let options = session
            .options(&Selection {
                source: Some(Source::Variations),
                region: Some("Región Pampeana".to_string()),
                category: Some("Bebidas".to_string()),
                ..Selection::default()
            })
            .ready()
            .unwrap();

        assert_eq!(options.notice, Some(Notice::NoData));
        assert_eq!(
            options.regions,
            vec!["Región GBA", "Región Nacional", "Región Pampeana"]
        );
        assert_eq!(options.categories, vec!["Nivel general"]);
        assert!(options.dates.start_options.is_empty());
    }

    #[test]
    fn test_options_keep_start_choices_without_later_year() {
        let session = session();
        let selection = Selection {
            source: Some(Source::Variations),
            region: Some("Región GBA".to_string()),
            indicator: Some(Indicator::YoyChange),
            start: NaiveDate::from_ymd_opt(2023, 2, 1),
            ..Selection::default()
        };
        let options = session.options(&selection).ready().unwrap();

        assert_eq!(
            options.notice,
            Some(Notice::NoLaterYearSameMonth {
                month: 2,
                year: 2023
            })
        );
        assert_eq!(options.dates.start_options.len(), 3);
        assert!(options.dates.end_options.is_empty());
        assert_eq!(options.indicators.len(), 3);

        assert_eq!(
            session.render(&selection),
            ScreenOutcome::Warning(Notice::NoLaterYearSameMonth {
                month: 2,
                year: 2023
            })
        );
    }

    #[test]
    fn test_render_national_monthly_series() {
        let session = session();
        let screen = session
            .render(&Selection {
                source: Some(Source::Variations),
                ..Selection::default()
            })
            .ready()
            .unwrap();

        let Screen::TimeSeries(report) = screen else {
            panic!("expected a time series");
        };
        assert_eq!(report.region, "Región Nacional");
        assert_eq!(report.points.len(), 2);
        assert!((report.points[0].value - 15.0).abs() < 1e-9);
        assert_eq!(report.points[0].label.as_deref(), Some("15.00%"));
    }

    #[test]
    fn test_unconfigured_source_is_a_warning() {
        let session = session();
        let outcome = session.render(&Selection::default());
        assert_eq!(
            outcome,
            ScreenOutcome::Warning(Notice::NoIndicatorsConfigured {
                origin: Source::Other("canastas".to_string())
            })
        );
        assert!(outcome.message().unwrap().contains("canastas"));
    }

    #[test]
    fn test_cumulative_without_index_is_empty() {
        let session = session();
        let outcome = session.render(&Selection {
            source: Some(Source::Prices),
            chart: ChartKind::Cumulative,
            ..Selection::default()
        });
        assert_eq!(outcome, ScreenOutcome::Empty(Notice::NoIndexData));

        let options = session
            .options(&Selection {
                source: Some(Source::Prices),
                chart: ChartKind::Cumulative,
                ..Selection::default()
            })
            .ready()
            .unwrap();
        assert_eq!(options.notice, Some(Notice::NoIndexData));
        assert_eq!(options.categories, vec!["Pan"]);
    }

    #[test]
    fn test_sessions_share_the_table() {
        let session = session();
        let clone = session.clone();
        assert!(Arc::ptr_eq(session.table(), clone.table()));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome: ScreenOutcome<()> = ScreenOutcome::Empty(Notice::NoData);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "empty");
        assert_eq!(json["payload"]["kind"], "no_data");
    }
}
