use crate::config::ReportConfig;
use crate::error::Notice;
use crate::schema::{Indicator, Observation, Selection, Source};
use crate::table::MergedTable;
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;

/// The concrete filter combination picked for a selection, with the option
/// lists it was picked from and the matching rows in date order.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution<'a> {
    pub source: Source,
    pub indicator: Indicator,
    pub region: String,
    pub category: String,
    pub available_sources: Vec<Source>,
    pub available_indicators: Vec<Indicator>,
    pub available_regions: Vec<String>,
    pub available_categories: Vec<String>,
    #[serde(skip)]
    pub rows: Vec<&'a Observation>,
}

pub struct FilterResolver<'a> {
    table: &'a MergedTable,
    config: &'a ReportConfig,
}

impl<'a> FilterResolver<'a> {
    pub fn new(table: &'a MergedTable, config: &'a ReportConfig) -> Self {
        Self { table, config }
    }

    pub fn available_sources(&self) -> Vec<Source> {
        self.table.sources()
    }

    pub fn indicators_for(&self, source: &Source) -> &'a [Indicator] {
        self.config.indicators_for(source)
    }

    pub fn regions_for(&self, source: &Source) -> Vec<String> {
        distinct(
            self.table
                .observations()
                .iter()
                .filter(|o| o.source == *source)
                .map(|o| o.region.as_str()),
        )
    }

    pub fn categories_for(&self, source: &Source, region: &str) -> Vec<String> {
        distinct(
            self.table
                .observations()
                .iter()
                .filter(|o| o.source == *source && o.region == region)
                .map(|o| o.category.as_str()),
        )
    }

    /// National aggregate first, then the fallback region, then the first
    /// region alphabetically.
    pub fn default_region(&self, regions: &[String]) -> Option<String> {
        [&self.config.national_region, &self.config.fallback_region]
            .into_iter()
            .find(|preferred| regions.contains(preferred))
            .or_else(|| regions.first())
            .cloned()
    }

    pub fn default_category(&self, categories: &[String]) -> Option<String> {
        if categories.contains(&self.config.default_category) {
            return Some(self.config.default_category.clone());
        }
        categories.first().cloned()
    }

    /// Dated rows for an exact (source, region, category) whose `indicator`
    /// value is present, sorted by date.
    pub fn rows_matching(
        &self,
        source: &Source,
        region: &str,
        category: &str,
        indicator: Indicator,
    ) -> Vec<&'a Observation> {
        let mut rows: Vec<&'a Observation> = self
            .table
            .observations()
            .iter()
            .filter(|o| {
                o.source == *source
                    && o.region == region
                    && o.category == category
                    && o.date.is_some()
                    && o.value(indicator).is_some()
            })
            .collect();
        rows.sort_by_key(|o| o.date);
        rows
    }

    pub fn resolve(&self, selection: &Selection) -> Result<Resolution<'a>, Notice> {
        let available_sources = self.available_sources();
        let source = match &selection.source {
            Some(source) => source.clone(),
            None => available_sources.first().cloned().ok_or(Notice::NoData)?,
        };

        let available_indicators = self.indicators_for(&source).to_vec();
        if available_indicators.is_empty() {
            return Err(Notice::NoIndicatorsConfigured { origin: source });
        }
        let indicator = match selection.indicator {
            Some(chosen) if available_indicators.contains(&chosen) => chosen,
            chosen => {
                if let Some(chosen) = chosen {
                    debug!(
                        "Indicator {} is not configured for source '{}', using {}",
                        chosen, source, available_indicators[0]
                    );
                }
                available_indicators[0]
            }
        };

        let available_regions = self.regions_for(&source);
        let region = match &selection.region {
            Some(region) => region.clone(),
            None => self.default_region(&available_regions).ok_or(Notice::NoData)?,
        };

        let available_categories = self.categories_for(&source, &region);
        let category = match &selection.category {
            Some(category) => category.clone(),
            None => self
                .default_category(&available_categories)
                .ok_or(Notice::NoData)?,
        };

        let column = selection.chart.value_column(indicator);
        let rows = self.rows_matching(&source, &region, &category, column);
        debug!(
            "Resolved {} / {} / {} / {} to {} rows",
            source,
            region,
            category,
            column,
            rows.len()
        );

        Ok(Resolution {
            source,
            indicator,
            region,
            category,
            available_sources,
            available_indicators,
            available_regions,
            available_categories,
            rows,
        })
    }
}

fn distinct<'s>(values: impl Iterator<Item = &'s str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ChartKind;
    use chrono::NaiveDate;

    fn row(
        date: Option<(i32, u32)>,
        region: &str,
        category: &str,
        source: Source,
        index: Option<f64>,
        monthly: Option<f64>,
    ) -> Observation {
        Observation {
            date: date.and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1)),
            region: region.to_string(),
            category: category.to_string(),
            source,
            index,
            average_price: None,
            monthly_change: monthly,
            yoy_change: None,
        }
    }

    fn table() -> MergedTable {
        MergedTable::from_merged(vec![
            row(Some((2023, 2)), "Región GBA", "Nivel general", Source::Variations, Some(110.0), Some(10.0)),
            row(Some((2023, 1)), "Región GBA", "Nivel general", Source::Variations, Some(100.0), None),
            row(Some((2023, 1)), "Región Cuyo", "Alimentos", Source::Variations, Some(90.0), None),
            row(None, "Región GBA", "Nivel general", Source::Variations, Some(1.0), Some(1.0)),
            row(Some((2023, 1)), "Región Cuyo", "Alimentos", Source::Openings, Some(90.0), None),
            row(Some((2023, 1)), "Región Cuyo", "Bebidas", Source::Openings, Some(95.0), None),
            row(Some((2023, 1)), "Región Sur", "Nivel general", Source::Other("canastas".into()), Some(1.0), None),
        ])
    }

    #[test]
    fn test_indicator_table_drives_indicators() {
        let table = table();
        let config = ReportConfig::default();
        let resolver = FilterResolver::new(&table, &config);

        let selection = Selection {
            source: Some(Source::Other("canastas".into())),
            ..Selection::default()
        };
        let err = resolver.resolve(&selection).unwrap_err();
        assert_eq!(
            err,
            Notice::NoIndicatorsConfigured {
                origin: Source::Other("canastas".into())
            }
        );
        assert!(!err.is_empty_state());
    }

    #[test]
    fn test_default_source_is_first_alphabetically() {
        let table = table();
        let config = ReportConfig::default();
        let resolver = FilterResolver::new(&table, &config);

        let resolution = resolver.resolve(&Selection::default()).unwrap();
        assert_eq!(resolution.source, Source::Openings);
        assert_eq!(resolution.indicator, Indicator::Index);
        assert_eq!(resolution.region, "Región Cuyo");
        assert_eq!(resolution.available_categories, vec!["Alimentos", "Bebidas"]);
        assert_eq!(resolution.category, "Alimentos");
    }

    #[test]
    fn test_region_and_category_defaults() {
        let table = table();
        let config = ReportConfig::default();
        let resolver = FilterResolver::new(&table, &config);

        let selection = Selection {
            source: Some(Source::Variations),
            ..Selection::default()
        };
        let resolution = resolver.resolve(&selection).unwrap();
        assert_eq!(resolution.available_regions, vec!["Región Cuyo", "Región GBA"]);
        assert_eq!(resolution.region, "Región GBA");
        assert_eq!(resolution.category, "Nivel general");
        assert_eq!(resolution.indicator, Indicator::MonthlyChange);
    }

    #[test]
    fn test_national_region_preferred_over_fallback() {
        let config = ReportConfig::default();
        let table = table();
        let resolver = FilterResolver::new(&table, &config);
        let regions = vec![
            "Región GBA".to_string(),
            "Región Nacional".to_string(),
            "Región Cuyo".to_string(),
        ];
        assert_eq!(
            resolver.default_region(&regions).as_deref(),
            Some("Región Nacional")
        );
        assert_eq!(
            resolver.default_region(&regions[2..]).as_deref(),
            Some("Región Cuyo")
        );
        assert_eq!(resolver.default_region(&[]), None);
    }

    #[test]
    fn test_rows_drop_null_indicator_and_undated() {
        let table = table();
        let config = ReportConfig::default();
        let resolver = FilterResolver::new(&table, &config);

        let selection = Selection {
            source: Some(Source::Variations),
            indicator: Some(Indicator::MonthlyChange),
            ..Selection::default()
        };
        let resolution = resolver.resolve(&selection).unwrap();
        assert_eq!(resolution.rows.len(), 1);
        assert_eq!(resolution.rows[0].monthly_change, Some(10.0));

        let selection = Selection {
            indicator: Some(Indicator::Index),
            ..selection
        };
        let resolution = resolver.resolve(&selection).unwrap();
        let dates: Vec<_> = resolution.rows.iter().map(|r| r.date.unwrap()).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()
            ]
        );
    }

    #[test]
    fn test_cumulative_reads_index_and_illegal_indicator_falls_back() {
        let table = table();
        let config = ReportConfig::default();
        let resolver = FilterResolver::new(&table, &config);

        let selection = Selection {
            source: Some(Source::Variations),
            indicator: Some(Indicator::AveragePrice),
            chart: ChartKind::Cumulative,
            ..Selection::default()
        };
        let resolution = resolver.resolve(&selection).unwrap();
        assert_eq!(resolution.indicator, Indicator::MonthlyChange);
        assert_eq!(resolution.rows.len(), 2);
    }

    #[test]
    fn test_unknown_region_resolves_to_no_rows() {
        let table = table();
        let config = ReportConfig::default();
        let resolver = FilterResolver::new(&table, &config);

        let selection = Selection {
            source: Some(Source::Variations),
            region: Some("Región Atlántida".to_string()),
            ..Selection::default()
        };
        assert_eq!(resolver.resolve(&selection).unwrap_err(), Notice::NoData);
    }
}
