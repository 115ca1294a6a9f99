use crate::config::{CoveragePolicy, ReportConfig};
use crate::error::Result;
use crate::schema::{Observation, Source};
use crate::utils::{lagged_percent_changes, month_label};
use crate::weights::RegionWeights;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};

const MONTHLY_LAG: usize = 1;
const YEARLY_LAG: usize = 12;

type GroupKey = (NaiveDate, String, Source);

#[derive(Default)]
struct GroupSum<'a> {
    weighted: f64,
    has_missing_index: bool,
    regions: BTreeSet<&'a str>,
}

/// Builds the synthetic national region as a weighted sum of the real
/// regions, for every (date, category, source) group.
pub struct NationalAggregator {
    weights: RegionWeights,
    national_region: String,
    coverage: CoveragePolicy,
}

impl NationalAggregator {
    pub fn new(config: &ReportConfig) -> Result<Self> {
        Ok(Self {
            weights: config.weights()?,
            national_region: config.national_region.clone(),
            coverage: config.coverage,
        })
    }

    /// Originals first, then national rows. Existing rows already labelled
    /// as national are not deduplicated.
    pub fn aggregate(&self, observations: Vec<Observation>) -> Vec<Observation> {
        let national = self.national_rows(&observations);
        info!(
            "Derived {} '{}' rows from {} observations",
            national.len(),
            self.national_region,
            observations.len()
        );

        let mut merged = observations;
        merged.extend(national);
        merged
    }

    /// National rows sorted by date, with monthly and year-over-year changes
    /// computed positionally within each (category, source) series.
    pub fn national_rows(&self, observations: &[Observation]) -> Vec<Observation> {
        let groups = self.weighted_groups(observations);

        let mut series: BTreeMap<(String, Source), Vec<(NaiveDate, Option<f64>)>> =
            BTreeMap::new();
        for ((date, category, source), index) in groups {
            series
                .entry((category, source))
                .or_default()
                .push((date, index));
        }

        let mut rows = Vec::new();
        for ((category, source), points) in series {
            let indices: Vec<Option<f64>> = points.iter().map(|(_, index)| *index).collect();
            let monthly = lagged_percent_changes(&indices, MONTHLY_LAG);
            let yearly = lagged_percent_changes(&indices, YEARLY_LAG);

            for (i, (date, index)) in points.into_iter().enumerate() {
                rows.push(Observation {
                    date: Some(date),
                    region: self.national_region.clone(),
                    category: category.clone(),
                    source: source.clone(),
                    index,
                    average_price: None,
                    monthly_change: monthly[i],
                    yoy_change: yearly[i],
                });
            }
        }

        // Stable sort keeps the (category, source) order within a month.
        rows.sort_by_key(|row| row.date);
        rows
    }

    fn weighted_groups(&self, observations: &[Observation]) -> BTreeMap<GroupKey, Option<f64>> {
        let mut groups: BTreeMap<GroupKey, GroupSum> = BTreeMap::new();

        for observation in observations {
            let Some(weight) = self.weights.get(&observation.region) else {
                continue;
            };
            let Some(date) = observation.date else {
                continue;
            };
            if observation.category.is_empty() || observation.source.is_blank() {
                continue;
            }

            let group = groups
                .entry((date, observation.category.clone(), observation.source.clone()))
                .or_default();
            match observation.index {
                Some(index) => {
                    group.weighted += index * weight;
                    group.regions.insert(observation.region.as_str());
                }
                None => group.has_missing_index = true,
            }
        }

        let mut result = BTreeMap::new();
        let mut incomplete = 0usize;
        for (key, group) in groups {
            let complete = group.regions.len() == self.weights.len();
            if !complete {
                incomplete += 1;
            }

            if self.coverage == CoveragePolicy::Complete && (!complete || group.has_missing_index) {
                debug!(
                    "Skipping national value for {} / {} / {}: {} of {} regions reported",
                    month_label(key.0),
                    key.1,
                    key.2,
                    group.regions.len(),
                    self.weights.len()
                );
                continue;
            }

            // A null index in any contributing row makes the whole sum null.
            let index = (!group.has_missing_index).then_some(group.weighted);
            result.insert(key, index);
        }

        if incomplete > 0 {
            warn!(
                "{} national groups lack at least one weighted region (coverage policy: {:?})",
                incomplete, self.coverage
            );
        }

        result
    }
}

/// Appends national rows to the given observations using `config`.
pub fn aggregate(observations: Vec<Observation>, config: &ReportConfig) -> Result<Vec<Observation>> {
    let aggregator = NationalAggregator::new(config)?;
    Ok(aggregator.aggregate(observations))
}
