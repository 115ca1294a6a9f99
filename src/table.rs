use crate::aggregation::NationalAggregator;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::schema::{Indicator, Observation, Source};
use crate::utils::month_label;
use std::collections::BTreeSet;
use std::io::Write;

/// Original observations followed by the derived national rows. Built once
/// per load and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    observations: Vec<Observation>,
}

impl MergedTable {
    pub fn build(observations: Vec<Observation>, config: &ReportConfig) -> Result<Self> {
        let aggregator = NationalAggregator::new(config)?;
        Ok(Self {
            observations: aggregator.aggregate(observations),
        })
    }

    /// Wraps rows that are already merged.
    pub fn from_merged(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct non-blank sources, sorted by label.
    pub fn sources(&self) -> Vec<Source> {
        self.observations
            .iter()
            .filter(|o| !o.source.is_blank())
            .map(|o| o.source.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Writes the table back out in the master-table column layout.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "fecha",
            "region",
            "categoria",
            "origen",
            Indicator::Index.column(),
            Indicator::AveragePrice.column(),
            Indicator::MonthlyChange.column(),
            Indicator::YoyChange.column(),
        ])?;

        for o in &self.observations {
            wtr.write_record([
                o.date.map(month_label).unwrap_or_default(),
                o.region.clone(),
                o.category.clone(),
                o.source.to_string(),
                format_number(o.index),
                format_number(o.average_price),
                format_number(o.monthly_change),
                format_number(o.yoy_change),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
