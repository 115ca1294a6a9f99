use crate::error::{CpiError, Result};
use crate::schema::{Indicator, Source};
use crate::weights::{default_region_weights, RegionWeights};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    #[default]
    #[schemars(
        description = "Sum whatever weighted regions are present for a (date, category, source) group, even if some are missing."
    )]
    Partial,

    #[schemars(
        description = "Only emit a national value when every weighted region contributes an index for the group."
    )]
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReportConfig {
    #[schemars(description = "Location of the master CPI table.")]
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    #[schemars(description = "Single-byte field delimiter of the master table.")]
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[schemars(description = "Region label given to the synthetic weighted aggregate.")]
    #[serde(default = "default_national_region")]
    pub national_region: String,

    #[schemars(description = "Region preselected when the national aggregate is unavailable.")]
    #[serde(default = "default_fallback_region")]
    pub fallback_region: String,

    #[schemars(description = "Category preselected when present for the chosen region.")]
    #[serde(default = "default_category")]
    pub default_category: String,

    #[schemars(
        description = "Nominal weight of each real region in the national aggregate. Rescaled to sum to 1 before use."
    )]
    #[serde(default = "default_region_weights")]
    pub region_weights: BTreeMap<String, f64>,

    #[serde(default)]
    pub coverage: CoveragePolicy,

    #[schemars(description = "Indicator columns that may be plotted for each source. A missing source has none.")]
    #[serde(default = "default_indicators")]
    pub indicators: BTreeMap<Source, Vec<Indicator>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            delimiter: default_delimiter(),
            national_region: default_national_region(),
            fallback_region: default_fallback_region(),
            default_category: default_category(),
            region_weights: default_region_weights(),
            coverage: CoveragePolicy::default(),
            indicators: default_indicators(),
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        self.weights()?;

        if self.national_region.trim().is_empty() {
            return Err(CpiError::InvalidConfig(
                "national_region must not be empty".to_string(),
            ));
        }

        if self.region_weights.contains_key(&self.national_region) {
            return Err(CpiError::InvalidConfig(format!(
                "'{}' cannot be both the aggregate and one of its weighted regions",
                self.national_region
            )));
        }

        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                CpiError::InvalidConfig(format!(
                    "Delimiter {:?} is not a single ASCII character",
                    self.delimiter
                ))
            })
    }

    pub fn weights(&self) -> Result<RegionWeights> {
        RegionWeights::renormalized(&self.region_weights)
    }

    /// Legal indicator columns for a source, empty when unmapped.
    pub fn indicators_for(&self, source: &Source) -> &[Indicator] {
        self.indicators
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/ipc_maestro_sin_ponderaciones.csv")
}

fn default_delimiter() -> char {
    ','
}

fn default_national_region() -> String {
    "Región Nacional".to_string()
}

fn default_fallback_region() -> String {
    "Región GBA".to_string()
}

fn default_category() -> String {
    "Nivel general".to_string()
}

fn default_indicators() -> BTreeMap<Source, Vec<Indicator>> {
    let mut table = BTreeMap::new();
    table.insert(
        Source::Variations,
        vec![Indicator::MonthlyChange, Indicator::YoyChange, Indicator::Index],
    );
    table.insert(Source::Prices, vec![Indicator::AveragePrice]);
    table.insert(Source::Openings, vec![Indicator::Index]);
    table
}
