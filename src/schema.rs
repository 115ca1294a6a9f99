use chrono::NaiveDate;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Provenance of a measurement (`origen` column).
///
/// Known labels map to dedicated variants; anything else is kept verbatim so
/// that it can still be listed, and then rejected by the indicator table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Variations,
    Prices,
    Openings,
    Other(String),
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::Variations => "variaciones",
            Source::Prices => "precios",
            Source::Openings => "aperturas",
            Source::Other(label) => label,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl From<String> for Source {
    fn from(label: String) -> Self {
        match label.trim() {
            "variaciones" => Source::Variations,
            "precios" => Source::Prices,
            "aperturas" => Source::Openings,
            other => Source::Other(other.to_string()),
        }
    }
}

impl From<&str> for Source {
    fn from(label: &str) -> Self {
        Source::from(label.to_string())
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.as_str().to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Sources are listed to users alphabetically by label.
impl Ord for Source {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Source {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl JsonSchema for Source {
    fn schema_name() -> String {
        "Source".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// A plottable column of the master table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Indicator {
    #[serde(rename = "variacion_mensual")]
    #[schemars(description = "Percent change against the previous row of the same series")]
    MonthlyChange,

    #[serde(rename = "variacion_interanual")]
    #[schemars(description = "Percent change against the row twelve positions earlier in the same series")]
    YoyChange,

    #[serde(rename = "indice")]
    #[schemars(description = "Price index level")]
    Index,

    #[serde(rename = "precio_promedio")]
    #[schemars(description = "Average price in currency units")]
    AveragePrice,
}

impl Indicator {
    pub fn column(&self) -> &'static str {
        match self {
            Indicator::MonthlyChange => "variacion_mensual",
            Indicator::YoyChange => "variacion_interanual",
            Indicator::Index => "indice",
            Indicator::AveragePrice => "precio_promedio",
        }
    }

    /// Percentage columns are labelled point by point; level columns get a
    /// single total-change annotation instead.
    pub fn is_percentage(&self) -> bool {
        matches!(self, Indicator::MonthlyChange | Indicator::YoyChange)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Indicator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "variacion_mensual" => Ok(Indicator::MonthlyChange),
            "variacion_interanual" => Ok(Indicator::YoyChange),
            "indice" => Ok(Indicator::Index),
            "precio_promedio" => Ok(Indicator::AveragePrice),
            other => Err(format!("Unknown indicator column '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    #[schemars(description = "Evolution of the chosen indicator over a date range")]
    TimeSeries,

    #[schemars(description = "Same indicator and category, one series per region")]
    RegionalComparison,

    #[schemars(description = "Categories by dates matrix for one region")]
    Heatmap,

    #[schemars(description = "Accumulated inflation between two dates on the index column")]
    Cumulative,
}

impl ChartKind {
    /// Column whose nulls are dropped when narrowing rows for this chart.
    pub fn value_column(&self, chosen: Indicator) -> Indicator {
        match self {
            ChartKind::Cumulative => Indicator::Index,
            _ => chosen,
        }
    }
}

/// One row of the master table. `date` is the first day of its month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: Option<NaiveDate>,
    pub region: String,
    pub category: String,
    pub source: Source,
    pub index: Option<f64>,
    pub average_price: Option<f64>,
    pub monthly_change: Option<f64>,
    pub yoy_change: Option<f64>,
}

impl Observation {
    pub fn value(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::MonthlyChange => self.monthly_change,
            Indicator::YoyChange => self.yoy_change,
            Indicator::Index => self.index,
            Indicator::AveragePrice => self.average_price,
        }
    }
}

/// Transient user choices for one interaction. Unset fields take the
/// defaults of the filter resolver and date-range selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Selection {
    #[serde(default)]
    #[schemars(description = "Data source label (e.g. 'variaciones'). Defaults to the first source alphabetically.")]
    pub source: Option<Source>,

    #[serde(default)]
    #[schemars(description = "Region name. Defaults to the national aggregate, then GBA, then the first region alphabetically.")]
    pub region: Option<String>,

    #[serde(default)]
    #[schemars(description = "Category name. Defaults to 'Nivel general' when present, else the first category alphabetically.")]
    pub category: Option<String>,

    #[serde(default)]
    #[schemars(description = "Indicator column. Must be legal for the source; defaults to the first legal one.")]
    pub indicator: Option<Indicator>,

    #[serde(default)]
    pub chart: ChartKind,

    #[serde(default)]
    #[schemars(description = "Start month (first day of month).")]
    pub start: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "End month (first day of month).")]
    pub end: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Monetary amount at the start date to be inflation-adjusted. Ignored unless positive.")]
    pub amount: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Realized amount at the end date, compared against the adjusted amount. Ignored unless positive.")]
    pub actual_amount: Option<f64>,
}

impl Selection {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Selection)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
