use crate::schema::Source;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CpiError {
    #[error("Dataset at {path} could not be read: {source}")]
    DatasetUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{0}' in dataset")]
    MissingColumn(String),

    #[error("Invalid number '{value}' in column '{column}' at line {line}")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Dataset contains no observations")]
    EmptyDataset,

    #[error("Invalid region weights: {0}")]
    InvalidRegionWeights(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CpiError>;

/// Recoverable conditions surfaced to the presentation layer as a message
/// next to an inert screen.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    #[error("No indicators configured for source '{origin}'")]
    NoIndicatorsConfigured { origin: Source },

    #[error("No data for this combination")]
    NoData,

    #[error("No index data available for this combination")]
    NoIndexData,

    #[error("No data for this selection")]
    EmptySelection,

    #[error("No later year with the same month ({month:02}) available after {year}")]
    NoLaterYearSameMonth { month: u32, year: i32 },

    #[error("No index found for the selected dates ({start} -> {end})")]
    MissingIndexForDates { start: String, end: String },

    #[error("Index at {date} is zero, accumulated change is not computable")]
    ZeroBaseIndex { date: String },
}

impl Notice {
    /// True for the "nothing to show" family, false for warnings that stop
    /// the current interaction.
    pub fn is_empty_state(&self) -> bool {
        matches!(
            self,
            Notice::NoData | Notice::NoIndexData | Notice::EmptySelection
        )
    }
}
