use crate::config::ReportConfig;
use crate::error::{CpiError, Result};
use crate::schema::{Observation, Source};
use crate::utils::parse_month;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 5] = ["fecha", "region", "categoria", "origen", "indice"];

/// One line of the master table as written on disk.
#[derive(Debug, Deserialize)]
struct MasterTableRow {
    fecha: Option<String>,
    region: Option<String>,
    categoria: Option<String>,
    origen: Option<String>,
    indice: Option<String>,
    #[serde(default)]
    precio_promedio: Option<String>,
    #[serde(default)]
    variacion_mensual: Option<String>,
    #[serde(default)]
    variacion_interanual: Option<String>,
}

pub struct DatasetLoader {
    delimiter: u8,
}

impl DatasetLoader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn from_config(config: &ReportConfig) -> Result<Self> {
        Ok(Self::new(config.delimiter_byte()?))
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Vec<Observation>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CpiError::DatasetUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loading CPI master table from {}", path.display());
        self.load_reader(file)
    }

    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Vec<Observation>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        verify_required_columns(&headers)?;

        let mut observations = Vec::new();
        let mut undated = 0usize;

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row: MasterTableRow = record.deserialize(Some(&headers))?;

            let observation = convert_row(row, line)?;
            if observation.date.is_none() {
                undated += 1;
            }
            observations.push(observation);
        }

        if observations.is_empty() {
            return Err(CpiError::EmptyDataset);
        }

        if undated > 0 {
            warn!(
                "{} of {} rows have an unparseable 'fecha' and are excluded from date-indexed views",
                undated,
                observations.len()
            );
        }
        debug!("Read {} observations", observations.len());

        Ok(observations)
    }
}

fn verify_required_columns(headers: &StringRecord) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(CpiError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

fn convert_row(row: MasterTableRow, line: u64) -> Result<Observation> {
    Ok(Observation {
        date: row.fecha.as_deref().and_then(parse_month),
        region: row.region.unwrap_or_default(),
        category: row.categoria.unwrap_or_default(),
        source: Source::from(row.origen.unwrap_or_default()),
        index: parse_number(row.indice, "indice", line)?,
        average_price: parse_number(row.precio_promedio, "precio_promedio", line)?,
        monthly_change: parse_number(row.variacion_mensual, "variacion_mensual", line)?,
        yoy_change: parse_number(row.variacion_interanual, "variacion_interanual", line)?,
    })
}

fn parse_number(raw: Option<String>, column: &str, line: u64) -> Result<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: f64 = trimmed.parse().map_err(|_| CpiError::InvalidNumber {
        line,
        column: column.to_string(),
        value: raw.clone(),
    })?;

    Ok(value.is_finite().then_some(value))
}

/// Reads the master table named by the configuration.
pub fn load_dataset(config: &ReportConfig) -> Result<Vec<Observation>> {
    DatasetLoader::from_config(config)?.load_path(&config.dataset_path)
}
