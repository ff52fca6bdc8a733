//! Sustainability dataset loading
//!
//! [`DataLoader::load`] walks the configured sources in order (PostgreSQL,
//! CSV file, synthetic generator) and returns the first non-empty table.

use crate::config::{DatabaseConfig, DataSourceConfig, SyntheticConfig};
use crate::error::{ForecastError, Result};
use crate::schema;
use polars::prelude::*;
use postgres::{NoTls, SimpleQueryMessage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Where a dataset was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOrigin {
    Database { table: String },
    Csv { path: String },
    Synthetic { seed: u64 },
    InMemory,
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOrigin::Database { table } => write!(f, "database table '{}'", table),
            DataOrigin::Csv { path } => write!(f, "CSV file '{}'", path),
            DataOrigin::Synthetic { seed } => write!(f, "synthetic data (seed {})", seed),
            DataOrigin::InMemory => f.write_str("in-memory data"),
        }
    }
}

/// A loaded table of observations
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Data frame holding the raw observations
    df: DataFrame,
    /// Source of the data frame
    origin: DataOrigin,
}

impl Dataset {
    pub fn new(df: DataFrame, origin: DataOrigin) -> Self {
        Self { df, origin }
    }

    /// Build an in-memory dataset from timestamp strings and metric columns
    pub fn from_columns(timestamps: Vec<String>, metrics: Vec<(&str, Vec<Option<f64>>)>) -> Result<Self> {
        let mut columns = vec![Series::new(schema::TIMESTAMP, timestamps)];
        for (name, values) in metrics {
            columns.push(Series::new(name, values));
        }
        let df = DataFrame::new(columns)?;
        Ok(Self::new(df, DataOrigin::InMemory))
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn origin(&self) -> &DataOrigin {
        &self.origin
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().contains(&name)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Read a column as floats; nulls and non-finite values become `None`.
    ///
    /// Text columns are parsed value by value and fail with
    /// [`ForecastError::DataError`] on the first value that is not a number.
    pub fn column_as_f64(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.df.column(name)?;
        let values: Vec<Option<f64>> = match col.dtype() {
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .map(|value| match value.map(str::trim) {
                    None | Some("") => Ok(None),
                    Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
                        ForecastError::DataError(format!(
                            "Column '{}' holds non-numeric value '{}'",
                            name, text
                        ))
                    }),
                })
                .collect::<Result<_>>()?,
            dtype if dtype.is_numeric() || *dtype == DataType::Boolean => {
                let casted = col.cast(&DataType::Float64)?;
                casted.f64()?.into_iter().collect()
            }
            other => {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' has non-numeric type {}",
                    name, other
                )))
            }
        };

        Ok(values
            .into_iter()
            .map(|value| value.filter(|v| v.is_finite()))
            .collect())
    }

    /// Read a column as text, whatever its stored type
    pub fn column_as_strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        let casted = self.df.column(name)?.cast(&DataType::Utf8)?;
        Ok(casted
            .utf8()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect())
    }
}

/// Loads the dataset from the configured sources
#[derive(Debug, Clone)]
pub struct DataLoader {
    config: DataSourceConfig,
}

impl DataLoader {
    pub fn new(config: DataSourceConfig) -> Self {
        Self { config }
    }

    /// Try every configured source in order and return the first non-empty table
    pub fn load(&self) -> Result<Dataset> {
        let mut failures = Vec::new();

        if let Some(database) = &self.config.database {
            match Self::from_database(database) {
                Ok(dataset) if !dataset.is_empty() => return Ok(Self::loaded(dataset)),
                Ok(_) => {
                    tracing::warn!(table = %database.table, "Database table is empty, falling back");
                    failures.push(format!("table '{}' is empty", database.table));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Database load failed, falling back");
                    failures.push(err.to_string());
                }
            }
        }

        if let Some(path) = &self.config.csv_path {
            match Self::from_csv(path) {
                Ok(dataset) if !dataset.is_empty() => return Ok(Self::loaded(dataset)),
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "CSV file is empty, falling back");
                    failures.push(format!("'{}' is empty", path.display()));
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "CSV load failed, falling back");
                    failures.push(err.to_string());
                }
            }
        }

        if self.config.synthetic.enabled {
            match Self::synthetic(&self.config.synthetic) {
                Ok(dataset) if !dataset.is_empty() => return Ok(Self::loaded(dataset)),
                Ok(_) => failures.push("synthetic range is empty".to_string()),
                Err(err) => {
                    tracing::warn!(error = %err, "Synthetic data generation failed");
                    failures.push(err.to_string());
                }
            }
        }

        if failures.is_empty() {
            failures.push("no data source configured".to_string());
        }
        Err(ForecastError::DataUnavailable(failures.join("; ")))
    }

    fn loaded(dataset: Dataset) -> Dataset {
        tracing::info!(origin = %dataset.origin(), rows = dataset.len(), "Dataset loaded");
        dataset
    }

    /// Load observations from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Ok(Dataset::new(
            df,
            DataOrigin::Csv {
                path: path.display().to_string(),
            },
        ))
    }

    /// Load the whole table over the simple-query protocol.
    ///
    /// Every value arrives as text; a column whose non-null values all parse
    /// as numbers becomes a float column, anything else stays text.
    ///
    /// The blocking client runs on its own thread so the call is safe from
    /// inside an async runtime.
    pub fn from_database(config: &DatabaseConfig) -> Result<Dataset> {
        validate_table_name(&config.table)?;

        let (names, cells) = std::thread::scope(|scope| {
            scope
                .spawn(|| fetch_table(config))
                .join()
                .map_err(|_| ForecastError::Database("database worker panicked".to_string()))
        })??;

        let columns: Vec<Series> = names
            .iter()
            .zip(cells)
            .map(|(name, values)| text_column(name, values))
            .collect();
        let df = if columns.is_empty() {
            DataFrame::default()
        } else {
            DataFrame::new(columns)?
        };

        Ok(Dataset::new(
            df,
            DataOrigin::Database {
                table: config.table.clone(),
            },
        ))
    }

    /// Generate daily observations from normal distributions
    pub fn synthetic(config: &SyntheticConfig) -> Result<Dataset> {
        let dates: Vec<_> = config
            .start
            .iter_days()
            .take_while(|date| *date <= config.end)
            .collect();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut columns = vec![Series::new(
            schema::TIMESTAMP,
            dates
                .iter()
                .map(|date| date.format("%Y-%m-%d").to_string())
                .collect::<Vec<_>>(),
        )];

        let distributions = [
            (schema::CO2, 150.0, 20.0),
            (schema::ENERGY, 1000.0, 100.0),
            (schema::WASTE, 50.0, 10.0),
            (schema::HEAT, 200.0, 30.0),
            (schema::ELECTRICITY, 1200.0, 150.0),
        ];
        for (name, mean, std_dev) in distributions {
            let normal = Normal::new(mean, std_dev)
                .map_err(|e| ForecastError::Internal(format!("bad distribution for {}: {}", name, e)))?;
            let values: Vec<f64> = dates.iter().map(|_| normal.sample(&mut rng)).collect();
            columns.push(Series::new(name, values));
        }

        let df = DataFrame::new(columns)?;
        Ok(Dataset::new(df, DataOrigin::Synthetic { seed: config.seed }))
    }

    /// Wrap an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Dataset {
        Dataset::new(df, DataOrigin::InMemory)
    }
}

type TextTable = (Vec<String>, Vec<Vec<Option<String>>>);

/// Column names and text cells of `SELECT * FROM table`
fn fetch_table(config: &DatabaseConfig) -> Result<TextTable> {
    let mut pg_config: postgres::Config = config.url.parse()?;
    pg_config.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
    let mut client = pg_config.connect(NoTls)?;

    let query = format!("SELECT * FROM {}", config.table);
    let mut names: Vec<String> = Vec::new();
    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for message in client.simple_query(&query)? {
        if let SimpleQueryMessage::Row(row) = message {
            if names.is_empty() {
                names = row.columns().iter().map(|c| c.name().to_string()).collect();
                cells = vec![Vec::new(); names.len()];
            }
            for (i, column) in cells.iter_mut().enumerate() {
                column.push(row.get(i).map(str::to_string));
            }
        }
    }
    tracing::debug!(table = %config.table, rows = cells.first().map_or(0, Vec::len), "Fetched rows");
    Ok((names, cells))
}

fn text_column(name: &str, values: Vec<Option<String>>) -> Series {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|value| match value {
            None => Some(None),
            Some(text) => text.trim().parse::<f64>().ok().map(Some),
        })
        .collect();

    match parsed {
        Some(numbers) if numbers.iter().any(Option::is_some) => Series::new(name, numbers),
        _ => Series::new(name, values),
    }
}

/// Accept `table` or `schema.table` made of plain SQL identifiers
fn validate_table_name(table: &str) -> Result<()> {
    let is_identifier = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|part| is_identifier(part)) {
        Ok(())
    } else {
        Err(ForecastError::Config(format!("invalid table name '{}'", table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("sustainability_table").is_ok());
        assert!(validate_table_name("public.readings_2024").is_ok());
        assert!(validate_table_name("t; DROP TABLE t").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name("9lives").is_err());
        assert!(validate_table_name("").is_err());
    }

    #[test]
    fn test_text_column_typing() {
        let numeric = text_column("x", vec![Some("1.5".into()), None, Some(" 2 ".into())]);
        assert_eq!(numeric.dtype(), &DataType::Float64);

        let text = text_column("t", vec![Some("2023-01-01".into()), Some("2.0".into())]);
        assert_eq!(text.dtype(), &DataType::Utf8);

        let all_null = text_column("n", vec![None, None]);
        assert_eq!(all_null.dtype(), &DataType::Utf8);
    }

    #[test]
    fn test_column_as_f64_filters_non_finite() {
        let dataset = Dataset::from_columns(
            vec!["2023-01-01".into(), "2023-01-02".into(), "2023-01-03".into()],
            vec![("x", vec![Some(1.0), Some(f64::NAN), None])],
        )
        .unwrap();
        assert_eq!(dataset.column_as_f64("x").unwrap(), vec![Some(1.0), None, None]);
        assert!(matches!(
            dataset.column_as_f64(schema::TIMESTAMP),
            Err(ForecastError::DataError(_))
        ));
    }
}
