//! Dataset loading and descriptive views using Polars

use std::fs::File;

use anyhow::Context;
use polars::prelude::*;

use crate::error::ChurnError;

/// Binary label column required for modeling
pub const LABEL_COLUMN: &str = "Churn";

/// Dataset loaded at startup when present
pub const DEFAULT_DATA_PATH: &str = "data/churn.csv";

/// Rows scanned for CSV schema inference
const INFER_SCHEMA_ROWS: usize = 1000;

/// Load a CSV file with a header row into a DataFrame
pub fn load_dataset(file_path: &str) -> crate::Result<DataFrame> {
    let file = File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("Failed to parse CSV {}", file_path))?;

    tracing::info!(
        path = file_path,
        rows = df.height(),
        columns = df.width(),
        "dataset loaded"
    );

    Ok(df)
}

/// Whether the dataset carries the label column
pub fn has_label(df: &DataFrame) -> bool {
    df.get_column_names().contains(&LABEL_COLUMN)
}

/// Names of integer and floating point columns, in dataset order
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|s| s.dtype().is_numeric())
        .map(|s| s.name().to_string())
        .collect()
}

/// Numeric column cast to `f64`; NaN and infinities read as null
pub fn finite_values(df: &DataFrame, name: &str) -> crate::Result<Float64Chunked> {
    let series = df.column(name)?;
    if !series.dtype().is_numeric() {
        return Err(ChurnError::UnknownColumn(name.to_string()).into());
    }
    let casted = series.cast(&DataType::Float64)?;
    let mut values: Float64Chunked = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    values.rename(name);
    Ok(values)
}

/// Read a numeric column as `f64`, keeping nulls
pub fn column_values(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<f64>>> {
    Ok(finite_values(df, name)?.into_iter().collect())
}

/// Read any column as optional strings
pub fn column_strings(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<String>>> {
    let casted = df.column(name)?.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Count rows of `column` equal to `value`; `None` if the column is absent
fn count_value(df: &DataFrame, column: &str, value: &str) -> crate::Result<Option<usize>> {
    if !df.get_column_names().contains(&column) {
        return Ok(None);
    }
    let count = column_strings(df, column)?
        .iter()
        .filter(|v| v.as_deref() == Some(value))
        .count();
    Ok(Some(count))
}

/// Headline metric cards for the data view
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOverview {
    pub total_customers: usize,
    pub total_churn: Option<usize>,
    /// Churned share in percent
    pub churn_rate: Option<f64>,
    pub phone_service: Option<usize>,
    pub fiber_optic: Option<usize>,
}

/// Compute the overview cards
pub fn overview(df: &DataFrame) -> crate::Result<DatasetOverview> {
    let total_customers = df.height();
    let total_churn = count_value(df, LABEL_COLUMN, "Yes")?;
    let churn_rate = total_churn
        .filter(|_| total_customers > 0)
        .map(|churned| churned as f64 * 100.0 / total_customers as f64);

    Ok(DatasetOverview {
        total_customers,
        total_churn,
        churn_rate,
        phone_service: count_value(df, "PhoneService", "Yes")?,
        fiber_optic: count_value(df, "InternetService", "Fiber optic")?,
    })
}

/// Descriptive statistics of one numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    /// Non-null values
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (ddof = 1)
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Describe every numeric column
pub fn describe(df: &DataFrame) -> crate::Result<Vec<ColumnStats>> {
    numeric_columns(df)
        .into_iter()
        .map(|name| -> crate::Result<ColumnStats> {
            let ca = finite_values(df, &name)?;
            let count = ca.len() - ca.null_count();
            Ok(ColumnStats {
                count,
                mean: ca.mean(),
                std: ca.std(1).filter(|_| count > 1),
                min: ca.min(),
                q25: ca.quantile(0.25, QuantileInterpolOptions::Linear)?,
                median: ca.median(),
                q75: ca.quantile(0.75, QuantileInterpolOptions::Linear)?,
                max: ca.max(),
                name,
            })
        })
        .collect()
}

/// Type and cardinality of a column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub n_unique: usize,
}

pub fn column_info(df: &DataFrame) -> crate::Result<Vec<ColumnInfo>> {
    df.get_columns()
        .iter()
        .map(|s| -> crate::Result<ColumnInfo> {
            Ok(ColumnInfo {
                name: s.name().to_string(),
                dtype: s.dtype().to_string(),
                n_unique: s.n_unique()?,
            })
        })
        .collect()
}

/// Count rows per distinct value of `column`, most frequent first
///
/// Nulls are skipped. Ties are ordered by value so output is stable.
pub fn value_counts(df: &DataFrame, column: &str) -> crate::Result<Vec<(String, usize)>> {
    let grouped = df
        .clone()
        .lazy()
        .select([col(column).cast(DataType::String)])
        .drop_nulls(None)
        .group_by([col(column)])
        .agg([len().cast(DataType::UInt64).alias("count")])
        .collect()?;

    let values = grouped.column(column)?.str()?;
    let totals = grouped.column("count")?.u64()?;
    let mut counts: Vec<(String, usize)> = values
        .into_iter()
        .zip(totals)
        .filter_map(|(value, n)| Some((value?.to_string(), n? as usize)))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

/// Observed range of a feature column, used as input guidance
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    /// Range collapsed to a single allowed value
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Min/max of each named numeric column; all-null columns give `0..=0`
pub fn feature_ranges(df: &DataFrame, columns: &[String]) -> crate::Result<Vec<FeatureRange>> {
    columns
        .iter()
        .map(|name| -> crate::Result<FeatureRange> {
            let ca = finite_values(df, name)?;
            Ok(FeatureRange {
                name: name.clone(),
                min: ca.min().unwrap_or(0.0),
                max: ca.max().unwrap_or(0.0),
            })
        })
        .collect()
}
