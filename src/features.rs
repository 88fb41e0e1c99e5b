//! Feature matrix and label vector preparation for the churn classifier

use ndarray::{Array1, Array2};
use polars::prelude::*;

use crate::data::{column_strings, column_values, has_label, numeric_columns, LABEL_COLUMN};
use crate::error::ChurnError;

/// Class index of retained customers
pub const RETAIN: usize = 0;
/// Class index of churned customers
pub const CHURN: usize = 1;

/// Numeric features and binary labels ready for fitting
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    /// Feature column names in matrix column order
    pub feature_names: Vec<String>,
    /// Raw-scale features with missing values filled as 0 (n_rows, n_features)
    pub features: Array2<f64>,
    /// 1 = churn, 0 = retain
    pub labels: Array1<usize>,
    /// Rows dropped because their label was not "Yes" or "No"
    pub excluded_rows: usize,
}

impl PreparedFeatures {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Map a raw label to its class; anything but "Yes"/"No" is undefined
pub fn map_label(raw: Option<&str>) -> Option<usize> {
    match raw {
        Some("Yes") => Some(CHURN),
        Some("No") => Some(RETAIN),
        _ => None,
    }
}

/// Feature columns of a dataset: numeric columns except the label
pub fn feature_columns(df: &DataFrame) -> crate::Result<Vec<String>> {
    if !has_label(df) {
        return Err(ChurnError::MissingLabelColumn(LABEL_COLUMN.to_string()).into());
    }

    let columns: Vec<String> = numeric_columns(df)
        .into_iter()
        .filter(|name| name.as_str() != LABEL_COLUMN)
        .collect();

    if columns.is_empty() {
        return Err(ChurnError::NoUsableFeatures(LABEL_COLUMN.to_string()).into());
    }
    Ok(columns)
}

/// Rows whose label is "Yes" or "No"
pub fn labeled_rows(df: &DataFrame) -> crate::Result<DataFrame> {
    if !has_label(df) {
        return Err(ChurnError::MissingLabelColumn(LABEL_COLUMN.to_string()).into());
    }
    let label = || col(LABEL_COLUMN).cast(DataType::String);
    let labeled = df
        .clone()
        .lazy()
        .filter(label().eq(lit("Yes")).or(label().eq(lit("No"))))
        .collect()?;
    Ok(labeled)
}

/// Build the feature matrix and label vector from a dataset
///
/// Rows with an undefined label are excluded. No scaling is applied.
pub fn prepare_features(df: &DataFrame) -> crate::Result<PreparedFeatures> {
    let feature_names = feature_columns(df)?;

    let mapped: Vec<Option<usize>> = column_strings(df, LABEL_COLUMN)?
        .iter()
        .map(|raw| map_label(raw.as_deref()))
        .collect();
    let kept_rows: Vec<usize> = mapped
        .iter()
        .enumerate()
        .filter_map(|(row, label)| label.map(|_| row))
        .collect();
    let excluded_rows = df.height() - kept_rows.len();

    if kept_rows.is_empty() {
        return Err(ChurnError::LabelMappingUndefined {
            column: LABEL_COLUMN.to_string(),
            excluded: excluded_rows,
        }
        .into());
    }
    if excluded_rows > 0 {
        tracing::warn!(
            excluded_rows,
            "rows with a label outside {{Yes, No}} were excluded"
        );
    }

    let columns = feature_names
        .iter()
        .map(|name| column_values(df, name))
        .collect::<crate::Result<Vec<_>>>()?;

    let n_rows = kept_rows.len();
    let n_features = feature_names.len();
    let mut data = Vec::with_capacity(n_rows * n_features);
    for &row in &kept_rows {
        data.extend(columns.iter().map(|col| col[row].unwrap_or(0.0)));
    }
    let features = Array2::from_shape_vec((n_rows, n_features), data)?;
    let labels: Array1<usize> = kept_rows.iter().filter_map(|&row| mapped[row]).collect();

    tracing::debug!(n_rows, n_features, "features prepared");

    Ok(PreparedFeatures {
        feature_names,
        features,
        labels,
        excluded_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn churn_frame() -> DataFrame {
        df! {
            "customerID" => ["a", "b", "c", "d"],
            "tenure" => [Some(1i64), Some(24), None, Some(60)],
            "MonthlyCharges" => [70.5, 20.0, 99.9, 45.0],
            "Churn" => ["Yes", "No", "Yes", "No"],
        }
        .unwrap()
    }

    #[test]
    fn test_prepare_features_shape() {
        let prepared = prepare_features(&churn_frame()).unwrap();

        assert_eq!(prepared.feature_names, vec!["tenure", "MonthlyCharges"]);
        assert_eq!(prepared.features.shape(), &[4, 2]);
        assert_eq!(prepared.labels.to_vec(), vec![1, 0, 1, 0]);
        assert_eq!(prepared.excluded_rows, 0);
    }

    #[test]
    fn test_missing_values_filled_with_zero() {
        let prepared = prepare_features(&churn_frame()).unwrap();
        assert_eq!(prepared.features[[2, 0]], 0.0);
        assert_eq!(prepared.features[[2, 1]], 99.9);
    }

    #[test]
    fn test_nan_cells_filled_with_zero() {
        let df = df! {
            "tenure" => [1.0, f64::NAN, 3.0],
            "MonthlyCharges" => [20.0, 30.0, f64::INFINITY],
            "Churn" => ["Yes", "No", "No"],
        }
        .unwrap();
        let prepared = prepare_features(&df).unwrap();

        assert_eq!(prepared.features[[1, 0]], 0.0);
        assert_eq!(prepared.features[[2, 1]], 0.0);
        assert!(prepared.features.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_labeled_rows_drop_undefined_labels() {
        let df = df! {
            "tenure" => [1i64, 200, 3, 4],
            "Churn" => [Some("Yes"), Some("Maybe"), None, Some("No")],
        }
        .unwrap();
        let labeled = labeled_rows(&df).unwrap();

        assert_eq!(labeled.height(), 2);
        assert_eq!(column_values(&labeled, "tenure").unwrap(), vec![Some(1.0), Some(4.0)]);
    }

    #[test]
    fn test_missing_label_column() {
        let df = df! { "tenure" => [1i64, 2, 3] }.unwrap();
        let err = prepare_features(&df).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ChurnError>(),
            Some(&ChurnError::MissingLabelColumn("Churn".to_string()))
        );
    }

    #[test]
    fn test_no_usable_features() {
        let df = df! {
            "gender" => ["Male", "Female"],
            "Churn" => ["Yes", "No"],
        }
        .unwrap();
        let err = prepare_features(&df).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChurnError>(),
            Some(ChurnError::NoUsableFeatures(_))
        ));
    }

    #[test]
    fn test_undefined_labels_are_excluded() {
        let df = df! {
            "tenure" => [1i64, 2, 3, 4],
            "Churn" => [Some("Yes"), Some("Maybe"), None, Some("No")],
        }
        .unwrap();
        let prepared = prepare_features(&df).unwrap();

        assert_eq!(prepared.n_rows(), 2);
        assert_eq!(prepared.excluded_rows, 2);
        assert_eq!(prepared.labels.to_vec(), vec![1, 0]);
        assert_eq!(prepared.features.column(0).to_vec(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_all_labels_undefined() {
        let df = df! {
            "tenure" => [1i64, 2],
            "Churn" => ["yes", "no"],
        }
        .unwrap();
        let err = prepare_features(&df).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChurnError>(),
            Some(ChurnError::LabelMappingUndefined { excluded: 2, .. })
        ));
    }

    #[test]
    fn test_map_label() {
        assert_eq!(map_label(Some("Yes")), Some(CHURN));
        assert_eq!(map_label(Some("No")), Some(RETAIN));
        assert_eq!(map_label(Some("1")), None);
        assert_eq!(map_label(None), None);
    }
}
