//! Domain errors surfaced to the user as inline messages

/// Conditions that disable an analysis action without ending the session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChurnError {
    /// No dataset has been loaded yet
    #[error("No dataset loaded. Please load a CSV file first.")]
    EmptyDataset,

    /// The label column required for modeling is absent
    #[error("Dataset has no '{0}' column; modeling and prediction are disabled")]
    MissingLabelColumn(String),

    /// No numeric column other than the label
    #[error("Dataset has no numeric feature columns besides '{0}'")]
    NoUsableFeatures(String),

    /// No numeric column at all (EDA)
    #[error("Dataset has no numeric columns to analyze")]
    NoNumericColumns,

    /// Every row carries a label outside {Yes, No}
    #[error("No row of '{column}' has a label in {{Yes, No}} ({excluded} rows excluded)")]
    LabelMappingUndefined { column: String, excluded: usize },

    /// Too few rows to split or fit
    #[error("At least {required} labeled rows are required, found {found}")]
    InsufficientRows { required: usize, found: usize },

    /// The training data holds only one class
    #[error("Training data contains only one class ({0}); cannot fit a classifier")]
    SingleClassTraining(String),

    /// Prediction input does not line up with the feature columns
    #[error("Expected {expected} feature values, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    /// Column is not present or not numeric
    #[error("Unknown numeric column: {0}")]
    UnknownColumn(String),
}
