//! churnscope: A Rust CLI application for customer churn analysis
//!
//! This library loads a tabular customer dataset, renders summary views and charts,
//! evaluates a logistic regression churn classifier on a held-out split and
//! predicts churn for a single customer.

pub mod app;
pub mod cli;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod model;
pub mod viz;

// Re-export public items for easier access
pub use app::{dispatch, AppState, MenuAction, MenuKind, Settings, View};
pub use cli::Args;
pub use data::{load_dataset, FeatureRange, LABEL_COLUMN};
pub use error::ChurnError;
pub use features::{prepare_features, PreparedFeatures};
pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use model::{evaluate, predict_customer, ChurnModel, Evaluation, ModelConfig, Prediction};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
