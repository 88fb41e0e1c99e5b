//! Logistic regression churn classifier: held-out evaluation and single-customer prediction

use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ChurnError;
use crate::features::{PreparedFeatures, CHURN, RETAIN};
use crate::metrics::{ClassificationReport, ConfusionMatrix};

/// Fitting and split parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Share of rows held out for evaluation
    pub test_ratio: f64,
    /// Seed of the train/test shuffle
    pub seed: u64,
    /// Iteration cap of the L-BFGS solver
    pub max_iterations: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            max_iterations: 500,
        }
    }
}

/// Fitted logistic regression over a fixed feature set
#[derive(Debug)]
pub struct ChurnModel {
    /// Fitted model from linfa
    pub model: FittedLogisticRegression<f64, usize>,
    /// Feature columns, in the order the model expects them
    pub feature_names: Vec<String>,
}

impl ChurnModel {
    /// Fit on the full prepared dataset
    pub fn train(prepared: &PreparedFeatures, config: &ModelConfig) -> crate::Result<Self> {
        Self::fit(
            &prepared.features,
            &prepared.labels,
            &prepared.feature_names,
            config.max_iterations,
        )
    }

    /// Fit on an arbitrary feature matrix and label vector
    pub fn fit(
        features: &Array2<f64>,
        labels: &Array1<usize>,
        feature_names: &[String],
        max_iterations: u64,
    ) -> crate::Result<Self> {
        if features.nrows() < 2 {
            return Err(ChurnError::InsufficientRows {
                required: 2,
                found: features.nrows(),
            }
            .into());
        }
        let churned = labels.iter().filter(|&&l| l == CHURN).count();
        if churned == 0 || churned == labels.len() {
            let class = if churned == 0 { "retain" } else { "churn" };
            return Err(ChurnError::SingleClassTraining(class.to_string()).into());
        }

        let dataset = Dataset::new(features.clone(), labels.clone());
        let model = LogisticRegression::<f64>::default()
            .max_iterations(max_iterations)
            .fit(&dataset)?;

        tracing::debug!(
            rows = features.nrows(),
            intercept = model.intercept(),
            "logistic regression fitted"
        );

        Ok(Self {
            model,
            feature_names: feature_names.to_vec(),
        })
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        self.model.params()
    }

    pub fn intercept(&self) -> f64 {
        self.model.intercept()
    }

    /// Predicted class for every row
    pub fn predict_batch(&self, features: &Array2<f64>) -> Array1<usize> {
        self.model.predict(features)
    }

    /// Probability of churn for every row
    ///
    /// linfa reports the probability of its positive class, which is whichever
    /// label it saw first during fitting.
    pub fn churn_probabilities(&self, features: &Array2<f64>) -> Array1<f64> {
        let positive = self.model.predict_probabilities(features);
        if self.model.labels().pos.class == CHURN {
            positive
        } else {
            positive.mapv(|p| 1.0 - p)
        }
    }

    /// Classify one customer given one value per feature column
    pub fn predict(&self, values: &[f64]) -> crate::Result<Prediction> {
        if values.len() != self.feature_names.len() {
            return Err(ChurnError::FeatureCountMismatch {
                expected: self.feature_names.len(),
                actual: values.len(),
            }
            .into());
        }

        let row = Array2::from_shape_vec((1, values.len()), values.to_vec())?;
        let label = self.predict_batch(&row)[0];
        let churn_probability = self.churn_probabilities(&row)[0];

        Ok(Prediction {
            label,
            churn_probability,
        })
    }
}

/// Outcome of classifying one customer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// 1 = predicted churn, 0 = predicted retain
    pub label: usize,
    pub churn_probability: f64,
}

impl Prediction {
    pub fn is_churn(&self) -> bool {
        self.label == CHURN
    }

    pub fn message(&self) -> &'static str {
        if self.is_churn() {
            "Customer likely to churn!"
        } else {
            "Customer safe (not likely to churn)"
        }
    }
}

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle rows with a seeded RNG and hold out `ceil(n * test_ratio)` of them
pub fn train_test_split(n_rows: usize, test_ratio: f64, seed: u64) -> crate::Result<SplitIndices> {
    if n_rows < 2 {
        return Err(ChurnError::InsufficientRows {
            required: 2,
            found: n_rows,
        }
        .into());
    }
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        anyhow::bail!("Test ratio must be between 0 and 1 (exclusive), got {}", test_ratio);
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_rows as f64 * test_ratio).ceil() as usize).clamp(1, n_rows - 1);
    let train = indices.split_off(n_test);

    Ok(SplitIndices {
        train,
        test: indices,
    })
}

/// Held-out evaluation results
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub split: SplitIndices,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    pub accuracy: f64,
    /// Held-out partition lacks one of the classes
    pub degenerate: bool,
}

/// Fit on the training partition and score the held-out partition
pub fn evaluate(prepared: &PreparedFeatures, config: &ModelConfig) -> crate::Result<Evaluation> {
    let split = train_test_split(prepared.n_rows(), config.test_ratio, config.seed)?;

    let x_train = prepared.features.select(Axis(0), &split.train);
    let y_train = prepared.labels.select(Axis(0), &split.train);
    let x_test = prepared.features.select(Axis(0), &split.test);
    let y_test = prepared.labels.select(Axis(0), &split.test);

    tracing::info!(
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        seed = config.seed,
        "evaluating churn classifier"
    );

    let model = ChurnModel::fit(
        &x_train,
        &y_train,
        &prepared.feature_names,
        config.max_iterations,
    )?;
    let y_pred = model.predict_batch(&x_test);

    let confusion = ConfusionMatrix::from_labels(&y_test.to_vec(), &y_pred.to_vec());
    let report = ClassificationReport::from_confusion(&confusion);
    let degenerate = confusion.is_degenerate();
    if degenerate {
        tracing::warn!(
            retain = confusion.support(RETAIN),
            churn = confusion.support(CHURN),
            "held-out partition is missing a class; its metrics read as zero"
        );
    }

    Ok(Evaluation {
        accuracy: confusion.accuracy(),
        split,
        confusion,
        report,
        degenerate,
    })
}

/// Refit on every prepared row and classify one customer
pub fn predict_customer(
    prepared: &PreparedFeatures,
    values: &[f64],
    config: &ModelConfig,
) -> crate::Result<Prediction> {
    if values.len() != prepared.n_features() {
        return Err(ChurnError::FeatureCountMismatch {
            expected: prepared.n_features(),
            actual: values.len(),
        }
        .into());
    }

    let model = ChurnModel::train(prepared, config)?;
    let prediction = model.predict(values)?;

    tracing::info!(
        label = prediction.label,
        churn_probability = prediction.churn_probability,
        "customer classified"
    );
    Ok(prediction)
}
