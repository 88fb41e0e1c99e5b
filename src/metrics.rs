//! Classification metrics for held-out evaluation
//!
//! Class 0 = retain, class 1 = churn. Every matrix and report uses that order.

use std::fmt;

use crate::features::{CHURN, RETAIN};

/// Display names of the two classes, indexed by class
pub const CLASS_NAMES: [&str; 2] = ["retain", "churn"];

/// 2x2 counts: rows = actual class, columns = predicted class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    /// Tally predictions against ground truth; labels outside {0, 1} are ignored
    pub fn from_labels(actual: &[usize], predicted: &[usize]) -> Self {
        assert_eq!(
            actual.len(),
            predicted.len(),
            "predictions and labels must have same length"
        );

        let mut counts = [[0usize; 2]; 2];
        for (&a, &p) in actual.iter().zip(predicted) {
            if a <= CHURN && p <= CHURN {
                counts[a][p] += 1;
            }
        }
        Self { counts }
    }

    pub fn true_negatives(&self) -> usize {
        self.counts[RETAIN][RETAIN]
    }

    pub fn false_positives(&self) -> usize {
        self.counts[RETAIN][CHURN]
    }

    pub fn false_negatives(&self) -> usize {
        self.counts[CHURN][RETAIN]
    }

    pub fn true_positives(&self) -> usize {
        self.counts[CHURN][CHURN]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Rows whose actual class is `class`
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Rows predicted as `class`
    pub fn predicted(&self, class: usize) -> usize {
        self.counts[RETAIN][class] + self.counts[CHURN][class]
    }

    /// Fraction of correct predictions; 0 for an empty matrix
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positives() + self.true_negatives()) as f64 / total as f64
    }

    /// True when one of the classes has no actual rows
    pub fn is_degenerate(&self) -> bool {
        self.support(RETAIN) == 0 || self.support(CHURN) == 0
    }
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    /// Undefined ratios (zero denominators) read as 0
    fn for_class(matrix: &ConfusionMatrix, class: usize) -> Self {
        let hits = matrix.counts[class][class];
        let predicted = matrix.predicted(class);
        let support = matrix.support(class);

        let precision = if predicted > 0 {
            hits as f64 / predicted as f64
        } else {
            0.0
        };
        let recall = if support > 0 {
            hits as f64 / support as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Per-class report with macro and weighted averages
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Indexed by class
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let classes = [
            ClassMetrics::for_class(matrix, RETAIN),
            ClassMetrics::for_class(matrix, CHURN),
        ];
        let total = matrix.total();
        let macro_avg = averaged(&classes, [1.0, 1.0], 2.0, total);
        let weighted_avg = averaged(
            &classes,
            [classes[RETAIN].support as f64, classes[CHURN].support as f64],
            total as f64,
            total,
        );

        Self {
            classes,
            accuracy: matrix.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }
}

/// Weighted mean of per-class metrics; 0 when `norm` is 0
fn averaged(
    classes: &[ClassMetrics; 2],
    weights: [f64; 2],
    norm: f64,
    support: usize,
) -> ClassMetrics {
    let combine = |metric: fn(&ClassMetrics) -> f64| {
        if norm > 0.0 {
            classes.iter().zip(weights).map(|(c, w)| metric(c) * w).sum::<f64>() / norm
        } else {
            0.0
        }
    };

    ClassMetrics {
        precision: combine(|c| c.precision),
        recall: combine(|c| c.recall),
        f1: combine(|c| c.f1),
        support,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in CLASS_NAMES.iter().zip(self.classes.iter()) {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}
