//! Classification metrics at category granularity

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Precision, recall and F1 for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// Category label
    pub label: String,
    /// Correct predictions over predictions of this label
    pub precision: f64,
    /// Correct predictions over true rows of this label
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// True rows of this label
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-category metrics plus macro and weighted averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// One entry per label, sorted by label
    pub classes: Vec<ClassMetrics>,
    /// Fraction of rows predicted correctly
    pub accuracy: f64,
    /// Unweighted mean over labels
    pub macro_avg: AverageMetrics,
    /// Mean over labels weighted by support
    pub weighted_avg: AverageMetrics,
}

/// Counts of (true, predicted) label pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Axis labels, sorted; rows are true labels, columns predicted
    pub labels: Vec<String>,
    /// `counts[i][j]`: rows with true label `i` predicted as `j`
    pub counts: Vec<Vec<usize>>,
}

/// Division that yields 0 instead of NaN
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl ConfusionMatrix {
    /// Build from parallel slices of true and predicted labels
    #[must_use]
    pub fn from_labels(truth: &[String], predicted: &[String]) -> Self {
        let labels: Vec<String> = truth
            .iter()
            .chain(predicted)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: FxHashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (t, p) in truth.iter().zip(predicted) {
            counts[index[t.as_str()]][index[p.as_str()]] += 1;
        }
        Self { labels, counts }
    }

    /// Total number of rows
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Rows on the diagonal
    #[must_use]
    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    /// Rows with true label `i` predicted as `j`
    #[must_use]
    pub fn get(&self, truth: &str, predicted: &str) -> usize {
        let i = self.labels.iter().position(|l| l == truth);
        let j = self.labels.iter().position(|l| l == predicted);
        match (i, j) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Per-category metrics derived from the matrix
    #[must_use]
    pub fn report(&self) -> ClassificationReport {
        let n = self.labels.len();
        let classes: Vec<ClassMetrics> = (0..n)
            .map(|i| {
                let tp = self.counts[i][i] as f64;
                let support: usize = self.counts[i].iter().sum();
                let predicted: usize = self.counts.iter().map(|row| row[i]).sum();
                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                ClassMetrics {
                    label: self.labels[i].clone(),
                    precision,
                    recall,
                    f1: ratio(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        let total = self.total();
        let macro_avg = AverageMetrics {
            precision: ratio(classes.iter().map(|c| c.precision).sum(), n as f64),
            recall: ratio(classes.iter().map(|c| c.recall).sum(), n as f64),
            f1: ratio(classes.iter().map(|c| c.f1).sum(), n as f64),
            support: total,
        };
        let weighted = |value: fn(&ClassMetrics) -> f64| {
            ratio(
                classes.iter().map(|c| value(c) * c.support as f64).sum(),
                total as f64,
            )
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        ClassificationReport {
            accuracy: ratio(self.correct() as f64, total as f64),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self.labels.iter().map(String::len).max().unwrap_or(0);
        let cell_width = self
            .labels
            .iter()
            .map(String::len)
            .chain(self.counts.iter().flatten().map(|c| c.to_string().len()))
            .max()
            .unwrap_or(1);

        write!(f, "{:>label_width$}", "")?;
        for label in &self.labels {
            write!(f, " {label:>cell_width$}")?;
        }
        for (label, row) in self.labels.iter().zip(&self.counts) {
            write!(f, "\n{label:>label_width$}")?;
            for count in row {
                write!(f, " {count:>cell_width$}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_axes_are_sorted_union() {
        let matrix = ConfusionMatrix::from_labels(
            &labels(&["Heart", "Brain"]),
            &labels(&["Heart", "Skin"]),
        );
        assert_eq!(matrix.labels, vec!["Brain", "Heart", "Skin"]);
        assert_eq!(matrix.get("Brain", "Skin"), 1);
        assert_eq!(matrix.get("Heart", "Heart"), 1);
        assert_eq!(matrix.get("Skin", "Skin"), 0);
        assert_eq!(matrix.total(), 2);
    }

    #[test]
    fn test_report_values() {
        // Heart: 2 true, both right; Brain: 2 true, one predicted Heart
        let matrix = ConfusionMatrix::from_labels(
            &labels(&["Heart", "Heart", "Brain", "Brain"]),
            &labels(&["Heart", "Heart", "Brain", "Heart"]),
        );
        let report = matrix.report();

        assert!((report.accuracy - 0.75).abs() < 1e-12);
        let brain = &report.classes[0];
        assert_eq!(brain.label, "Brain");
        assert!((brain.precision - 1.0).abs() < 1e-12);
        assert!((brain.recall - 0.5).abs() < 1e-12);
        assert!((brain.f1 - 2.0 / 3.0).abs() < 1e-12);
        let heart = &report.classes[1];
        assert!((heart.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((heart.recall - 1.0).abs() < 1e-12);

        assert!((report.macro_avg.recall - 0.75).abs() < 1e-12);
        assert_eq!(report.weighted_avg.support, 4);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        // Skin is predicted but never true; Brain is true but never predicted
        let matrix = ConfusionMatrix::from_labels(&labels(&["Brain"]), &labels(&["Skin"]));
        let report = matrix.report();
        for class in &report.classes {
            assert_eq!(class.precision, 0.0);
            assert_eq!(class.recall, 0.0);
            assert_eq!(class.f1, 0.0);
        }
        assert_eq!(report.accuracy, 0.0);
    }

    #[test]
    fn test_report_renders_every_label() {
        let matrix = ConfusionMatrix::from_labels(
            &labels(&["Heart", "General"]),
            &labels(&["Heart", "General"]),
        );
        let text = matrix.report().to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("General"));
        assert!(text.contains("weighted avg"));
        assert!(matrix.to_string().lines().count() == 3);
    }
}
