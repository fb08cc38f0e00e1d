//! CART decision trees over binary symptom flags.
//!
//! Every split tests one symptom: rows without it go to the `absent` child,
//! rows with it to the `present` child. Nodes live in a flat vector and
//! children always come after their parent.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::schema::FeatureVector;

/// Splits must reduce weighted Gini impurity by more than this
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// A tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Terminal node holding the class distribution of its training rows
    Leaf {
        /// Probability per class, in model label order
        distribution: Vec<f64>,
    },
    /// Internal node testing one symptom flag
    Split {
        /// Feature index in the model schema
        feature: usize,
        /// Child for rows without the symptom
        absent: usize,
        /// Child for rows with the symptom
        present: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0)
    pub max_depth: usize,
    /// Minimum distinct rows on each side of a split
    pub min_samples_leaf: usize,
    /// Candidate features examined per split
    pub max_features: usize,
}

/// A training row with its bootstrap multiplicity and class weight folded in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedSample {
    /// Row index into the training features
    pub row: usize,
    /// Bootstrap count multiplied by the class weight
    pub weight: f64,
}

/// A fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on weighted samples
    ///
    /// # Arguments
    /// * `features` - All training vectors (indexed by `WeightedSample::row`)
    /// * `targets` - Class index of every training row
    /// * `n_classes` - Number of model labels
    /// * `samples` - Rows drawn for this tree
    /// * `params` - Growth limits
    /// * `rng` - Generator for candidate feature order
    pub fn fit<R>(
        features: &[FeatureVector],
        targets: &[usize],
        n_classes: usize,
        samples: Vec<WeightedSample>,
        params: TreeParams,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let n_features = features.first().map_or(0, FeatureVector::len);
        let mut grower = Grower {
            features,
            targets,
            n_classes,
            params,
            rng,
            nodes: Vec::new(),
            candidates: (0..n_features).collect(),
        };
        grower.grow(samples, 0);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Class distribution of the leaf `features` falls into
    #[must_use]
    pub fn predict_distribution(&self, features: &FeatureVector) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    absent,
                    present,
                } => {
                    idx = if features.is_set(*feature) {
                        *present
                    } else {
                        *absent
                    };
                }
            }
        }
    }

    /// Number of nodes
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split {
                    absent, present, ..
                } => 1 + walk(nodes, *absent).max(walk(nodes, *present)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Check structure after deserialization
    pub(crate) fn validate(&self, n_features: usize, n_classes: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(TriageError::configuration("Model contains an empty tree"));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { distribution } => {
                    if distribution.len() != n_classes
                        || distribution.iter().any(|p| !p.is_finite() || *p < 0.0)
                    {
                        return Err(TriageError::configuration(format!(
                            "Tree leaf {idx} has an invalid class distribution"
                        )));
                    }
                }
                Node::Split {
                    feature,
                    absent,
                    present,
                } => {
                    if *feature >= n_features {
                        return Err(TriageError::configuration(format!(
                            "Tree node {idx} splits on unknown feature {feature}"
                        )));
                    }
                    for child in [absent, present] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(TriageError::configuration(format!(
                                "Tree node {idx} points to invalid child {child}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

struct Grower<'a, R: ?Sized> {
    features: &'a [FeatureVector],
    targets: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
    candidates: Vec<usize>,
}

impl<R> Grower<'_, R>
where
    R: Rng + ?Sized,
{
    fn grow(&mut self, samples: Vec<WeightedSample>, depth: usize) -> usize {
        let totals = self.class_totals(&samples);
        let index = self.nodes.len();

        let splittable = depth < self.params.max_depth
            && samples.len() >= 2 * self.params.min_samples_leaf
            && totals.iter().filter(|&&w| w > 0.0).count() > 1;
        let best = if splittable {
            self.best_split(&samples, &totals)
        } else {
            None
        };

        let Some(feature) = best else {
            self.nodes.push(Node::Leaf {
                distribution: normalize(totals),
            });
            return index;
        };

        // Placeholder until the children have indices
        self.nodes.push(Node::Split {
            feature,
            absent: 0,
            present: 0,
        });
        let (present, absent): (Vec<_>, Vec<_>) = samples
            .into_iter()
            .partition(|s| self.features[s.row].is_set(feature));
        let absent = self.grow(absent, depth + 1);
        let present = self.grow(present, depth + 1);
        self.nodes[index] = Node::Split {
            feature,
            absent,
            present,
        };
        index
    }

    fn class_totals(&self, samples: &[WeightedSample]) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_classes];
        for sample in samples {
            totals[self.targets[sample.row]] += sample.weight;
        }
        totals
    }

    fn best_split(&mut self, samples: &[WeightedSample], totals: &[f64]) -> Option<usize> {
        let total_weight: f64 = totals.iter().sum();
        if total_weight <= 0.0 {
            return None;
        }
        let parent = gini(totals, total_weight);
        let min_leaf = self.params.min_samples_leaf;

        self.candidates.shuffle(&mut *self.rng);

        let mut best: Option<(usize, f64)> = None;
        let mut present = vec![0.0; self.n_classes];
        let mut absent = vec![0.0; self.n_classes];

        for (visited, &feature) in self.candidates.iter().enumerate() {
            // Keep looking past max_features only while nothing usable was found
            if visited >= self.params.max_features && best.is_some() {
                break;
            }

            present.iter_mut().for_each(|w| *w = 0.0);
            let mut present_rows = 0;
            for sample in samples {
                if self.features[sample.row].is_set(feature) {
                    present[self.targets[sample.row]] += sample.weight;
                    present_rows += 1;
                }
            }
            let absent_rows = samples.len() - present_rows;
            if present_rows < min_leaf || absent_rows < min_leaf {
                continue;
            }

            for ((a, t), p) in absent.iter_mut().zip(totals).zip(&present) {
                *a = t - p;
            }
            let present_weight: f64 = present.iter().sum();
            let absent_weight = total_weight - present_weight;

            let child = (present_weight * gini(&present, present_weight)
                + absent_weight * gini(&absent, absent_weight))
                / total_weight;
            let improvement = parent - child;

            if improvement > MIN_IMPURITY_DECREASE
                && best.is_none_or(|(_, current)| improvement > current)
            {
                best = Some((feature, improvement));
            }
        }

        best.map(|(feature, _)| feature)
    }
}

fn gini(weights: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - weights
        .iter()
        .map(|w| {
            let p = w / total;
            p * p
        })
        .sum::<f64>()
}

fn normalize(mut weights: Vec<f64>) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter_mut().for_each(|w| *w /= total);
    } else if !weights.is_empty() {
        let uniform = 1.0 / weights.len() as f64;
        weights.iter_mut().for_each(|w| *w = uniform);
    }
    weights
}
