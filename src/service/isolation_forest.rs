//! Isolation forest outlier model.
//!
//! Each tree isolates a random subsample by recursive random axis-aligned splits;
//! samples that end up at shallow depth are anomalous. Scores follow the usual
//! `-2^(-E[h(x)] / c(ψ))` form, and the decision offset is the contamination
//! percentile of the training scores.
//!
//! Trees are grown in parallel, each from its own seed drawn up front from the
//! master seed, so the fitted forest does not depend on thread scheduling.

use crate::config::AnalysisConfig;
use crate::error::ModelError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.05,
            seed: 42,
        }
    }
}

impl From<&AnalysisConfig> for ForestParams {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            n_estimators: cfg.n_estimators.max(1),
            max_samples: cfg.max_samples.max(1),
            contamination: cfg.contamination,
            seed: cfg.seed,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(samples: &[Vec<f64>], mut indices: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = IsolationTree { nodes: Vec::new() };
        tree.grow(samples, &mut indices, 0, max_depth, rng);
        tree
    }

    fn grow(
        &mut self,
        samples: &[Vec<f64>],
        indices: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });
        if depth >= max_depth || indices.len() <= 1 {
            return id;
        }

        // random feature among those that still vary in this node
        let mut features: Vec<usize> = (0..samples[indices[0]].len()).collect();
        features.shuffle(rng);
        for feature in features {
            let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                let x = samples[i][feature];
                (lo.min(x), hi.max(x))
            });
            if hi <= lo {
                continue;
            }

            let threshold = rng.gen_range(lo..hi);
            let split = partition(indices, |i| samples[i][feature] <= threshold);
            let (left_idx, right_idx) = indices.split_at_mut(split);
            let left = self.grow(samples, left_idx, depth + 1, max_depth, rng);
            let right = self.grow(samples, right_idx, depth + 1, max_depth, rng);
            self.nodes[id] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };
            break;
        }
        id
    }

    fn path_length(&self, sample: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Moves matching indices to the front, returns how many matched.
fn partition(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut split = 0;
    for i in 0..indices.len() {
        if pred(indices[i]) {
            indices.swap(split, i);
            split += 1;
        }
    }
    split
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 100].
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn validate(samples: &[Vec<f64>], params: &ForestParams) -> Result<(), ModelError> {
    if !(params.contamination > 0.0 && params.contamination <= 0.5) {
        return Err(ModelError::InvalidContamination(params.contamination));
    }
    let Some(first) = samples.first() else {
        return Err(ModelError::EmptyInput);
    };
    let width = first.len();
    for (i, s) in samples.iter().enumerate() {
        if s.len() != width {
            return Err(ModelError::RaggedInput {
                expected: width,
                found: s.len(),
            });
        }
        if s.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::NonFinite { sample: i });
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    offset: f64,
    params: ForestParams,
}

impl IsolationForest {
    pub fn fit(samples: &[Vec<f64>], params: ForestParams) -> Result<Self, ModelError> {
        validate(samples, &params)?;

        let n = samples.len();
        let sample_size = params.max_samples.min(n);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut master = StdRng::seed_from_u64(params.seed);
        let tree_seeds: Vec<u64> = (0..params.n_estimators).map(|_| master.gen()).collect();

        let trees: Vec<IsolationTree> = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let indices = if sample_size < n {
                    rand::seq::index::sample(&mut rng, n, sample_size).into_vec()
                } else {
                    (0..n).collect()
                };
                IsolationTree::build(samples, indices, max_depth, &mut rng)
            })
            .collect();

        let mut forest = IsolationForest {
            trees,
            sample_size,
            offset: 0.0,
            params,
        };
        let scores = forest.score_samples(samples);
        forest.offset = percentile(&scores, 100.0 * params.contamination);

        tracing::debug!(
            "Isolation forest fitted: {} samples, {} trees, psi={}, offset={:.6}",
            n,
            forest.trees.len(),
            sample_size,
            forest.offset
        );
        Ok(forest)
    }

    /// Opposite of the anomaly score: lower means more anomalous.
    pub fn score_samples(&self, samples: &[Vec<f64>]) -> Vec<f64> {
        let denominator = average_path_length(self.sample_size);
        samples
            .iter()
            .map(|s| {
                let mean_depth = self.trees.iter().map(|t| t.path_length(s)).sum::<f64>()
                    / self.trees.len() as f64;
                let ratio = if denominator > 0.0 {
                    mean_depth / denominator
                } else {
                    1.0
                };
                -(2f64.powf(-ratio))
            })
            .collect()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Outlier flags for the given samples: score strictly below the offset.
    /// Samples too small to hold one expected outlier (`floor(contamination · n) == 0`)
    /// get no flags at all.
    pub fn predict(&self, samples: &[Vec<f64>]) -> Vec<bool> {
        let expected = (self.params.contamination * samples.len() as f64).floor() as usize;
        if expected == 0 {
            return vec![false; samples.len()];
        }
        self.score_samples(samples)
            .into_iter()
            .map(|score| score < self.offset)
            .collect()
    }

    pub fn fit_predict(samples: &[Vec<f64>], params: ForestParams) -> Result<Vec<bool>, ModelError> {
        let forest = Self::fit(samples, params)?;
        Ok(forest.predict(samples))
    }
}
