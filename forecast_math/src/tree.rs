//! Least-squares regression trees
//!
//! Trees are stored as a flat node vector so a fitted tree serializes as a
//! plain list and prediction is a loop over indices.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// A single node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Terminal node carrying the prediction
    Leaf { value: f64 },
    /// Rows with `feature <= threshold` go left, the rest go right
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a regression tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum number of splits from root to leaf
    pub max_depth: usize,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_leaf: 5,
        }
    }
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit a tree to `targets` using the feature rows selected by `rows`
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        rows: &[usize],
        params: TreeParams,
    ) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(MathError::InvalidInput(format!(
                "Feature rows ({}) don't match targets ({})",
                features.len(),
                targets.len()
            )));
        }
        if rows.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a tree without rows".to_string(),
            ));
        }
        if let Some(&bad) = rows.iter().find(|&&r| r >= targets.len()) {
            return Err(MathError::InvalidInput(format!(
                "Row index {} is out of range",
                bad
            )));
        }
        if params.min_samples_leaf == 0 {
            return Err(MathError::InvalidInput(
                "min_samples_leaf must be greater than zero".to_string(),
            ));
        }

        let mut tree = Self { nodes: Vec::new() };
        tree.grow(features, targets, rows.to_vec(), 0, params);
        Ok(tree)
    }

    fn grow(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: TreeParams,
    ) -> usize {
        let index = self.nodes.len();
        let value = rows.iter().map(|&r| targets[r]).sum::<f64>() / rows.len() as f64;
        self.nodes.push(TreeNode::Leaf { value });

        if depth >= params.max_depth || rows.len() < 2 * params.min_samples_leaf {
            return index;
        }

        let Some(split) = best_split(features, targets, &rows, params.min_samples_leaf) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| features[r][split.feature] <= split.threshold);

        let left = self.grow(features, targets, left_rows, depth + 1, params);
        let right = self.grow(features, targets, right_rows, depth + 1, params);

        self.nodes[index] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        index
    }

    /// Predict the target for one feature row
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).copied().unwrap_or(f64::NAN);
                    index = if x <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], index: usize) -> usize {
            match nodes.get(index) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    rows: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let width = features[rows[0]].len();
    let n = rows.len() as f64;
    let total: f64 = rows.iter().map(|&r| targets[r]).sum();
    let baseline = total * total / n;

    let mut best: Option<SplitCandidate> = None;
    let mut order = rows.to_vec();

    for feature in 0..width {
        order.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_sum = 0.0;
        for i in 0..order.len() - 1 {
            left_sum += targets[order[i]];
            let left_count = i + 1;
            let right_count = order.len() - left_count;
            if left_count < min_leaf || right_count < min_leaf {
                continue;
            }

            let here = features[order[i]][feature];
            let next = features[order[i + 1]][feature];
            if next <= here {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / left_count as f64
                + right_sum * right_sum / right_count as f64
                - baseline;

            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (here + next) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}
