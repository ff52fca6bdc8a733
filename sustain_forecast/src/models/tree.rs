//! Regression trees fitted to gradient statistics
//!
//! A tree is grown best-first: the open leaf with the largest split gain is
//! split next, until the leaf budget is spent or no split improves the
//! objective. With no leaf budget this yields the same tree as plain
//! depth-limited growth.
//!
//! Leaves hold `-G / (H + lambda)`, where `G` and `H` are the sums of
//! gradients and hessians of the rows that reach them. With squared error,
//! `grad = prediction - target` and `hess = 1`. Passing `grad = -target`
//! with `lambda = 0` makes every leaf the mean target of its rows.

use super::FeatureRow;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Maximum depth, `None` for unlimited
    pub max_depth: Option<usize>,
    /// Maximum number of leaves, `None` for unlimited
    pub max_leaves: Option<usize>,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
    /// Minimum hessian sum on each side of a split
    pub min_child_weight: f64,
    /// L2 regularization on leaf values
    pub lambda: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_leaves: None,
            min_samples_leaf: 1,
            min_child_weight: 0.0,
            lambda: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct OpenLeaf {
    node: usize,
    depth: usize,
    sample: Vec<usize>,
    split: SplitCandidate,
}

/// Gradient statistics shared by every node of one tree
struct Stats<'a> {
    rows: &'a [FeatureRow],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a TreeParams,
}

impl Stats<'_> {
    fn sums(&self, sample: &[usize]) -> (f64, f64) {
        sample
            .iter()
            .fold((0.0, 0.0), |(g, h), &i| (g + self.grad[i], h + self.hess[i]))
    }

    fn objective(&self, g: f64, h: f64) -> f64 {
        let denom = h + self.params.lambda;
        if denom <= 0.0 {
            0.0
        } else {
            g * g / denom
        }
    }

    fn leaf_value(&self, sample: &[usize]) -> f64 {
        let (g, h) = self.sums(sample);
        let denom = h + self.params.lambda;
        if denom <= 0.0 {
            0.0
        } else {
            -g / denom
        }
    }

    fn best_split(&self, sample: &[usize]) -> Option<SplitCandidate> {
        let n = sample.len();
        if n < 2 * self.params.min_samples_leaf.max(1) {
            return None;
        }

        let (g_total, h_total) = self.sums(sample);
        let parent = self.objective(g_total, h_total);
        let mut best: Option<SplitCandidate> = None;
        let mut order = sample.to_vec();

        for feature in 0..super::FEATURE_COUNT {
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut g_left = 0.0;
            let mut h_left = 0.0;
            for pos in 0..n - 1 {
                let i = order[pos];
                g_left += self.grad[i];
                h_left += self.hess[i];

                let here = self.rows[i][feature];
                let next = self.rows[order[pos + 1]][feature];
                if here >= next {
                    continue;
                }

                let n_left = pos + 1;
                if n_left < self.params.min_samples_leaf || n - n_left < self.params.min_samples_leaf {
                    continue;
                }
                let h_right = h_total - h_left;
                if h_left < self.params.min_child_weight || h_right < self.params.min_child_weight {
                    continue;
                }

                let gain = self.objective(g_left, h_left)
                    + self.objective(g_total - g_left, h_right)
                    - parent;
                if !gain.is_finite() || gain <= 1e-12 {
                    continue;
                }
                if best.map_or(true, |b| gain > b.gain) {
                    let mid = here + (next - here) / 2.0;
                    let threshold = if mid < next { mid } else { here };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree over `sample` (row indices, repeats allowed).
    pub fn fit(
        rows: &[FeatureRow],
        grad: &[f64],
        hess: &[f64],
        sample: &[usize],
        params: &TreeParams,
    ) -> Self {
        let stats = Stats {
            rows,
            grad,
            hess,
            params,
        };

        let mut nodes = vec![Node::Leaf {
            value: stats.leaf_value(sample),
        }];
        let mut leaves = 1usize;
        let mut open: Vec<OpenLeaf> = Vec::new();

        let depth_allows = |depth: usize| params.max_depth.map_or(true, |max| depth < max);

        if depth_allows(0) {
            if let Some(split) = stats.best_split(sample) {
                open.push(OpenLeaf {
                    node: 0,
                    depth: 0,
                    sample: sample.to_vec(),
                    split,
                });
            }
        }

        while params.max_leaves.map_or(true, |max| leaves < max) {
            // Largest gain first; earliest candidate wins ties.
            let Some(pick) = open
                .iter()
                .enumerate()
                .fold(None::<(usize, f64)>, |acc, (i, leaf)| match acc {
                    Some((_, gain)) if gain >= leaf.split.gain => acc,
                    _ => Some((i, leaf.split.gain)),
                })
                .map(|(i, _)| i)
            else {
                break;
            };
            let leaf = open.remove(pick);

            let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = leaf
                .sample
                .iter()
                .copied()
                .partition(|&i| rows[i][leaf.split.feature] <= leaf.split.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf {
                value: stats.leaf_value(&left_sample),
            });
            let right = nodes.len();
            nodes.push(Node::Leaf {
                value: stats.leaf_value(&right_sample),
            });
            nodes[leaf.node] = Node::Split {
                feature: leaf.split.feature,
                threshold: leaf.split.threshold,
                left,
                right,
            };
            leaves += 1;

            let depth = leaf.depth + 1;
            if depth_allows(depth) {
                for (node, child) in [(left, left_sample), (right, right_sample)] {
                    if let Some(split) = stats.best_split(&child) {
                        open.push(OpenLeaf {
                            node,
                            depth,
                            sample: child,
                            split,
                        });
                    }
                }
            }
        }

        Self { nodes }
    }

    /// Predict a single row
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<FeatureRow>, Vec<f64>) {
        let rows: Vec<FeatureRow> = (0..20).map(|i| [i as f64, 0.0, 0.0, 0.0]).collect();
        let target: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        (rows, target)
    }

    fn mean_stats(target: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (target.iter().map(|y| -y).collect(), vec![1.0; target.len()])
    }

    #[test]
    fn test_tree_learns_step() {
        let (rows, target) = step_data();
        let (grad, hess) = mean_stats(&target);
        let sample: Vec<usize> = (0..rows.len()).collect();
        let tree = RegressionTree::fit(&rows, &grad, &hess, &sample, &TreeParams::default());

        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict(&[3.0, 0.0, 0.0, 0.0]), 1.0);
        assert_eq!(tree.predict(&[15.0, 0.0, 0.0, 0.0]), 5.0);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let rows: Vec<FeatureRow> = (0..10).map(|i| [i as f64, 1.0, 2.0, 3.0]).collect();
        let target = vec![7.0; 10];
        let (grad, hess) = mean_stats(&target);
        let sample: Vec<usize> = (0..rows.len()).collect();
        let tree = RegressionTree::fit(&rows, &grad, &hess, &sample, &TreeParams::default());

        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&[100.0, 0.0, 0.0, 0.0]), 7.0);
    }

    #[test]
    fn test_leaf_budget_and_depth_limits() {
        let rows: Vec<FeatureRow> = (0..64).map(|i| [i as f64, 0.0, 0.0, 0.0]).collect();
        let target: Vec<f64> = (0..64).map(|i| (i * i) as f64).collect();
        let (grad, hess) = mean_stats(&target);
        let sample: Vec<usize> = (0..rows.len()).collect();

        let leafy = TreeParams {
            max_leaves: Some(5),
            ..TreeParams::default()
        };
        assert_eq!(RegressionTree::fit(&rows, &grad, &hess, &sample, &leafy).leaf_count(), 5);

        let shallow = TreeParams {
            max_depth: Some(2),
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&rows, &grad, &hess, &sample, &shallow);
        assert!(tree.depth() <= 2);
        assert_eq!(tree.leaf_count(), 4);
    }

    #[test]
    fn test_min_samples_leaf_blocks_small_splits() {
        let (rows, target) = step_data();
        let (grad, hess) = mean_stats(&target);
        let sample: Vec<usize> = (0..rows.len()).collect();
        let params = TreeParams {
            min_samples_leaf: 11,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&rows, &grad, &hess, &sample, &params);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&[0.0; 4]), 3.0);
    }

    #[test]
    fn test_lambda_shrinks_leaves() {
        let rows: Vec<FeatureRow> = vec![[0.0; 4]; 4];
        let grad = vec![-2.0; 4];
        let hess = vec![1.0; 4];
        let params = TreeParams {
            lambda: 4.0,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&rows, &grad, &hess, &[0, 1, 2, 3], &params);
        assert_eq!(tree.predict(&[0.0; 4]), 1.0);
    }
}
