use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Fitted regressor mapping one scaled row to one score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl RegressionModel {
    pub fn n_features(&self) -> usize {
        match self {
            RegressionModel::Linear(m) => m.coef.len(),
            RegressionModel::TreeEnsemble(m) => m.n_features,
        }
    }

    pub fn declared_feature_names(&self) -> Option<&[String]> {
        let names = match self {
            RegressionModel::Linear(m) => m.feature_names.as_deref(),
            RegressionModel::TreeEnsemble(m) => m.feature_names.as_deref(),
        };
        names.filter(|n| !n.is_empty())
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            RegressionModel::Linear(_) => "linear",
            RegressionModel::TreeEnsemble(_) => "tree_ensemble",
        }
    }

    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features() {
            return Err(RiskError::schema_mismatch(format!(
                "model expects {} columns, row has {}",
                self.n_features(),
                row.len()
            )));
        }
        Ok(match self {
            RegressionModel::Linear(m) => m.predict_row(row),
            RegressionModel::TreeEnsemble(m) => m.predict_row(row),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coef: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LinearModel {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coef
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Averaged trees, e.g. a random forest.
    #[default]
    Mean,
    /// Summed trees, e.g. gradient boosting with learning rate folded in.
    Sum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeEnsembleArtifact {
    trees: Vec<RegressionTree>,
    #[serde(default)]
    aggregation: Aggregation,
    #[serde(default)]
    base_score: f64,
    n_features: usize,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TreeEnsembleArtifact", into = "TreeEnsembleArtifact")]
pub struct TreeEnsemble {
    trees: Vec<RegressionTree>,
    aggregation: Aggregation,
    base_score: f64,
    n_features: usize,
    feature_names: Option<Vec<String>>,
}

impl TryFrom<TreeEnsembleArtifact> for TreeEnsemble {
    type Error = String;

    fn try_from(raw: TreeEnsembleArtifact) -> std::result::Result<Self, Self::Error> {
        if raw.trees.is_empty() {
            return Err("tree ensemble has no trees".to_string());
        }
        for (idx, tree) in raw.trees.iter().enumerate() {
            if let Some(f) = tree.max_feature()
                && f >= raw.n_features
            {
                return Err(format!(
                    "tree {idx} splits on feature {f} but the ensemble has {} features",
                    raw.n_features
                ));
            }
        }
        if let Some(names) = &raw.feature_names
            && !names.is_empty()
            && names.len() != raw.n_features
        {
            return Err(format!(
                "ensemble declares {} feature names for {} features",
                names.len(),
                raw.n_features
            ));
        }
        Ok(Self {
            trees: raw.trees,
            aggregation: raw.aggregation,
            base_score: raw.base_score,
            n_features: raw.n_features,
            feature_names: raw.feature_names,
        })
    }
}

impl From<TreeEnsemble> for TreeEnsembleArtifact {
    fn from(m: TreeEnsemble) -> Self {
        Self {
            trees: m.trees,
            aggregation: m.aggregation,
            base_score: m.base_score,
            n_features: m.n_features,
            feature_names: m.feature_names,
        }
    }
}

impl TreeEnsemble {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        let agg = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };
        self.base_score + agg
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

const LEAF: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegressionTreeArtifact {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

/// Flat-array binary tree. Node 0 is the root; `children_left[i] == -1`
/// marks a leaf. Children always have a larger index than their parent, so
/// traversal terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegressionTreeArtifact", into = "RegressionTreeArtifact")]
pub struct RegressionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl TryFrom<RegressionTreeArtifact> for RegressionTree {
    type Error = String;

    fn try_from(raw: RegressionTreeArtifact) -> std::result::Result<Self, Self::Error> {
        let n = raw.value.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if raw.children_left.len() != n
            || raw.children_right.len() != n
            || raw.feature.len() != n
            || raw.threshold.len() != n
        {
            return Err(format!("tree arrays disagree on node count (value has {n})"));
        }
        for node in 0..n {
            let left = raw.children_left[node];
            let right = raw.children_right[node];
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {node} has a right child but no left child"));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has out-of-order child {child}"));
                }
            }
            if raw.feature[node] < 0 {
                return Err(format!("split node {node} has no feature"));
            }
        }
        Ok(Self {
            children_left: raw.children_left,
            children_right: raw.children_right,
            feature: raw.feature,
            threshold: raw.threshold,
            value: raw.value,
        })
    }
}

impl From<RegressionTree> for RegressionTreeArtifact {
    fn from(t: RegressionTree) -> Self {
        Self {
            children_left: t.children_left,
            children_right: t.children_right,
            feature: t.feature,
            threshold: t.threshold,
            value: t.value,
        }
    }
}

impl RegressionTree {
    fn max_feature(&self) -> Option<usize> {
        self.children_left
            .iter()
            .zip(&self.feature)
            .filter(|(left, _)| **left != LEAF)
            .map(|(_, f)| *f as usize)
            .max()
    }

    /// Goes left when `row[feature] <= threshold`.
    fn predict(&self, row: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let f = self.feature[node] as usize;
            node = if row[f] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}
