use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ForestModel – pre-trained ensemble regressor artifact
// ---------------------------------------------------------------------------

/// A fitted forest regressor, deserialized from JSON. Training happens
/// elsewhere; this crate only evaluates the artifact.
///
/// The artifact carries its own per-feature importance weights so the
/// viewer never has to reconstruct them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    /// Feature column names, in the order `predict` expects its inputs.
    pub feature_names: Vec<String>,
    /// Per-feature importance weights, aligned with `feature_names`.
    pub importances: Vec<f64>,
    /// The averaged regression trees.
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    /// Nodes in preorder; index 0 is the root.
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    /// Walk the tree for one feature row. Rows shorter than the split
    /// feature index fall to the left branch (treated as -inf), so a
    /// malformed row still yields a finite value.
    fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0usize;
        // A well-formed tree terminates in at most nodes.len() steps;
        // the bound guards against cyclic indices in a corrupt artifact.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).copied().unwrap_or(f64::NEG_INFINITY);
                    idx = if x <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
        0.0
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("tree has no nodes");
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                threshold,
            } = node
            {
                if *feature >= n_features {
                    bail!("node {i}: split feature {feature} out of range (n_features = {n_features})");
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    bail!("node {i}: child index out of range");
                }
                // Children must point forward, which also rules out cycles.
                if *left <= i || *right <= i {
                    bail!("node {i}: child index does not point forward");
                }
                if !threshold.is_finite() {
                    bail!("node {i}: non-finite split threshold");
                }
            }
        }
        Ok(())
    }
}

impl ForestModel {
    /// Deserialize and validate an artifact from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).context("opening model artifact")?;
        let model: ForestModel =
            serde_json::from_reader(std::io::BufReader::new(file)).context("parsing model JSON")?;
        model.validate()?;
        Ok(model)
    }

    /// Structural checks run once after deserialization so `predict` can
    /// assume a well-formed ensemble.
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            bail!("model has no trees");
        }
        if self.importances.len() != self.feature_names.len() {
            bail!(
                "importance vector has {} entries for {} features",
                self.importances.len(),
                self.feature_names.len()
            );
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len())
                .with_context(|| format!("tree {t}"))?;
        }
        Ok(())
    }

    /// Prediction for one feature row: mean over the ensemble.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    /// One prediction per input row, order-preserving.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }

    /// (feature name, importance) pairs sorted by descending weight.
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}
