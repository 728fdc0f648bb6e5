//! On-disk model artifact schema. Artifacts are JSON documents produced by
//! the offline training pipeline and are read-only after load.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// `[avg_score, avg_time, consistency, composite_score, topic_code]`
pub const FEATURE_COUNT: usize = 5;

/// Per-feature standardization parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    pub fn transform(&self, features: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(x, (mean, std))| {
                if *std > 0.0 {
                    (x - mean) / std
                } else {
                    x - mean
                }
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.mean.len() != FEATURE_COUNT || self.std.len() != FEATURE_COUNT {
            bail!(
                "scaler expects {} features, got mean={} std={}",
                FEATURE_COUNT,
                self.mean.len(),
                self.std.len()
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

/// Flattened decision tree: node 0 is the root, split children are indices
/// into `nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn predict(&self, features: &[f64]) -> Result<usize> {
        let mut index = 0usize;
        // A well-formed tree terminates within nodes.len() hops.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { class }) => return Ok(*class),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features
                        .get(*feature)
                        .copied()
                        .with_context(|| format!("feature index {} out of range", feature))?;
                    index = if value <= *threshold { *left } else { *right };
                }
                None => bail!("tree node index {} out of range", index),
            }
        }
        bail!("tree walk did not terminate; cyclic node links")
    }

    fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("tree has no nodes");
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    bail!("node {} splits on unknown feature {}", i, feature);
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    bail!("node {} links out of range", i);
                }
            }
        }
        Ok(())
    }
}

/// Decision-tree ensemble. Prediction is a majority vote; ties resolve to
/// the lowest class index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forest {
    pub trees: Vec<DecisionTree>,
}

impl Forest {
    pub fn predict(&self, features: &[f64]) -> Result<usize> {
        if self.trees.is_empty() {
            bail!("forest has no trees");
        }
        let mut votes: std::collections::BTreeMap<usize, usize> = Default::default();
        for tree in &self.trees {
            *votes.entry(tree.predict(features)?).or_insert(0) += 1;
        }
        let mut winner = 0usize;
        let mut best = 0usize;
        for (class, count) in votes {
            if count > best {
                best = count;
                winner = class;
            }
        }
        Ok(winner)
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            bail!("forest has no trees");
        }
        for tree in &self.trees {
            tree.validate()?;
        }
        Ok(())
    }
}

/// Label tables for the categorical encodings. Position in the vector is the
/// encoded value; unknown topics fall back to position 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoders {
    pub topics: Vec<String>,
    pub skills: Vec<String>,
}

/// One historical learner profile in the neighbor index. `features` are
/// already standardized, exactly as the index was fitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub features: Vec<f64>,
    pub topic: String,
    pub skill_label: String,
}

#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub scaler: Scaler,
    pub forest: Forest,
    pub tree: DecisionTree,
    pub encoders: Encoders,
    pub history: Vec<HistoryRecord>,
}

impl ModelArtifacts {
    pub fn load(dir: &Path) -> Result<Self> {
        let scaler: Scaler = read_json(dir, "scaler.json")?;
        let forest: Forest = read_json(dir, "random_forest.json")?;
        let tree: DecisionTree = read_json(dir, "decision_tree.json")?;
        let encoders: Encoders = read_json(dir, "encoders.json")?;
        let history: Vec<HistoryRecord> = read_json(dir, "history.json")?;

        let artifacts = Self {
            scaler,
            forest,
            tree,
            encoders,
            history,
        };
        artifacts.validate()?;
        Ok(artifacts)
    }

    fn validate(&self) -> Result<()> {
        self.scaler.validate()?;
        self.forest.validate()?;
        self.tree.validate()?;
        if self.encoders.topics.is_empty() {
            bail!("topic encoder has no classes");
        }
        if self.encoders.skills.is_empty() {
            bail!("skill encoder has no classes");
        }
        for (i, record) in self.history.iter().enumerate() {
            if record.features.len() != FEATURE_COUNT {
                bail!(
                    "history row {} has {} features, expected {}",
                    i,
                    record.features.len(),
                    FEATURE_COUNT
                );
            }
        }
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let path = dir.join(name);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read artifact {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse artifact {}", name))
}
