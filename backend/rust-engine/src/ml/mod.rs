//! Pretrained model inference for the primary recommendation path.
//!
//! Artifacts are loaded once at process startup and held as read-only shared
//! state behind an `Arc`; a load failure means the service is absent and
//! every request takes the heuristic fallback.

pub mod artifacts;

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::models::SkillLevel;
pub use artifacts::{
    DecisionTree, Encoders, Forest, HistoryRecord, ModelArtifacts, Scaler, TreeNode, FEATURE_COUNT,
};

pub struct ModelService {
    artifacts: ModelArtifacts,
}

impl ModelService {
    pub fn load(dir: &Path) -> Result<Self> {
        let artifacts = ModelArtifacts::load(dir)
            .with_context(|| format!("loading model artifacts from {}", dir.display()))?;
        tracing::info!(
            trees = artifacts.forest.trees.len(),
            history_rows = artifacts.history.len(),
            "model artifacts loaded"
        );
        Ok(Self { artifacts })
    }

    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        Self { artifacts }
    }

    /// Encoded topic value; unknown topics map to the first encoder class.
    fn topic_code(&self, topic: &str) -> f64 {
        self.artifacts
            .encoders
            .topics
            .iter()
            .position(|t| t == topic)
            .unwrap_or(0) as f64
    }

    /// Builds and standardizes the feature vector
    /// `[avg_score, avg_time, consistency, composite, topic_code]`.
    pub fn scaled_features(
        &self,
        avg_score: f64,
        avg_time: f64,
        consistency: f64,
        composite: f64,
        topic: &str,
    ) -> Vec<f64> {
        let raw = [
            avg_score,
            avg_time,
            consistency,
            composite,
            self.topic_code(topic),
        ];
        self.artifacts.scaler.transform(&raw)
    }

    /// Runs both classifiers; agreement wins, disagreement resolves to the
    /// higher-capacity ensemble. This tie-break is a product decision, not a
    /// bug to be improved with confidence weighting.
    pub fn predict_level(&self, scaled: &[f64]) -> Result<SkillLevel> {
        let forest_class = self.artifacts.forest.predict(scaled)?;
        let tree_class = self.artifacts.tree.predict(scaled)?;
        if forest_class != tree_class {
            tracing::debug!(forest_class, tree_class, "classifiers disagree, ensemble wins");
        }
        let class = forest_class;
        let label = self
            .artifacts
            .encoders
            .skills
            .get(class)
            .with_context(|| format!("predicted class {} has no skill label", class))?;
        SkillLevel::parse_label(label)
            .with_context(|| format!("unknown skill label in encoder: {}", label))
    }

    /// The `k` nearest historical learner profiles by Euclidean distance in
    /// the standardized feature space.
    pub fn neighbors(&self, scaled: &[f64], k: usize) -> Result<Vec<&HistoryRecord>> {
        if self.artifacts.history.is_empty() {
            bail!("neighbor index is empty");
        }
        let mut ranked: Vec<(f64, usize)> = self
            .artifacts
            .history
            .iter()
            .enumerate()
            .map(|(i, record)| (euclidean(scaled, &record.features), i))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Ok(ranked
            .into_iter()
            .take(k.min(self.artifacts.history.len()))
            .map(|(_, i)| &self.artifacts.history[i])
            .collect())
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
