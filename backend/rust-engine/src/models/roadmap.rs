use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SkillLevel;

/// Generated study plan for one (learner, course) pair.
///
/// Roadmaps are append-only and content-addressed: `signature` is a sha256
/// digest over the generation inputs, and a request carrying an identical
/// signature returns the stored roadmap instead of creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub course_id: Uuid,
    pub level: SkillLevel,
    pub score: f64,
    /// Sorted, comma-joined interest tags the plan was generated for.
    pub interests_snapshot: String,
    pub signature: String,
    pub generated_by: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<RoadmapStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub step_no: u32,
    pub title: String,
    pub description: String,
    pub est_time_hours: f64,
    pub outcome: String,
    pub resource_title: String,
    pub resource_url: String,
}
