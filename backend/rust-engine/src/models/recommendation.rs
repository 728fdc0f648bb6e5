use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Difficulty;

/// Telemetry of one finished quiz attempt, the full input of the
/// recommendation engine.
#[derive(Debug, Clone)]
pub struct QuizTelemetry {
    pub topic: String,
    pub correct_count: u32,
    pub total_questions: u32,
    pub total_time: f64,
    pub correctness: Vec<bool>,
}

/// One ranked course with its human-readable justification. Internal rank
/// scores are stripped before this leaves the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedCourse {
    pub course_id: Uuid,
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub url: String,
    pub why_recommended: String,
}

/// Immutable snapshot of the ranked list produced at attempt finalization.
/// Multiple records may exist for retries of a topic; the latest is
/// authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub courses: Vec<RecommendedCourse>,
    /// True when the heuristic fallback produced the list.
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
}
