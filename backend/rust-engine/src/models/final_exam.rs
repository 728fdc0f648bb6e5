use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Course, PublicQuestion};

/// One graded run of the non-adaptive final assessment for a course.
/// Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAssessmentAttempt {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub course_id: Uuid,
    pub score: f64,
    pub passed: bool,
    pub attempts_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    InProgress,
    Completed,
}

/// Per (learner, course) completion state. Unique on the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseProgress {
    pub learner_id: Uuid,
    pub course_id: Uuid,
    pub status: ProgressStatus,
    pub score: f64,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CourseProgress {
    pub fn new(learner_id: Uuid, course_id: Uuid) -> Self {
        Self {
            learner_id,
            course_id,
            status: ProgressStatus::InProgress,
            score: 0.0,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalAnswer {
    pub question_id: Uuid,
    pub selected_option: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartFinalResponse {
    pub course: Course,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitFinalResponse {
    pub passed: bool,
    pub score: f64,
    pub message: String,
    pub final_attempt_id: Uuid,
}
