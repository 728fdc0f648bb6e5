use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Difficulty, PublicQuestion, SkillLevel};
use crate::models::recommendation::RecommendedCourse;

/// One run of the adaptive quiz for a learner on a topic.
///
/// Created at session start, mutated by each accepted answer, immutable once
/// `finished_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentAttempt {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub topic: String,
    pub course_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub current_difficulty: Difficulty,
    /// Target question count; shrinks only on early termination.
    pub total_questions: u32,
    pub correct_count: u32,
    pub total_time: f64,
    pub score: f64,
    pub predicted_level: SkillLevel,
    /// Learner's stored level when the attempt was created.
    pub level_at_start: SkillLevel,
}

impl AssessmentAttempt {
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn status(&self, answered_count: usize) -> AttemptStatus {
        if self.is_finished() {
            AttemptStatus::Finished
        } else if answered_count == 0 {
            AttemptStatus::Started
        } else {
            AttemptStatus::InProgress
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Started,
    InProgress,
    Finished,
}

/// One accepted answer. At most one exists per (attempt, question) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_option: char,
    pub is_correct: bool,
    pub time_spent: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based index of the question currently outstanding.
    pub index: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartAttemptResponse {
    pub attempt_id: Uuid,
    pub question: PublicQuestion,
    pub progress: Progress,
    pub current_level: SkillLevel,
}

/// Result of one answer submission: either the next question or the
/// finalized attempt summary.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitAnswerOutcome {
    Next {
        is_correct: bool,
        new_difficulty: Difficulty,
        next_question: PublicQuestion,
        progress: Progress,
    },
    Finished {
        score: f64,
        level: SkillLevel,
        recommended_courses: Vec<RecommendedCourse>,
    },
}

impl SubmitAnswerOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, SubmitAnswerOutcome::Finished { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptResult {
    pub score: f64,
    pub level: SkillLevel,
    pub recommended_courses: Vec<RecommendedCourse>,
}
