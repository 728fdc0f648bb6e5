//! Non-adaptive final assessment for a recommended course: a fixed random
//! question set at the course difficulty, graded in one submission.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CourseProgress, FinalAnswer, FinalAssessmentAttempt, ProgressStatus, Question,
    StartFinalResponse, SubmitFinalResponse,
};
use crate::scoring::{normalize_option, round2};
use crate::store::{CatalogStore, ProgressStore};
use crate::utils::selection::sample_up_to;

const PASS_THRESHOLD: f64 = 60.0;

pub struct FinalAssessmentService {
    config: Config,
    catalog: Arc<dyn CatalogStore>,
    progress: Arc<dyn ProgressStore>,
}

impl FinalAssessmentService {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogStore>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        Self {
            config,
            catalog,
            progress,
        }
    }

    /// Draws the question set: course difficulty first, topped up from the
    /// rest of the topic when short.
    pub async fn start_final(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> EngineResult<StartFinalResponse> {
        let course = self
            .catalog
            .course(course_id)
            .await?
            .ok_or_else(|| EngineError::not_found("course", course_id))?;

        let pool = self.catalog.questions_by_topic(&course.topic).await?;
        let (at_level, others): (Vec<Question>, Vec<Question>) = pool
            .into_iter()
            .partition(|q| q.difficulty == course.difficulty);

        let mut rng = rand::rng();
        let mut questions = sample_up_to(&at_level, self.config.final_questions, &mut rng);
        if questions.len() < self.config.final_questions {
            let fill = self.config.final_questions - questions.len();
            questions.extend(sample_up_to(&others, fill, &mut rng));
        }
        if questions.is_empty() {
            return Err(EngineError::validation(
                "No questions available for this course topic.",
            ));
        }

        match self.progress.progress(learner_id, course_id).await? {
            Some(existing) if existing.status == ProgressStatus::Completed => {}
            Some(existing) => self.progress.upsert_progress(&existing).await?,
            None => {
                self.progress
                    .upsert_progress(&CourseProgress::new(learner_id, course_id))
                    .await?
            }
        }

        Ok(StartFinalResponse {
            questions: questions.iter().map(Question::public).collect(),
            course,
        })
    }

    pub async fn submit_final(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        answers: &[FinalAnswer],
    ) -> EngineResult<SubmitFinalResponse> {
        let course = self
            .catalog
            .course(course_id)
            .await?
            .ok_or_else(|| EngineError::not_found("course", course_id))?;

        if answers.is_empty() {
            return Err(EngineError::validation("Answers are required."));
        }
        let unique_ids: HashSet<Uuid> = answers.iter().map(|a| a.question_id).collect();
        if unique_ids.len() != answers.len() {
            return Err(EngineError::validation(
                "Duplicate question IDs are not allowed.",
            ));
        }

        let mut correct_count = 0u32;
        for answer in answers {
            let question = self
                .catalog
                .question(answer.question_id)
                .await?
                .filter(|q| q.topic.eq_ignore_ascii_case(&course.topic))
                .ok_or_else(|| {
                    EngineError::validation(
                        "One or more submitted questions are invalid for this course.",
                    )
                })?;
            if normalize_option(&answer.selected_option) == Some(question.correct_option) {
                correct_count += 1;
            }
        }

        let score = round2(correct_count as f64 / answers.len() as f64 * 100.0);
        let passed = score >= PASS_THRESHOLD;

        let previous = self
            .progress
            .final_attempt_count(learner_id, course_id)
            .await?;
        let final_attempt = FinalAssessmentAttempt {
            id: Uuid::new_v4(),
            learner_id,
            course_id,
            score,
            passed,
            attempts_count: previous + 1,
            created_at: Utc::now(),
        };
        self.progress.insert_final_attempt(&final_attempt).await?;

        let mut progress = self
            .progress
            .progress(learner_id, course_id)
            .await?
            .unwrap_or_else(|| CourseProgress::new(learner_id, course_id));
        progress.score = score;
        if passed {
            progress.status = ProgressStatus::Completed;
            progress.completed_at = Some(Utc::now());
        } else {
            progress.status = ProgressStatus::InProgress;
        }
        self.progress.upsert_progress(&progress).await?;

        tracing::info!(
            learner = %learner_id,
            course = %course_id,
            score,
            passed,
            "final assessment graded"
        );

        let message = if passed {
            "Assessment passed. You can now provide feedback.".to_string()
        } else {
            "Try again. You did not meet the pass threshold.".to_string()
        };
        Ok(SubmitFinalResponse {
            passed,
            score,
            message,
            final_attempt_id: final_attempt.id,
        })
    }
}
