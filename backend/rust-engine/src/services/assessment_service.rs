//! Lifecycle of one adaptive quiz attempt: STARTED -> IN_PROGRESS ->
//! FINISHED. Finalization computes the composite score, resolves the
//! recommendation, writes the level back onto the learner, and appends the
//! immutable recommendation snapshot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AssessmentAnswer, AssessmentAttempt, AttemptResult, Difficulty, Progress, QuizTelemetry,
    RecommendationRecord, RecommendedCourse, SkillLevel, StartAttemptResponse,
    SubmitAnswerOutcome,
};
use crate::scoring::{composite_score, normalize_option};
use crate::services::recommendation_service::RecommendationService;
use crate::store::{AttemptStore, CatalogStore, ProfileStore, RecommendationStore};
use crate::utils::selection::pick_random;

/// Serializes answer and finalize operations per attempt so the duplicate
/// check and the finished check stay at-most-once under concurrency.
#[derive(Default)]
pub struct AttemptLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AttemptLocks {
    pub async fn acquire(&self, attempt_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(attempt_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Evicts a finished attempt's entry so the map does not grow for the
    /// process lifetime. Waiters already queued hold their own `Arc` clone
    /// and drain against the finished-attempt check.
    pub async fn release(&self, attempt_id: Uuid) {
        self.inner.lock().await.remove(&attempt_id);
    }
}

pub struct AssessmentService {
    config: Config,
    catalog: Arc<dyn CatalogStore>,
    profiles: Arc<dyn ProfileStore>,
    attempts: Arc<dyn AttemptStore>,
    recommendations: Arc<dyn RecommendationStore>,
    recommender: RecommendationService,
    locks: Arc<AttemptLocks>,
}

impl AssessmentService {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogStore>,
        profiles: Arc<dyn ProfileStore>,
        attempts: Arc<dyn AttemptStore>,
        recommendations: Arc<dyn RecommendationStore>,
        recommender: RecommendationService,
        locks: Arc<AttemptLocks>,
    ) -> Self {
        Self {
            config,
            catalog,
            profiles,
            attempts,
            recommendations,
            recommender,
            locks,
        }
    }

    /// Opens an attempt for the course's topic with one random easy question
    /// outstanding.
    pub async fn start_attempt(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> EngineResult<StartAttemptResponse> {
        let profile = self
            .profiles
            .profile(learner_id)
            .await?
            .ok_or_else(|| EngineError::not_found("learner", learner_id))?;
        let course = self
            .catalog
            .course(course_id)
            .await?
            .ok_or_else(|| EngineError::not_found("course", course_id))?;

        let pool: Vec<_> = self
            .catalog
            .questions_by_topic(&course.topic)
            .await?
            .into_iter()
            .filter(|q| q.difficulty == Difficulty::Easy)
            .collect();
        let question = pick_random(&pool, &mut rand::rng())
            .ok_or_else(|| EngineError::not_found("questions for topic", &course.topic))?
            .clone();

        let attempt = AssessmentAttempt {
            id: Uuid::new_v4(),
            learner_id,
            topic: course.topic.clone(),
            course_id: Some(course_id),
            started_at: Utc::now(),
            finished_at: None,
            current_difficulty: Difficulty::Easy,
            total_questions: self.config.total_questions,
            correct_count: 0,
            total_time: 0.0,
            score: 0.0,
            predicted_level: profile.current_level,
            level_at_start: profile.current_level,
        };
        self.attempts.insert_attempt(&attempt).await?;

        tracing::info!(
            attempt = %attempt.id,
            learner = %learner_id,
            topic = %attempt.topic,
            "assessment attempt started"
        );

        Ok(StartAttemptResponse {
            attempt_id: attempt.id,
            question: question.public(),
            progress: Progress {
                index: 1,
                total: attempt.total_questions,
            },
            current_level: profile.current_level,
        })
    }

    /// Records one answer and either hands out the next question or
    /// finalizes the attempt.
    pub async fn submit_answer(
        &self,
        attempt_id: Uuid,
        question_id: Uuid,
        selected_option: &str,
        time_spent: f64,
    ) -> EngineResult<SubmitAnswerOutcome> {
        let _guard = self.locks.acquire(attempt_id).await;

        let mut attempt = self
            .attempts
            .attempt(attempt_id)
            .await?
            .ok_or_else(|| EngineError::not_found("attempt", attempt_id))?;
        if attempt.is_finished() {
            self.locks.release(attempt_id).await;
            return Err(EngineError::validation("Attempt has already finished."));
        }

        let question = self
            .catalog
            .question(question_id)
            .await?
            .ok_or_else(|| EngineError::not_found("question", question_id))?;
        if !question.topic.eq_ignore_ascii_case(&attempt.topic) {
            return Err(EngineError::validation("Question topic mismatch."));
        }

        let selected = normalize_option(selected_option)
            .ok_or_else(|| EngineError::validation("Invalid selected option."))?;

        let prior = self.attempts.answers(attempt_id).await?;
        if prior.iter().any(|a| a.question_id == question_id) {
            return Err(EngineError::validation(
                "Question already answered in this attempt.",
            ));
        }

        let is_correct = selected == question.correct_option;
        let answer = AssessmentAnswer {
            id: Uuid::new_v4(),
            attempt_id,
            question_id,
            selected_option: selected,
            is_correct,
            time_spent,
            submitted_at: Utc::now(),
        };
        self.attempts.insert_answer(&answer).await?;

        if is_correct {
            attempt.correct_count += 1;
        }
        attempt.total_time += time_spent;
        attempt.current_difficulty = attempt.current_difficulty.adjust(is_correct);

        let mut correctness: Vec<bool> = prior.iter().map(|a| a.is_correct).collect();
        correctness.push(is_correct);
        let answered = correctness.len() as u32;

        if answered >= attempt.total_questions {
            let (score, level, courses) = self.finalize(&mut attempt, &correctness).await?;
            self.locks.release(attempt_id).await;
            return Ok(SubmitAnswerOutcome::Finished {
                score,
                level,
                recommended_courses: courses,
            });
        }

        self.attempts.update_attempt(&attempt).await?;

        // Next question at the new difficulty; any unanswered same-topic
        // question when that pool is spent.
        let topic_pool = self.catalog.questions_by_topic(&attempt.topic).await?;
        let answered_ids: HashSet<Uuid> = prior
            .iter()
            .map(|a| a.question_id)
            .chain(std::iter::once(question_id))
            .collect();
        let unanswered: Vec<_> = topic_pool
            .iter()
            .filter(|q| !answered_ids.contains(&q.id))
            .collect();
        let at_difficulty: Vec<_> = unanswered
            .iter()
            .copied()
            .filter(|q| q.difficulty == attempt.current_difficulty)
            .collect();

        let mut rng = rand::rng();
        let next = pick_random(&at_difficulty, &mut rng)
            .copied()
            .or_else(|| pick_random(&unanswered, &mut rng).copied());

        match next {
            Some(next_question) => Ok(SubmitAnswerOutcome::Next {
                is_correct,
                new_difficulty: attempt.current_difficulty,
                next_question: next_question.public(),
                progress: Progress {
                    index: answered + 1,
                    total: attempt.total_questions,
                },
            }),
            None => {
                // Question bank exhausted: defined early termination, the
                // target shrinks to what was actually answered.
                tracing::info!(
                    attempt = %attempt_id,
                    answered,
                    "question bank exhausted, finalizing attempt early"
                );
                attempt.total_questions = answered;
                let (score, level, courses) = self.finalize(&mut attempt, &correctness).await?;
                self.locks.release(attempt_id).await;
                Ok(SubmitAnswerOutcome::Finished {
                    score,
                    level,
                    recommended_courses: courses,
                })
            }
        }
    }

    pub async fn get_result(&self, attempt_id: Uuid) -> EngineResult<AttemptResult> {
        let attempt = self
            .attempts
            .attempt(attempt_id)
            .await?
            .ok_or_else(|| EngineError::not_found("attempt", attempt_id))?;
        let recommended_courses = self
            .recommendations
            .latest_for_attempt(attempt_id)
            .await?
            .map(|record| record.courses)
            .unwrap_or_default();
        Ok(AttemptResult {
            score: attempt.score,
            level: attempt.predicted_level,
            recommended_courses,
        })
    }

    async fn finalize(
        &self,
        attempt: &mut AssessmentAttempt,
        correctness: &[bool],
    ) -> EngineResult<(f64, SkillLevel, Vec<RecommendedCourse>)> {
        attempt.finished_at = Some(Utc::now());
        attempt.score = composite_score(
            attempt.correct_count,
            attempt.total_questions,
            attempt.total_time,
            correctness,
            self.config.target_time_per_question,
        );

        let telemetry = QuizTelemetry {
            topic: attempt.topic.clone(),
            correct_count: attempt.correct_count,
            total_questions: attempt.total_questions,
            total_time: attempt.total_time,
            correctness: correctness.to_vec(),
        };
        let recommendation = self.recommender.resolve(&telemetry, self.config.top_k).await?;
        let (level, courses, degraded) = recommendation.into_parts();

        attempt.predicted_level = level;
        self.attempts.update_attempt(attempt).await?;
        self.profiles.set_level(attempt.learner_id, level).await?;

        let record = RecommendationRecord {
            id: Uuid::new_v4(),
            attempt_id: attempt.id,
            courses: courses.clone(),
            degraded,
            created_at: Utc::now(),
        };
        self.recommendations.insert_record(&record).await?;

        tracing::info!(
            attempt = %attempt.id,
            score = attempt.score,
            level = %level,
            degraded,
            "assessment attempt finalized"
        );

        Ok((attempt.score, level, courses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn attempt_locks_evict_on_release() {
        let locks = AttemptLocks::default();
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        assert_eq!(locks.inner.lock().await.len(), 1);
        drop(guard);

        locks.release(id).await;
        assert_eq!(locks.inner.lock().await.len(), 0);

        // A later acquire recreates the entry from scratch.
        let _guard = locks.acquire(id).await;
        assert_eq!(locks.inner.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn release_of_unknown_attempt_is_a_no_op() {
        let locks = AttemptLocks::default();
        locks.release(Uuid::new_v4()).await;
        assert!(locks.inner.lock().await.is_empty());
    }
}
