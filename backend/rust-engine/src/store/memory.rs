//! Tokio-`RwLock` reference implementation of the persistence contracts.
//! Used by the test suite and by embedders that do not bring a database.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AssessmentAnswer, AssessmentAttempt, Course, CourseProgress, FinalAssessmentAttempt,
    LearnerProfile, Question, RecommendationRecord, Roadmap, SkillLevel,
};

use super::{
    AttemptStore, CatalogStore, ProfileStore, ProgressStore, RecommendationStore, RoadmapStore,
};

#[derive(Default)]
pub struct InMemoryStore {
    questions: RwLock<Vec<Question>>,
    courses: RwLock<Vec<Course>>,
    profiles: RwLock<HashMap<Uuid, LearnerProfile>>,
    attempts: RwLock<HashMap<Uuid, AssessmentAttempt>>,
    answers: RwLock<Vec<AssessmentAnswer>>,
    records: RwLock<Vec<RecommendationRecord>>,
    roadmaps: RwLock<Vec<Roadmap>>,
    final_attempts: RwLock<Vec<FinalAssessmentAttempt>>,
    progress: RwLock<HashMap<(Uuid, Uuid), CourseProgress>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_question(&self, question: Question) {
        self.questions.write().await.push(question);
    }

    pub async fn seed_course(&self, course: Course) {
        self.courses.write().await.push(course);
    }

    pub async fn seed_profile(&self, profile: LearnerProfile) {
        self.profiles.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn question(&self, id: Uuid) -> EngineResult<Option<Question>> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .find(|q| q.id == id)
            .cloned())
    }

    async fn questions_by_topic(&self, topic: &str) -> EngineResult<Vec<Question>> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| q.topic.eq_ignore_ascii_case(topic))
            .cloned()
            .collect())
    }

    async fn course(&self, id: Uuid) -> EngineResult<Option<Course>> {
        Ok(self
            .courses
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn courses(&self) -> EngineResult<Vec<Course>> {
        Ok(self.courses.read().await.clone())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn profile(&self, learner_id: Uuid) -> EngineResult<Option<LearnerProfile>> {
        Ok(self.profiles.read().await.get(&learner_id).cloned())
    }

    async fn set_level(&self, learner_id: Uuid, level: SkillLevel) -> EngineResult<()> {
        if let Some(profile) = self.profiles.write().await.get_mut(&learner_id) {
            profile.current_level = level;
        }
        Ok(())
    }
}

#[async_trait]
impl AttemptStore for InMemoryStore {
    async fn insert_attempt(&self, attempt: &AssessmentAttempt) -> EngineResult<()> {
        self.attempts
            .write()
            .await
            .insert(attempt.id, attempt.clone());
        Ok(())
    }

    async fn attempt(&self, id: Uuid) -> EngineResult<Option<AssessmentAttempt>> {
        Ok(self.attempts.read().await.get(&id).cloned())
    }

    async fn update_attempt(&self, attempt: &AssessmentAttempt) -> EngineResult<()> {
        self.attempts
            .write()
            .await
            .insert(attempt.id, attempt.clone());
        Ok(())
    }

    async fn insert_answer(&self, answer: &AssessmentAnswer) -> EngineResult<()> {
        self.answers.write().await.push(answer.clone());
        Ok(())
    }

    async fn answers(&self, attempt_id: Uuid) -> EngineResult<Vec<AssessmentAnswer>> {
        Ok(self
            .answers
            .read()
            .await
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn latest_finished_for_course(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> EngineResult<Option<AssessmentAttempt>> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| {
                a.learner_id == learner_id
                    && a.course_id == Some(course_id)
                    && a.finished_at.is_some()
            })
            .max_by_key(|a| a.finished_at)
            .cloned())
    }
}

#[async_trait]
impl RecommendationStore for InMemoryStore {
    async fn insert_record(&self, record: &RecommendationRecord) -> EngineResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn latest_for_attempt(
        &self,
        attempt_id: Uuid,
    ) -> EngineResult<Option<RecommendationRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.attempt_id == attempt_id)
            .cloned())
    }
}

#[async_trait]
impl RoadmapStore for InMemoryStore {
    async fn find_by_signature(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        signature: &str,
    ) -> EngineResult<Option<Roadmap>> {
        Ok(self
            .roadmaps
            .read()
            .await
            .iter()
            .rev()
            .find(|r| {
                r.learner_id == learner_id && r.course_id == course_id && r.signature == signature
            })
            .cloned())
    }

    async fn latest_for_course(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> EngineResult<Option<Roadmap>> {
        Ok(self
            .roadmaps
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.learner_id == learner_id && r.course_id == course_id)
            .cloned())
    }

    async fn insert_roadmap(&self, roadmap: &Roadmap) -> EngineResult<()> {
        self.roadmaps.write().await.push(roadmap.clone());
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for InMemoryStore {
    async fn insert_final_attempt(&self, attempt: &FinalAssessmentAttempt) -> EngineResult<()> {
        self.final_attempts.write().await.push(attempt.clone());
        Ok(())
    }

    async fn final_attempt_count(&self, learner_id: Uuid, course_id: Uuid) -> EngineResult<u32> {
        Ok(self
            .final_attempts
            .read()
            .await
            .iter()
            .filter(|a| a.learner_id == learner_id && a.course_id == course_id)
            .count() as u32)
    }

    async fn progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> EngineResult<Option<CourseProgress>> {
        Ok(self
            .progress
            .read()
            .await
            .get(&(learner_id, course_id))
            .cloned())
    }

    async fn upsert_progress(&self, progress: &CourseProgress) -> EngineResult<()> {
        self.progress
            .write()
            .await
            .insert((progress.learner_id, progress.course_id), progress.clone());
        Ok(())
    }
}
