//! Narrow persistence contracts between the engine core and its external
//! providers. The core enforces all data-model invariants before any write;
//! implementations only need faithful CRUD.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AssessmentAnswer, AssessmentAttempt, Course, CourseProgress, FinalAssessmentAttempt,
    LearnerProfile, Question, RecommendationRecord, Roadmap, SkillLevel,
};

pub use memory::InMemoryStore;

/// Read-only content catalog: seeded questions and courses.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn question(&self, id: Uuid) -> EngineResult<Option<Question>>;

    /// All questions whose topic matches case-insensitively.
    async fn questions_by_topic(&self, topic: &str) -> EngineResult<Vec<Question>>;

    async fn course(&self, id: Uuid) -> EngineResult<Option<Course>>;

    async fn courses(&self) -> EngineResult<Vec<Course>>;
}

/// Slice of the identity provider the engine consumes.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile(&self, learner_id: Uuid) -> EngineResult<Option<LearnerProfile>>;

    /// Writes the predicted level back onto the learner at finalize.
    async fn set_level(&self, learner_id: Uuid, level: SkillLevel) -> EngineResult<()>;
}

#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn insert_attempt(&self, attempt: &AssessmentAttempt) -> EngineResult<()>;

    async fn attempt(&self, id: Uuid) -> EngineResult<Option<AssessmentAttempt>>;

    async fn update_attempt(&self, attempt: &AssessmentAttempt) -> EngineResult<()>;

    async fn insert_answer(&self, answer: &AssessmentAnswer) -> EngineResult<()>;

    /// Answers of one attempt in submission order.
    async fn answers(&self, attempt_id: Uuid) -> EngineResult<Vec<AssessmentAnswer>>;

    async fn latest_finished_for_course(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> EngineResult<Option<AssessmentAttempt>>;
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn insert_record(&self, record: &RecommendationRecord) -> EngineResult<()>;

    async fn latest_for_attempt(
        &self,
        attempt_id: Uuid,
    ) -> EngineResult<Option<RecommendationRecord>>;
}

#[async_trait]
pub trait RoadmapStore: Send + Sync {
    async fn find_by_signature(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        signature: &str,
    ) -> EngineResult<Option<Roadmap>>;

    async fn latest_for_course(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> EngineResult<Option<Roadmap>>;

    async fn insert_roadmap(&self, roadmap: &Roadmap) -> EngineResult<()>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn insert_final_attempt(&self, attempt: &FinalAssessmentAttempt) -> EngineResult<()>;

    async fn final_attempt_count(&self, learner_id: Uuid, course_id: Uuid) -> EngineResult<u32>;

    async fn progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> EngineResult<Option<CourseProgress>>;

    async fn upsert_progress(&self, progress: &CourseProgress) -> EngineResult<()>;
}
