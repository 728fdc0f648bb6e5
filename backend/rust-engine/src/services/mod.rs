use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::ml::ModelService;
use crate::models::{Roadmap, SkillLevel};
use crate::store::{
    AttemptStore, CatalogStore, ProfileStore, ProgressStore, RecommendationStore, RoadmapStore,
};

pub mod assessment_service;
pub mod final_assessment_service;
pub mod recommendation_service;
pub mod roadmap_service;

pub use assessment_service::AssessmentService;
pub use final_assessment_service::FinalAssessmentService;
pub use recommendation_service::{Recommendation, RecommendationService};
pub use roadmap_service::RoadmapService;

use assessment_service::AttemptLocks;
use crate::models::RecommendedCourse;

/// Process-wide engine state: configuration, the persistence providers, and
/// the model artifacts loaded once at startup. Built explicitly and passed
/// by reference; there is no hidden global.
pub struct EngineState {
    pub config: Config,
    pub catalog: Arc<dyn CatalogStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub attempts: Arc<dyn AttemptStore>,
    pub recommendations: Arc<dyn RecommendationStore>,
    pub roadmaps: Arc<dyn RoadmapStore>,
    pub progress: Arc<dyn ProgressStore>,
    pub model: Option<Arc<ModelService>>,
    attempt_locks: Arc<AttemptLocks>,
}

impl EngineState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogStore>,
        profiles: Arc<dyn ProfileStore>,
        attempts: Arc<dyn AttemptStore>,
        recommendations: Arc<dyn RecommendationStore>,
        roadmaps: Arc<dyn RoadmapStore>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        let model = match ModelService::load(&config.artifact_dir) {
            Ok(service) => Some(Arc::new(service)),
            Err(error) => {
                tracing::warn!(
                    %error,
                    dir = %config.artifact_dir.display(),
                    "model artifacts unavailable, recommendations will use the heuristic path"
                );
                None
            }
        };

        Self {
            config,
            catalog,
            profiles,
            attempts,
            recommendations,
            roadmaps,
            progress,
            model,
            attempt_locks: Arc::new(AttemptLocks::default()),
        }
    }

    /// Wires every persistence contract to one backing store.
    pub fn with_backing_store<S>(config: Config, store: Arc<S>) -> Self
    where
        S: CatalogStore
            + ProfileStore
            + AttemptStore
            + RecommendationStore
            + RoadmapStore
            + ProgressStore
            + 'static,
    {
        Self::new(
            config,
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    pub fn assessment(&self) -> AssessmentService {
        AssessmentService::new(
            self.config.clone(),
            self.catalog.clone(),
            self.profiles.clone(),
            self.attempts.clone(),
            self.recommendations.clone(),
            self.recommendation(),
            self.attempt_locks.clone(),
        )
    }

    pub fn recommendation(&self) -> RecommendationService {
        RecommendationService::new(
            self.catalog.clone(),
            self.model.clone(),
            self.config.target_time_per_question,
        )
    }

    pub fn roadmap(&self) -> RoadmapService {
        RoadmapService::new(
            self.catalog.clone(),
            self.profiles.clone(),
            self.attempts.clone(),
            self.roadmaps.clone(),
        )
    }

    pub fn final_assessment(&self) -> FinalAssessmentService {
        FinalAssessmentService::new(
            self.config.clone(),
            self.catalog.clone(),
            self.progress.clone(),
        )
    }

    /// Attempt result with a generated (or cached) roadmap attached to each
    /// of the top recommended courses.
    pub async fn result_with_roadmaps(
        &self,
        attempt_id: Uuid,
    ) -> EngineResult<AttemptResultWithRoadmaps> {
        let result = self.assessment().get_result(attempt_id).await?;
        let attempt = self
            .attempts
            .attempt(attempt_id)
            .await?
            .ok_or_else(|| EngineError::not_found("attempt", attempt_id))?;
        let profile = self
            .profiles
            .profile(attempt.learner_id)
            .await?
            .ok_or_else(|| EngineError::not_found("learner", attempt.learner_id))?;

        let roadmap_service = self.roadmap();
        let mut recommendations = Vec::new();
        for course in result
            .recommended_courses
            .into_iter()
            .take(self.config.roadmap_top_k)
        {
            let roadmap = roadmap_service
                .get_or_generate(
                    attempt.learner_id,
                    course.course_id,
                    result.level,
                    result.score,
                    &profile.interests,
                )
                .await?;
            recommendations.push(CourseWithRoadmap { course, roadmap });
        }

        Ok(AttemptResultWithRoadmaps {
            score: result.score,
            level: result.level,
            recommendations,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseWithRoadmap {
    pub course: RecommendedCourse,
    pub roadmap: Roadmap,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptResultWithRoadmaps {
    pub score: f64,
    pub level: SkillLevel,
    pub recommendations: Vec<CourseWithRoadmap>,
}
