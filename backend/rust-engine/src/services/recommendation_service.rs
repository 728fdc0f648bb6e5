//! Proficiency prediction and course ranking.
//!
//! The primary path runs the pretrained ensemble plus the neighbor index;
//! any failure anywhere in it collapses into one boundary and silently
//! degrades to the deterministic heuristic. Both paths return a valid
//! recommendation set; the distinction is kept for observability only.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::EngineResult;
use crate::ml::ModelService;
use crate::models::{Course, QuizTelemetry, RecommendedCourse, SkillLevel};
use crate::scoring::{composite_score, streak_ratio};
use crate::store::CatalogStore;

const NEIGHBOR_COUNT: usize = 5;

/// Outcome of one recommendation resolution. `Model` carries the primary
/// path's prediction; `Heuristic` means the engine degraded to the fallback.
#[derive(Debug, Clone)]
pub enum Recommendation {
    Model {
        level: SkillLevel,
        courses: Vec<RecommendedCourse>,
    },
    Heuristic {
        level: SkillLevel,
        courses: Vec<RecommendedCourse>,
    },
}

impl Recommendation {
    pub fn level(&self) -> SkillLevel {
        match self {
            Recommendation::Model { level, .. } | Recommendation::Heuristic { level, .. } => *level,
        }
    }

    pub fn courses(&self) -> &[RecommendedCourse] {
        match self {
            Recommendation::Model { courses, .. }
            | Recommendation::Heuristic { courses, .. } => courses,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Recommendation::Heuristic { .. })
    }

    pub fn into_parts(self) -> (SkillLevel, Vec<RecommendedCourse>, bool) {
        match self {
            Recommendation::Model { level, courses } => (level, courses, false),
            Recommendation::Heuristic { level, courses } => (level, courses, true),
        }
    }
}

pub struct RecommendationService {
    catalog: Arc<dyn CatalogStore>,
    model: Option<Arc<ModelService>>,
    target_time: f64,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        model: Option<Arc<ModelService>>,
        target_time: f64,
    ) -> Self {
        Self {
            catalog,
            model,
            target_time,
        }
    }

    pub async fn resolve(
        &self,
        telemetry: &QuizTelemetry,
        top_k: usize,
    ) -> EngineResult<Recommendation> {
        let total = telemetry.total_questions.max(1);
        let avg_score = telemetry.correct_count as f64 / total as f64 * 100.0;
        let avg_time = telemetry.total_time / total as f64;
        let consistency = streak_ratio(&telemetry.correctness);
        let composite = composite_score(
            telemetry.correct_count,
            total,
            telemetry.total_time,
            &telemetry.correctness,
            self.target_time,
        );

        let courses = self.catalog.courses().await?;

        if let Some(model) = &self.model {
            match primary_rank(
                model,
                &telemetry.topic,
                avg_score,
                avg_time,
                consistency,
                composite,
                &courses,
                top_k,
            ) {
                Ok((level, ranked)) => {
                    return Ok(Recommendation::Model {
                        level,
                        courses: ranked,
                    })
                }
                Err(error) => {
                    tracing::warn!(
                        %error,
                        topic = %telemetry.topic,
                        "primary recommendation path failed, degrading to heuristic"
                    );
                }
            }
        } else {
            tracing::debug!("model artifacts not loaded, using heuristic path");
        }

        let level = SkillLevel::from_score(composite);
        let ranked = heuristic_rank(&courses, &telemetry.topic, level, top_k);
        Ok(Recommendation::Heuristic {
            level,
            courses: ranked,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn primary_rank(
    model: &ModelService,
    topic: &str,
    avg_score: f64,
    avg_time: f64,
    consistency: f64,
    composite: f64,
    courses: &[Course],
    top_k: usize,
) -> anyhow::Result<(SkillLevel, Vec<RecommendedCourse>)> {
    let scaled = model.scaled_features(avg_score, avg_time, consistency, composite, topic);
    let level = model.predict_level(&scaled)?;
    let neighbors = model.neighbors(&scaled, NEIGHBOR_COUNT)?;

    let neighbor_topics: HashSet<&str> = neighbors.iter().map(|n| n.topic.as_str()).collect();

    // Most frequent neighbor skill label; first-seen order breaks ties.
    let mut skill_counts: Vec<(&str, usize)> = Vec::new();
    for neighbor in &neighbors {
        match skill_counts
            .iter_mut()
            .find(|(label, _)| *label == neighbor.skill_label)
        {
            Some((_, count)) => *count += 1,
            None => skill_counts.push((neighbor.skill_label.as_str(), 1)),
        }
    }
    let dominant_skill = skill_counts
        .iter()
        .max_by_key(|(_, count)| *count)
        .map(|(label, _)| *label)
        .unwrap_or_default();
    let dominant_difficulty = SkillLevel::parse_label(dominant_skill)
        .map(|l| l.target_difficulty())
        .unwrap_or_else(|| level.target_difficulty());

    let target_difficulty = level.target_difficulty();

    let mut scored: Vec<(u32, RecommendedCourse)> = Vec::new();
    for course in courses {
        let mut score = 0u32;
        let mut reasons: Vec<String> = Vec::new();

        if course.topic.eq_ignore_ascii_case(topic) {
            score += 4;
            reasons.push("Matches your selected topic".to_string());
        }

        let alignment = course.difficulty.alignment(target_difficulty);
        score += alignment;
        if alignment >= 3 {
            reasons.push(format!("Aligned with your current level ({})", level));
        } else if alignment == 1 {
            reasons.push("Slightly challenges your current level".to_string());
        }

        if neighbor_topics.contains(course.topic.as_str()) {
            score += 2;
            reasons.push("Popular among learners with similar performance".to_string());
        }

        if course.difficulty.alignment(dominant_difficulty) >= 1 {
            score += 1;
            reasons.push("Fits paths taken by similar learners".to_string());
        }

        if score > 0 {
            scored.push((
                score,
                to_recommended(course, reasons, "Strong overall fit for your profile"),
            ));
        }
    }

    // Stable sort keeps encounter order for equal scores.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    Ok((
        level,
        scored.into_iter().take(top_k).map(|(_, c)| c).collect(),
    ))
}

fn heuristic_rank(
    courses: &[Course],
    topic: &str,
    level: SkillLevel,
    top_k: usize,
) -> Vec<RecommendedCourse> {
    let target_difficulty = level.target_difficulty();

    // Topic-matching courses are ranked ahead of everything else.
    let (mut pool, secondary): (Vec<&Course>, Vec<&Course>) = courses
        .iter()
        .partition(|c| c.topic.eq_ignore_ascii_case(topic));
    pool.extend(secondary);

    let mut ranked: Vec<(u32, RecommendedCourse)> = Vec::new();
    for course in pool {
        let mut score = 0u32;
        let mut reasons: Vec<String> = Vec::new();

        if course.topic.eq_ignore_ascii_case(topic) {
            score += 3;
            reasons.push("Matches your selected topic".to_string());
        }
        if course.difficulty == target_difficulty {
            score += 2;
            reasons.push(format!("Aligned with your current level ({})", level));
        }

        ranked.push((
            score,
            to_recommended(course, reasons, "Recommended by fallback content matching"),
        ));
    }

    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().take(top_k).map(|(_, c)| c).collect()
}

fn to_recommended(course: &Course, reasons: Vec<String>, default_reason: &str) -> RecommendedCourse {
    RecommendedCourse {
        course_id: course.id,
        title: course.title.clone(),
        topic: course.topic.clone(),
        difficulty: course.difficulty,
        description: course.description.clone(),
        url: course.url.clone(),
        why_recommended: join_reasons(reasons, default_reason),
    }
}

/// De-duplicates while preserving order, then joins with "; ".
fn join_reasons(reasons: Vec<String>, default_reason: &str) -> String {
    let mut seen = HashSet::new();
    let unique: Vec<String> = reasons
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect();
    if unique.is_empty() {
        default_reason.to_string()
    } else {
        unique.join("; ")
    }
}
