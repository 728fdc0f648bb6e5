use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod attempt;
pub mod final_exam;
pub mod recommendation;
pub mod roadmap;

pub use attempt::{
    AssessmentAnswer, AssessmentAttempt, AttemptResult, AttemptStatus, Progress,
    StartAttemptResponse, SubmitAnswerOutcome,
};
pub use final_exam::{
    CourseProgress, FinalAnswer, FinalAssessmentAttempt, ProgressStatus, StartFinalResponse,
    SubmitFinalResponse,
};
pub use recommendation::{QuizTelemetry, RecommendationRecord, RecommendedCourse};
pub use roadmap::{Roadmap, RoadmapStep};

/// The ordered 3-level difficulty ladder the controller ratchets along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn index(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Saturating step: up on a correct answer, down on an incorrect one.
    pub fn adjust(self, correct: bool) -> Self {
        let idx = self.index();
        let next = if correct {
            (idx + 1).min(Self::ALL.len() - 1)
        } else {
            idx.saturating_sub(1)
        };
        Self::from_index(next)
    }

    /// Tiered alignment against a target difficulty: 3 exact, 1 adjacent,
    /// 0 two steps away.
    pub fn alignment(self, target: Difficulty) -> u32 {
        match self.index().abs_diff(target.index()) {
            0 => 3,
            1 => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(label)
    }
}

/// Predicted proficiency label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Difficulty a learner at this level should be working at.
    pub fn target_difficulty(self) -> Difficulty {
        match self {
            SkillLevel::Beginner => Difficulty::Easy,
            SkillLevel::Intermediate => Difficulty::Medium,
            SkillLevel::Advanced => Difficulty::Hard,
        }
    }

    /// Heuristic thresholds over the composite score.
    pub fn from_score(score: f64) -> Self {
        if score < 50.0 {
            SkillLevel::Beginner
        } else if score < 75.0 {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Advanced
        }
    }

    pub fn parse_label(label: &str) -> Option<Self> {
        match label {
            "Beginner" => Some(SkillLevel::Beginner),
            "Intermediate" => Some(SkillLevel::Intermediate),
            "Advanced" => Some(SkillLevel::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
        };
        f.write_str(label)
    }
}

/// Seeded quiz question. Immutable reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub topic: String,
    pub difficulty: Difficulty,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// One of 'a'..'d', lowercase.
    pub correct_option: char,
}

impl Question {
    /// Projection handed to learners: everything except the correct letter.
    pub fn public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            topic: self.topic.clone(),
            difficulty: self.difficulty,
            text: self.text.clone(),
            option_a: self.option_a.clone(),
            option_b: self.option_b.clone(),
            option_c: self.option_c.clone(),
            option_d: self.option_d.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub topic: String,
    pub difficulty: Difficulty,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

/// Catalog course. Immutable reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub url: String,
}

/// Slice of the identity provider the engine consumes: current level and
/// interest tags, with the level written back at finalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub id: Uuid,
    pub current_level: SkillLevel,
    pub interests: Vec<String>,
}
