use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Question target for one adaptive attempt.
    pub total_questions: u32,
    /// Seconds per question considered "on pace" by the composite score.
    pub target_time_per_question: f64,
    /// Question count for the final (non-adaptive) course assessment.
    pub final_questions: usize,
    /// Directory holding the pretrained model artifacts.
    pub artifact_dir: PathBuf,
    /// Ranked courses returned at attempt finalization.
    pub top_k: usize,
    /// Ranked courses returned when roadmaps are attached.
    pub roadmap_top_k: usize,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let total_questions = settings
            .get_string("assessment.total_questions")
            .or_else(|_| env::var("ASSESSMENT_TOTAL_QUESTIONS"))
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);

        let target_time_per_question = settings
            .get_string("assessment.target_time_per_question")
            .or_else(|_| env::var("TARGET_TIME_PER_QUESTION"))
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| *v > 0.0)
            .unwrap_or(20.0);

        let final_questions = settings
            .get_string("assessment.final_questions")
            .or_else(|_| env::var("FINAL_ASSESSMENT_QUESTIONS"))
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);

        let artifact_dir = settings
            .get_string("ml.artifact_dir")
            .or_else(|_| env::var("ML_ARTIFACT_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("ml/artifacts"));

        let top_k = settings
            .get_string("recommendations.top_k")
            .or_else(|_| env::var("RECOMMENDATIONS_TOP_K"))
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(5);

        let roadmap_top_k = settings
            .get_string("recommendations.roadmap_top_k")
            .or_else(|_| env::var("RECOMMENDATIONS_ROADMAP_TOP_K"))
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(3);

        Ok(Config {
            total_questions,
            target_time_per_question,
            final_questions,
            artifact_dir,
            top_k,
            roadmap_top_k,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_questions: 10,
            target_time_per_question: 20.0,
            final_questions: 10,
            artifact_dir: PathBuf::from("ml/artifacts"),
            top_k: 5,
            roadmap_top_k: 3,
        }
    }
}
