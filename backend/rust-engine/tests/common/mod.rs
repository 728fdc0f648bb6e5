#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Once};

use uuid::Uuid;

use skillpath_engine::config::Config;
use skillpath_engine::ml::{
    DecisionTree, Encoders, Forest, HistoryRecord, Scaler, TreeNode, FEATURE_COUNT,
};
use skillpath_engine::models::{
    AssessmentAttempt, Course, Difficulty, LearnerProfile, Question, SkillLevel,
};
use skillpath_engine::store::{AttemptStore, InMemoryStore, ProfileStore};
use skillpath_engine::EngineState;

pub struct TestWorld {
    pub state: EngineState,
    pub store: Arc<InMemoryStore>,
    pub learner: Uuid,
}

pub fn test_config() -> Config {
    Config {
        // Missing directory: the engine must degrade, never fail.
        artifact_dir: "/nonexistent/skillpath-artifacts".into(),
        ..Config::default()
    }
}

/// Captured per test; set `RUST_LOG` to surface engine traces on failures.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub async fn world() -> TestWorld {
    world_with(test_config()).await
}

pub async fn world_with(config: Config) -> TestWorld {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let learner = Uuid::new_v4();
    store
        .seed_profile(LearnerProfile {
            id: learner,
            current_level: SkillLevel::Beginner,
            interests: vec!["backend".to_string(), "automation".to_string()],
        })
        .await;
    let state = EngineState::with_backing_store(config, store.clone());
    TestWorld {
        state,
        store,
        learner,
    }
}

pub async fn seed_question(
    store: &InMemoryStore,
    topic: &str,
    difficulty: Difficulty,
    correct: char,
) -> Uuid {
    let id = Uuid::new_v4();
    store
        .seed_question(Question {
            id,
            topic: topic.to_string(),
            difficulty,
            text: format!("{} question at {}", topic, difficulty),
            option_a: "Option A".to_string(),
            option_b: "Option B".to_string(),
            option_c: "Option C".to_string(),
            option_d: "Option D".to_string(),
            correct_option: correct,
        })
        .await;
    id
}

pub async fn seed_course(
    store: &InMemoryStore,
    title: &str,
    topic: &str,
    difficulty: Difficulty,
) -> Uuid {
    let id = Uuid::new_v4();
    store
        .seed_course(Course {
            id,
            title: title.to_string(),
            topic: topic.to_string(),
            difficulty,
            description: format!("{} course", title),
            url: format!("https://courses.example/{}", title.to_lowercase()),
        })
        .await;
    id
}

pub async fn attempt_by_id(store: &InMemoryStore, id: Uuid) -> AssessmentAttempt {
    store
        .attempt(id)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("attempt {} not stored", id))
}

pub async fn profile_by_id(store: &InMemoryStore, id: Uuid) -> LearnerProfile {
    store
        .profile(id)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("profile {} not stored", id))
}

fn stump(class: usize) -> DecisionTree {
    DecisionTree {
        nodes: vec![TreeNode::Leaf { class }],
    }
}

/// Writes a minimal, valid artifact set: identity scaler, single-stump
/// classifiers, and a five-row neighbor index biased towards Python.
pub fn write_model_artifacts(dir: &Path, forest_class: usize, tree_class: usize) {
    write_model_artifacts_with_skills(
        dir,
        forest_class,
        tree_class,
        &["Beginner", "Intermediate", "Advanced"],
    );
}

pub fn write_model_artifacts_with_skills(
    dir: &Path,
    forest_class: usize,
    tree_class: usize,
    skills: &[&str],
) {
    let scaler = Scaler {
        mean: vec![0.0; FEATURE_COUNT],
        std: vec![1.0; FEATURE_COUNT],
    };
    let forest = Forest {
        trees: vec![stump(forest_class)],
    };
    let tree = stump(tree_class);
    let encoders = Encoders {
        topics: vec!["Python".to_string(), "SQL".to_string()],
        skills: skills.iter().map(|s| s.to_string()).collect(),
    };
    let history: Vec<HistoryRecord> = vec![
        history_row("Python", "Advanced"),
        history_row("Python", "Advanced"),
        history_row("Python", "Intermediate"),
        history_row("SQL", "Advanced"),
        history_row("SQL", "Beginner"),
    ];

    std::fs::write(
        dir.join("scaler.json"),
        serde_json::to_string(&scaler).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("random_forest.json"),
        serde_json::to_string(&forest).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("decision_tree.json"),
        serde_json::to_string(&tree).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("encoders.json"),
        serde_json::to_string(&encoders).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("history.json"),
        serde_json::to_string(&history).unwrap(),
    )
    .unwrap();
}

fn history_row(topic: &str, skill: &str) -> HistoryRecord {
    HistoryRecord {
        features: vec![0.0; FEATURE_COUNT],
        topic: topic.to_string(),
        skill_label: skill.to_string(),
    }
}
