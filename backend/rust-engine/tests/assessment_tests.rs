use uuid::Uuid;

use skillpath_engine::models::{Difficulty, SubmitAnswerOutcome};
use skillpath_engine::EngineError;

mod common;

#[tokio::test]
async fn start_attempt_unknown_course_is_not_found() {
    let world = common::world().await;
    let err = world
        .state
        .assessment()
        .start_attempt(world.learner, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn start_attempt_unknown_learner_is_not_found() {
    let world = common::world().await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    let err = world
        .state
        .assessment()
        .start_attempt(Uuid::new_v4(), course)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn start_attempt_without_easy_questions_is_not_found() {
    let world = common::world().await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    // Only a medium question exists; the opener must be easy.
    common::seed_question(&world.store, "Python", Difficulty::Medium, 'a').await;
    let err = world
        .state
        .assessment()
        .start_attempt(world.learner, course)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn start_attempt_opens_with_an_easy_question() {
    let world = common::world().await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    common::seed_question(&world.store, "Python", Difficulty::Hard, 'a').await;

    let started = world
        .state
        .assessment()
        .start_attempt(world.learner, course)
        .await
        .unwrap();

    assert_eq!(started.question.difficulty, Difficulty::Easy);
    assert_eq!(started.progress.index, 1);
    assert_eq!(started.progress.total, 10);

    let attempt = common::attempt_by_id(&world.store, started.attempt_id).await;
    assert!(attempt.finished_at.is_none());
    assert_eq!(attempt.current_difficulty, Difficulty::Easy);
}

#[tokio::test]
async fn topic_match_on_start_is_case_insensitive() {
    let world = common::world().await;
    let course = common::seed_course(&world.store, "Python Basics", "PYTHON", Difficulty::Easy).await;
    common::seed_question(&world.store, "python", Difficulty::Easy, 'a').await;

    let started = world
        .state
        .assessment()
        .start_attempt(world.learner, course)
        .await
        .unwrap();
    assert_eq!(started.question.topic, "python");
}

#[tokio::test]
async fn invalid_option_and_topic_mismatch_are_rejected() {
    let mut config = common::test_config();
    config.total_questions = 3;
    let world = common::world_with(config).await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    let q1 = common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    let off_topic = common::seed_question(&world.store, "SQL", Difficulty::Easy, 'a').await;

    let service = world.state.assessment();
    let started = service.start_attempt(world.learner, course).await.unwrap();

    let err = service
        .submit_answer(started.attempt_id, q1, "z", 5.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = service
        .submit_answer(started.attempt_id, off_topic, "a", 5.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Neither rejection recorded anything.
    let attempt = common::attempt_by_id(&world.store, started.attempt_id).await;
    assert_eq!(attempt.correct_count, 0);
    assert_eq!(attempt.total_time, 0.0);
}

#[tokio::test]
async fn duplicate_answer_is_rejected_without_mutation() {
    let mut config = common::test_config();
    config.total_questions = 3;
    let world = common::world_with(config).await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    let q1 = common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    common::seed_question(&world.store, "Python", Difficulty::Medium, 'a').await;

    let service = world.state.assessment();
    let started = service.start_attempt(world.learner, course).await.unwrap();
    service
        .submit_answer(started.attempt_id, q1, "a", 4.0)
        .await
        .unwrap();

    let err = service
        .submit_answer(started.attempt_id, q1, "b", 9.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let attempt = common::attempt_by_id(&world.store, started.attempt_id).await;
    assert_eq!(attempt.correct_count, 1);
    assert_eq!(attempt.total_time, 4.0);
}

#[tokio::test]
async fn answers_after_finalization_are_rejected() {
    let mut config = common::test_config();
    config.total_questions = 1;
    let world = common::world_with(config).await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    let q1 = common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    let q2 = common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    common::seed_course(&world.store, "Python Deep Dive", "Python", Difficulty::Medium).await;

    let service = world.state.assessment();
    let started = service.start_attempt(world.learner, course).await.unwrap();
    let first = if started.question.id == q1 { q1 } else { q2 };
    let outcome = service
        .submit_answer(started.attempt_id, first, "a", 5.0)
        .await
        .unwrap();
    assert!(outcome.is_done());

    let second = if first == q1 { q2 } else { q1 };
    let err = service
        .submit_answer(started.attempt_id, second, "a", 5.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn correct_answers_ratchet_difficulty_upwards() {
    let mut config = common::test_config();
    config.total_questions = 3;
    let world = common::world_with(config).await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    common::seed_question(&world.store, "Python", Difficulty::Medium, 'a').await;
    common::seed_question(&world.store, "Python", Difficulty::Hard, 'a').await;
    common::seed_course(&world.store, "Python Deep Dive", "Python", Difficulty::Medium).await;

    let service = world.state.assessment();
    let started = service.start_attempt(world.learner, course).await.unwrap();

    let outcome = service
        .submit_answer(started.attempt_id, started.question.id, "a", 5.0)
        .await
        .unwrap();
    let next = match outcome {
        SubmitAnswerOutcome::Next {
            is_correct,
            new_difficulty,
            next_question,
            progress,
        } => {
            assert!(is_correct);
            assert_eq!(new_difficulty, Difficulty::Medium);
            assert_eq!(next_question.difficulty, Difficulty::Medium);
            assert_eq!(progress.index, 2);
            next_question
        }
        other => panic!("expected next question, got {:?}", other),
    };

    let outcome = service
        .submit_answer(started.attempt_id, next.id, "a", 5.0)
        .await
        .unwrap();
    match outcome {
        SubmitAnswerOutcome::Next {
            new_difficulty,
            next_question,
            ..
        } => {
            assert_eq!(new_difficulty, Difficulty::Hard);
            assert_eq!(next_question.difficulty, Difficulty::Hard);
        }
        other => panic!("expected next question, got {:?}", other),
    }
}

#[tokio::test]
async fn wrong_answer_steps_difficulty_down_and_saturates() {
    let mut config = common::test_config();
    config.total_questions = 5;
    let world = common::world_with(config).await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    for _ in 0..4 {
        common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    }

    let service = world.state.assessment();
    let started = service.start_attempt(world.learner, course).await.unwrap();

    let mut question = started.question;
    // Wrong answers keep the ladder pinned at easy.
    for expected_index in 2u32..4 {
        let outcome = service
            .submit_answer(started.attempt_id, question.id, "b", 5.0)
            .await
            .unwrap();
        match outcome {
            SubmitAnswerOutcome::Next {
                is_correct,
                new_difficulty,
                next_question,
                progress,
            } => {
                assert!(!is_correct);
                assert_eq!(new_difficulty, Difficulty::Easy);
                assert_eq!(progress.index, expected_index);
                question = next_question;
            }
            other => panic!("expected next question, got {:?}", other),
        }
    }
}

/// Topic with only easy and medium questions: the bank runs dry before the
/// configured target, so the attempt finalizes early with the target reduced
/// to what was actually answered.
#[tokio::test]
async fn question_bank_exhaustion_terminates_early() {
    let world = common::world().await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    common::seed_question(&world.store, "Python", Difficulty::Medium, 'a').await;
    common::seed_question(&world.store, "Python", Difficulty::Medium, 'a').await;
    common::seed_course(&world.store, "Python Deep Dive", "Python", Difficulty::Medium).await;

    let service = world.state.assessment();
    let started = service.start_attempt(world.learner, course).await.unwrap();
    assert_eq!(started.progress.total, 10);

    let mut question = started.question;
    let mut served = vec![question.difficulty];
    let summary = loop {
        match service
            .submit_answer(started.attempt_id, question.id, "a", 5.0)
            .await
            .unwrap()
        {
            SubmitAnswerOutcome::Next { next_question, .. } => {
                served.push(next_question.difficulty);
                question = next_question;
            }
            SubmitAnswerOutcome::Finished {
                score,
                level,
                recommended_courses,
            } => break (score, level, recommended_courses),
        }
    };

    // easy -> medium -> medium: the hard tier never exists, selection falls
    // back to the remaining medium question.
    assert_eq!(
        served,
        vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Medium]
    );

    let attempt = common::attempt_by_id(&world.store, started.attempt_id).await;
    assert!(attempt.finished_at.is_some());
    assert_eq!(attempt.total_questions, 3);
    assert_eq!(attempt.correct_count, 3);
    assert_eq!(attempt.score, summary.0);
    assert!(!summary.2.is_empty());
}

#[tokio::test]
async fn finalization_updates_profile_and_writes_snapshot() {
    let mut config = common::test_config();
    config.total_questions = 2;
    let world = common::world_with(config).await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    common::seed_question(&world.store, "Python", Difficulty::Medium, 'a').await;
    common::seed_course(&world.store, "Python Deep Dive", "Python", Difficulty::Medium).await;

    let service = world.state.assessment();
    let started = service.start_attempt(world.learner, course).await.unwrap();

    let mut question = started.question;
    let summary = loop {
        match service
            .submit_answer(started.attempt_id, question.id, "a", 2.0)
            .await
            .unwrap()
        {
            SubmitAnswerOutcome::Next { next_question, .. } => question = next_question,
            SubmitAnswerOutcome::Finished {
                score,
                level,
                recommended_courses,
            } => break (score, level, recommended_courses),
        }
    };

    // Fast, flawless two-question run scores high on the heuristic path.
    assert!(summary.0 > 75.0);

    let profile = common::profile_by_id(&world.store, world.learner).await;
    assert_eq!(profile.current_level, summary.1);

    let result = service.get_result(started.attempt_id).await.unwrap();
    assert_eq!(result.score, summary.0);
    assert_eq!(result.level, summary.1);
    assert_eq!(result.recommended_courses.len(), summary.2.len());
    for course in &result.recommended_courses {
        assert!(!course.why_recommended.is_empty());
    }
}

#[tokio::test]
async fn result_with_roadmaps_attaches_plans_to_top_courses() {
    let mut config = common::test_config();
    config.total_questions = 2;
    let world = common::world_with(config).await;
    let course = common::seed_course(&world.store, "Python Basics", "Python", Difficulty::Easy).await;
    common::seed_question(&world.store, "Python", Difficulty::Easy, 'a').await;
    common::seed_question(&world.store, "Python", Difficulty::Medium, 'a').await;
    for title in ["Python Deep Dive", "Python for Data", "SQL Essentials", "Cloud Intro"] {
        common::seed_course(&world.store, title, "Python", Difficulty::Medium).await;
    }

    let service = world.state.assessment();
    let started = service.start_attempt(world.learner, course).await.unwrap();
    let mut question = started.question;
    loop {
        match service
            .submit_answer(started.attempt_id, question.id, "a", 2.0)
            .await
            .unwrap()
        {
            SubmitAnswerOutcome::Next { next_question, .. } => question = next_question,
            SubmitAnswerOutcome::Finished { .. } => break,
        }
    }

    let result = world
        .state
        .result_with_roadmaps(started.attempt_id)
        .await
        .unwrap();
    assert!(!result.recommendations.is_empty());
    assert!(result.recommendations.len() <= 3);
    for item in &result.recommendations {
        assert_eq!(item.roadmap.course_id, item.course.course_id);
        assert_eq!(item.roadmap.level, result.level);
        assert!(!item.roadmap.steps.is_empty());
    }
}

#[tokio::test]
async fn get_result_for_unknown_attempt_is_not_found() {
    let world = common::world().await;
    let err = world
        .state
        .assessment()
        .get_result(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
