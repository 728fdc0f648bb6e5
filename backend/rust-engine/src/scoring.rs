//! Pure scoring primitives: streak ratio, composite score, option
//! normalization. No side effects, no dependencies on the stores.

/// Longest consecutive run of correct answers divided by the total number of
/// answers. 0.0 for an empty sequence.
pub fn streak_ratio(correctness: &[bool]) -> f64 {
    if correctness.is_empty() {
        return 0.0;
    }
    let mut max_streak = 0usize;
    let mut streak = 0usize;
    for &value in correctness {
        if value {
            streak += 1;
            max_streak = max_streak.max(streak);
        } else {
            streak = 0;
        }
    }
    max_streak as f64 / correctness.len() as f64
}

/// Composite 0-100 score: 70% accuracy, 20% pace, 10% consistency.
/// The weighting is a fixed design constant, not learned.
pub fn composite_score(
    correct_count: u32,
    total_questions: u32,
    total_time: f64,
    correctness: &[bool],
    target_time: f64,
) -> f64 {
    let accuracy = if total_questions > 0 {
        correct_count as f64 / total_questions as f64
    } else {
        0.0
    };
    let avg_time = if total_questions > 0 {
        total_time / total_questions as f64
    } else {
        0.0
    };
    let time_factor = if target_time > 0.0 {
        (1.0 - avg_time / target_time).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let consistency = streak_ratio(correctness);
    let score = 70.0 * accuracy + 20.0 * time_factor + 10.0 * consistency;
    round2(score)
}

/// Lowercases and trims an option letter; only a-d are accepted.
pub fn normalize_option(option: &str) -> Option<char> {
    let normalized = option.trim().to_lowercase();
    let mut chars = normalized.chars();
    match (chars.next(), chars.next()) {
        (Some(c @ 'a'..='d'), None) => Some(c),
        _ => None,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
