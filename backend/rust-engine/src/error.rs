use thiserror::Error;

/// Caller-visible failures of the engine core.
///
/// Model unavailability is deliberately absent: the recommendation engine
/// degrades to its heuristic path instead of surfacing an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected input: bad option letter, duplicate answer, topic mismatch,
    /// attempt already finished. No state is mutated before this is raised.
    #[error("{0}")]
    Validation(String),

    /// Unknown attempt/course/question/learner id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Failure reported by a persistence provider.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
