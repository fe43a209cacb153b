use thiserror::Error;

/// Failures surfaced by the storage boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// The learner's exam deadline is already in the past. Fatal for plan
    /// generation; a missing deadline is not an error (`Ok(None)`).
    #[error("exam deadline passed {days_overdue} day(s) ago")]
    DeadlinePassed { days_overdue: i64 },
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
