use thiserror::Error;

/// Errors that can occur while planning
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("reward {0} is outside the normalized range [0, 1]")]
    RewardOutOfRange(f32),

    #[error("node state must be bound before expansion")]
    StateNotBound,

    #[error("discount factor {0} must lie strictly inside (0, 1)")]
    InvalidGamma(f32),

    #[error("oracle-call budget must be positive")]
    InvalidBudget,
}

/// Convenience Result type for planning operations
pub type Result<T> = std::result::Result<T, PlanningError>;
