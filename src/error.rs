use thiserror::Error;

/// Error type returned by user supplied factories and warm-up hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = PoolError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("factory failed to construct an instance: {0}")]
    ConstructionFailed(#[source] BoxError),

    #[error("warm-up failed: {0}")]
    WarmUpFailed(#[source] BoxError),

    #[error("target size {requested} exceeds the maximum of {max}")]
    InvalidTargetSize { requested: usize, max: usize },

    #[error("invalid pool configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("failed to spawn replenisher thread: {0}")]
    ReplenisherSpawn(#[source] std::io::Error),
}

impl PoolError {
    /// True for failures raised by the factory or warm-up hook, as opposed to configuration problems.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            PoolError::ConstructionFailed(_) | PoolError::WarmUpFailed(_)
        )
    }
}
