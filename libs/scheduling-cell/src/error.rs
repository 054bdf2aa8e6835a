use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{collaborator} unavailable: {source}")]
    Dependency {
        collaborator: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{collaborator} did not respond within {timeout_ms} ms")]
    DependencyTimeout {
        collaborator: &'static str,
        timeout_ms: u64,
    },
}

impl SchedulingError {
    pub fn validation(message: impl Into<String>) -> Self {
        SchedulingError::Validation(message.into())
    }

    /// True for failures the caller may retry against the collaborators.
    pub fn is_dependency(&self) -> bool {
        matches!(
            self,
            SchedulingError::Dependency { .. } | SchedulingError::DependencyTimeout { .. }
        )
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
