use std::path::PathBuf;

pub type Result<T, E = GalaxyError> = std::result::Result<T, E>;

/// Every failure the planner can surface. Nothing is retried at this layer.
#[derive(Debug, thiserror::Error)]
pub enum GalaxyError {
    /// A namespace directory, or the base directory itself, is missing.
    #[error("directory not found at: {}", path.display())]
    NotFound { path: PathBuf },

    /// Two source namespaces land on the same transformed name in one environment.
    #[error(
        "environment '{env}': namespaces '{first}' and '{second}' both transform to '{transformed}'"
    )]
    Conflict {
        env: String,
        transformed: String,
        first: String,
        second: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    /// Apply was requested for an environment without planned data.
    #[error("environment '{env}' is not found on {what}")]
    NotPlanned { env: String, what: &'static str },

    #[error("failed to list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Errors coming back from a secrets or release applier, unchanged.
    #[error(transparent)]
    Applier(#[from] anyhow::Error),
}

impl GalaxyError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }
}
