use std::path::PathBuf;

/// Conditions that abort a single stage without being treated as a crash.
///
/// Everything else travels as a plain `anyhow::Error`; callers tell the two
/// apart with `downcast_ref::<StatsError>()`.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("{what} not found at {}", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("no admins loaded from {}", .path.display())]
    EmptyRoster { path: PathBuf },
}

impl StatsError {
    pub fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        StatsError::MissingInput {
            what,
            path: path.into(),
        }
    }
}
