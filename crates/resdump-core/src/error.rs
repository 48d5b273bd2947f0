use thiserror::Error;

use crate::marker::MarkerRole;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Marker catalog has no pattern for role {0}")]
    MissingMarkerPattern(MarkerRole),

    #[error("Marker catalog has more than one pattern for role {0}")]
    DuplicateMarkerPattern(MarkerRole),

    #[error("Marker {role} not found in module (pattern: {pattern})")]
    MarkerNotFound { role: MarkerRole, pattern: String },

    #[error("Unsupported decoder bitness: {0} (expected 16, 32 or 64)")]
    UnsupportedBitness(u32),

    #[error("Failed to load module: {0}")]
    ModuleLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error comes from the pattern or marker catalog rather than the module
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidPattern(_)
                | Error::MissingMarkerPattern(_)
                | Error::DuplicateMarkerPattern(_)
                | Error::MarkerNotFound { .. }
                | Error::UnsupportedBitness(_)
        )
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
