// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure the core can report carries one of five kinds:
//
//   Config       — artifacts missing, mismatched or not loaded.
//                  Fatal at startup, the service never becomes Ready.
//   Validation   — a single request payload is malformed.
//                  Reported to the caller, the service stays Ready.
//   TrainingData — the training table cannot produce a model
//                  (empty, single class, non-binary target ...).
//   Persist      — writing the artifact bundle failed.
//   Classifier   — the model refused the feature vector.
//
// An unseen category is deliberately NOT an error kind:
// it is absorbed by the encoder fallback policy.
//
// Reference: thiserror crate documentation
//            Rust Book §9 (Recoverable Errors with Result)

use std::path::PathBuf;
use thiserror::Error;

/// Copyable tag for branching on the kind of a [`ChurnError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Validation,
    TrainingData,
    Persist,
    Classifier,
}

#[derive(Debug, Error)]
pub enum ChurnError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("training data error: {0}")]
    TrainingData(String),

    #[error("failed to persist '{}': {source}", path.display())]
    Persist {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("classifier error: {0}")]
    Classifier(String),
}

/// Result alias used throughout the core.
pub type ChurnResult<T> = Result<T, ChurnError>;

impl ChurnError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn training_data(msg: impl Into<String>) -> Self {
        Self::TrainingData(msg.into())
    }

    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist { path: path.into(), source }
    }

    /// The tag callers branch on instead of matching message text.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_)       => ErrorKind::Config,
            Self::Validation(_)   => ErrorKind::Validation,
            Self::TrainingData(_) => ErrorKind::TrainingData,
            Self::Persist { .. }  => ErrorKind::Persist,
            Self::Classifier(_)   => ErrorKind::Classifier,
        }
    }

    /// Request-level failures leave the service usable for the next request.
    pub fn is_request_level(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Classifier)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(ChurnError::config("x").kind(), ErrorKind::Config);
        assert_eq!(ChurnError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(ChurnError::training_data("x").kind(), ErrorKind::TrainingData);
        assert_eq!(ChurnError::classifier("x").kind(), ErrorKind::Classifier);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(ChurnError::persist("models/model.json", io).kind(), ErrorKind::Persist);
    }

    #[test]
    fn test_request_level_kinds() {
        assert!(ChurnError::validation("bad").is_request_level());
        assert!(ChurnError::classifier("bad").is_request_level());
        assert!(!ChurnError::config("bad").is_request_level());
    }

    #[test]
    fn test_persist_message_names_path() {
        let io  = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let msg = ChurnError::persist("models/encoders.json", io).to_string();
        assert!(msg.contains("models/encoders.json"));
        assert!(msg.contains("disk full"));
    }
}
