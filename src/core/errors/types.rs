//! Core error types for the report validation pipeline.
//!
//! This module defines the error types shared by every component of the crate:
//! the main [`ReportError`] enum and the [`ProcessingStage`] enum used to tag where
//! a per-item failure happened.

use std::path::PathBuf;
use thiserror::Error;

/// Enum representing the stages of the report pipeline.
///
/// Used to identify which stage a per-item failure occurred in, so that caught
/// failures can be logged with enough context to debug them later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Token ingestion and validation.
    TokenIngestion,
    /// Merging tokens into entities.
    EntityMerge,
    /// Spatial key-value reconstruction.
    Reconstruction,
    /// Image loading and binarization before OCR.
    ImagePreprocessing,
    /// Metadata OCR.
    Recognition,
    /// Fingerprint normalization and index lookup.
    Fingerprinting,
    /// Master index load/save.
    Persistence,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TokenIngestion => write!(f, "token ingestion"),
            ProcessingStage::EntityMerge => write!(f, "entity merge"),
            ProcessingStage::Reconstruction => write!(f, "key-value reconstruction"),
            ProcessingStage::ImagePreprocessing => write!(f, "image preprocessing"),
            ProcessingStage::Recognition => write!(f, "recognition"),
            ProcessingStage::Fingerprinting => write!(f, "fingerprinting"),
            ProcessingStage::Persistence => write!(f, "persistence"),
        }
    }
}

/// Enum representing the errors that can occur in the report pipeline.
///
/// Validation outcomes such as an incomplete document are not errors; they are
/// reported through the status fields of the report types.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A token handed over by the layout model is malformed.
    #[error("invalid token '{text}': {message}")]
    InvalidToken {
        /// The token text, for log context.
        text: String,
        /// What is wrong with the token.
        message: String,
    },

    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[from] image::ImageError),

    /// The metadata OCR backend failed.
    #[error("recognition failed in '{backend}': {context}")]
    Recognition {
        /// Name of the recognition backend.
        backend: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error, when there is one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The master index could not be read or parsed.
    #[error("failed to load master index '{path}'")]
    IndexLoad {
        /// Location of the index file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The master index could not be written back.
    #[error("failed to save master index '{path}'")]
    IndexSave {
        /// Location of the index file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// JSON (de)serialization error.
    #[error("serialization")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias used throughout the crate.
pub type ReportResult<T> = Result<T, ReportError>;

impl From<crate::core::config::ConfigError> for ReportError {
    /// Converts a ConfigError to ReportError::ConfigError.
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl ReportError {
    /// Creates an invalid token error.
    pub fn invalid_token(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidToken {
            text: text.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error with context and details.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use oar_report::core::errors::ReportError;
    /// let err = ReportError::config_error_detailed(
    ///     "document rules",
    ///     "default type 'UMUM' has no rule"
    /// );
    /// assert!(matches!(err, ReportError::ConfigError { .. }));
    /// ```
    pub fn config_error_detailed(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ConfigError {
            message: format!("{}: {}", context.into(), details.into()),
        }
    }

    /// Creates a recognition error without an underlying source.
    pub fn recognition_failed(backend: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Recognition {
            backend: backend.into(),
            context: context.into(),
            source: None,
        }
    }

    /// Wraps an error raised by a recognition backend.
    pub fn recognition_error(
        backend: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Recognition {
            backend: backend.into(),
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The pipeline stage an error belongs to, when it is tied to one.
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            Self::InvalidToken { .. } => Some(ProcessingStage::TokenIngestion),
            Self::ImageLoad(_) => Some(ProcessingStage::ImagePreprocessing),
            Self::Recognition { .. } => Some(ProcessingStage::Recognition),
            Self::IndexLoad { .. } | Self::IndexSave { .. } => Some(ProcessingStage::Persistence),
            Self::ConfigError { .. } | Self::Serialization(_) | Self::Io(_) => None,
        }
    }

    /// Returns true for errors that must abort the whole session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IndexLoad { .. } | Self::IndexSave { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_token_message() {
        let err = ReportError::invalid_token("PROYEK", "box coordinate 1200 outside [0, 1000]");
        assert_eq!(
            err.to_string(),
            "invalid token 'PROYEK': box coordinate 1200 outside [0, 1000]"
        );
    }

    #[test]
    fn test_index_errors_are_fatal() {
        let err = ReportError::IndexLoad {
            path: PathBuf::from("master_index.json"),
            source: Box::new(std::io::Error::other("truncated")),
        };
        assert!(err.is_fatal());
        assert!(!ReportError::recognition_failed("tesseract", "exit code 1").is_fatal());
    }

    #[test]
    fn test_error_stage() {
        let missing = image::ImageError::IoError(std::io::Error::other("no such file"));
        assert_eq!(
            ReportError::from(missing).stage(),
            Some(ProcessingStage::ImagePreprocessing)
        );
        assert_eq!(
            ReportError::recognition_failed("tesseract", "exit code 1").stage(),
            Some(ProcessingStage::Recognition)
        );
        assert_eq!(
            ReportError::config_error_detailed("layout", "bad").stage(),
            None
        );
    }

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(ProcessingStage::Fingerprinting.to_string(), "fingerprinting");
        assert_eq!(
            ProcessingStage::Reconstruction.to_string(),
            "key-value reconstruction"
        );
    }
}
