//! The core module of the report pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Configuration management
//! - Constants used throughout the pipeline
//! - Error handling
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod constants;
pub mod errors;

pub use config::{
    CompletenessRules, ConfigError, ConfigValidator, DocumentRules, DocumentTypeRule,
    FingerprintConfig, LayoutConfig, MergeConfig, ReportConfig, SessionConfig, TesseractConfig,
};
pub use constants::*;
pub use errors::{ProcessingStage, ReportError, ReportResult};
